use rand::Rng;
use rand::seq::IndexedRandom;

use super::table::{DEFAULT_TRIGGER, Response, ResponseTable};

/// Last-resort reply if the default pool is somehow empty.
const FALLBACK_REPLY: &str = "...";

/// Which pass of the matcher produced the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Contains,
    Keyword,
    Default,
}

impl MatchKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            MatchKind::Exact => "exact",
            MatchKind::Contains => "contains",
            MatchKind::Keyword => "keyword",
            MatchKind::Default => "default",
        }
    }
}

/// Outcome of matching one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match<'t> {
    pub kind: MatchKind,
    /// The trigger that fired; `None` for the default pool.
    pub trigger: Option<&'t str>,
    pub reply: &'t str,
}

/// Resolves free-form text against a [`ResponseTable`].
///
/// Precedence, first hit wins: exact trigger, trigger contained in the text,
/// any trigger word present among the text's words, then a random default.
/// The contains and keyword passes walk triggers in table order, so an earlier
/// trigger beats a later one even if the later one is a better fit.
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'t> {
    table: &'t ResponseTable,
}

impl<'t> Matcher<'t> {
    pub const fn new(table: &'t ResponseTable) -> Self {
        Self { table }
    }

    /// Reply text for `message`, picking defaults with `rng`.
    pub fn reply<R: Rng + ?Sized>(&self, message: &str, rng: &mut R) -> &'t str {
        self.find(message, rng).reply
    }

    /// Full match result for `message`.
    pub fn find<R: Rng + ?Sized>(&self, message: &str, rng: &mut R) -> Match<'t> {
        let message = normalize(message);

        if message != DEFAULT_TRIGGER
            && let Some(Response::Text(reply)) = self.table.get(&message)
        {
            return Match {
                kind: MatchKind::Exact,
                trigger: self.trigger_key(&message),
                reply,
            };
        }

        if let Some((trigger, reply)) = self
            .table
            .keyed_replies()
            .find(|(trigger, _)| message.contains(*trigger))
        {
            return Match {
                kind: MatchKind::Contains,
                trigger: Some(trigger),
                reply,
            };
        }

        let words: Vec<&str> = message.split_whitespace().collect();
        if let Some((trigger, reply)) = self
            .table
            .keyed_replies()
            .find(|(trigger, _)| trigger.split_whitespace().any(|w| words.contains(&w)))
        {
            return Match {
                kind: MatchKind::Keyword,
                trigger: Some(trigger),
                reply,
            };
        }

        Match {
            kind: MatchKind::Default,
            trigger: None,
            reply: self
                .table
                .defaults()
                .choose(rng)
                .map_or(FALLBACK_REPLY, String::as_str),
        }
    }

    fn trigger_key(&self, normalized: &str) -> Option<&'t str> {
        self.table.triggers().find(|t| *t == normalized)
    }
}

/// Lowercase and trim, the only normalization applied before matching.
pub fn normalize(message: &str) -> String {
    message.trim().to_lowercase()
}
