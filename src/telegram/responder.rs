use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rand::Rng;
use regex::Regex;

use super::{ParseMode, Transport, Update};
use crate::brain::{Matcher, ResponseTable};

/// `/name` or `/name@botname` at the start of a message.
static COMMAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/([A-Za-z0-9_]{1,32})(?:@[A-Za-z0-9_]+)?(?:\s|$)")
        .expect("command regex is valid")
});

/// An inbound message, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound<'a> {
    /// Bot command; name is lowercased, without slash or `@botname`.
    Command(String),
    Text(&'a str),
}

impl<'a> Inbound<'a> {
    pub fn parse(text: &'a str) -> Self {
        COMMAND_RE
            .captures(text)
            .and_then(|c| c.get(1))
            .map_or(Inbound::Text(text), |name| {
                Inbound::Command(name.as_str().to_lowercase())
            })
    }
}

/// A reply ready to hand to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub chat_id: i64,
    pub text: String,
    pub mode: ParseMode,
}

/// Turns inbound messages into replies using a shared read-only table.
pub struct Responder<'t, R> {
    table: &'t ResponseTable,
    matcher: Matcher<'t>,
    rng: R,
}

impl<'t, R: Rng> Responder<'t, R> {
    pub const fn new(table: &'t ResponseTable, rng: R) -> Self {
        Self {
            table,
            matcher: Matcher::new(table),
            rng,
        }
    }

    /// Reply for one piece of message text. Command replies use Markdown.
    pub fn respond(&mut self, text: &str) -> (&'t str, ParseMode) {
        match Inbound::parse(text) {
            Inbound::Command(name) => {
                tracing::debug!(command = %name, "resolving command");
                (self.table.resolve_command(&name), ParseMode::Markdown)
            }
            Inbound::Text(text) => {
                let hit = self.matcher.find(text, &mut self.rng);
                tracing::debug!(kind = hit.kind.as_str(), trigger = ?hit.trigger, "matched");
                (hit.reply, ParseMode::Plain)
            }
        }
    }

    /// Reply for an update, or `None` for updates without message text.
    pub fn handle(&mut self, update: &Update) -> Option<Outgoing> {
        let message = update.message.as_ref()?;
        let text = message.text.as_deref()?;
        let from = message
            .from
            .as_ref()
            .map_or("unknown", |u| u.first_name.as_str());
        tracing::info!(
            from = %from,
            chat = message.chat.id,
            "received message: {}",
            text.to_lowercase()
        );

        let (reply, mode) = self.respond(text);
        Some(Outgoing {
            chat_id: message.chat.id,
            text: reply.to_string(),
            mode,
        })
    }
}

/// Poll `transport` and answer every message until `stop` is set.
///
/// Poll failures are logged and retried after `retry_delay`; a failed send is
/// logged and skipped. The offset always advances past handled updates.
pub fn serve<T, R>(
    transport: &mut T,
    responder: &mut Responder<'_, R>,
    stop: &AtomicBool,
    retry_delay: Duration,
) -> anyhow::Result<()>
where
    T: Transport + ?Sized,
    R: Rng,
{
    let mut offset: Option<i64> = None;
    let mut answered: u64 = 0;

    while !stop.load(Ordering::SeqCst) {
        let updates = match transport.poll(offset) {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!("polling failed: {e:#}");
                std::thread::sleep(retry_delay);
                continue;
            }
        };

        for update in &updates {
            offset = Some(offset.map_or(update.update_id + 1, |o| o.max(update.update_id + 1)));
            let Some(out) = responder.handle(update) else {
                continue;
            };
            match transport.send(out.chat_id, &out.text, out.mode) {
                Ok(()) => answered += 1,
                Err(e) => tracing::warn!(chat = out.chat_id, "sending reply failed: {e:#}"),
            }
        }
    }

    tracing::info!(answered, "bot stopped");
    Ok(())
}
