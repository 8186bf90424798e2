use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reserved trigger whose response is the pool of fallback replies.
pub const DEFAULT_TRIGGER: &str = "default";

/// Reply sent for a command name that is not registered.
pub const UNKNOWN_COMMAND: &str = "Unknown command. Type /help for available commands.";

/// Names Telegram clients send as bot commands, after lowercasing.
static COMMAND_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_]{1,32}$").expect("command name regex is valid"));

/// What a trigger maps to: one fixed reply, or (for `default`) a pool to pick from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Response {
    Text(String),
    Choices(Vec<String>),
}

impl Response {
    /// The reply when this response is a single string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Response::Text(text) => Some(text.as_str()),
            Response::Choices(_) => None,
        }
    }
}

impl From<&str> for Response {
    fn from(text: &str) -> Self {
        Response::Text(text.to_string())
    }
}

impl From<String> for Response {
    fn from(text: String) -> Self {
        Response::Text(text)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TableError {
    #[error("trigger must not be empty")]
    EmptyTrigger,
    #[error("response for {0:?} must not be empty")]
    EmptyResponse(String),
    #[error("command name must not be empty")]
    EmptyCommand,
    #[error("invalid command name {0:?}: use up to 32 letters, digits or '_'")]
    InvalidCommand(String),
    #[error("only the \"default\" trigger may map to a list of replies, found one on {0:?}")]
    UnexpectedChoices(String),
    #[error("the \"default\" trigger must map to a list of replies")]
    DefaultNotChoices,
    #[error("no \"default\" replies configured")]
    MissingDefault,
    #[error("\"default\" replies must not be blank")]
    BlankDefault,
}

/// Ordered trigger and command tables.
///
/// Iteration follows insertion order; overwriting an existing key keeps its
/// original position. The matcher's substring and word-overlap passes rely on
/// that order to pick a winner.
#[derive(Debug, Clone)]
pub struct ResponseTable {
    responses: Vec<(String, Response)>,
    response_index: HashMap<String, usize>,
    commands: Vec<(String, String)>,
    command_index: HashMap<String, usize>,
}

impl ResponseTable {
    /// Create a table with only the fallback pool populated.
    pub fn new(defaults: Vec<String>) -> Result<Self, TableError> {
        check_defaults(&defaults)?;
        let mut table = Self::empty();
        table.insert_response(DEFAULT_TRIGGER.to_string(), Response::Choices(defaults));
        Ok(table)
    }

    /// Exact lookup on a stored (already lowercased) trigger.
    pub fn get(&self, trigger: &str) -> Option<&Response> {
        self.response_index
            .get(trigger)
            .map(|&i| &self.responses[i].1)
    }

    /// Insert or overwrite a trigger. The trigger is lowercased and trimmed before storage.
    pub fn put(&mut self, trigger: &str, response: impl Into<Response>) -> Result<(), TableError> {
        let trigger = trigger.trim().to_lowercase();
        if trigger.is_empty() {
            return Err(TableError::EmptyTrigger);
        }
        let response = response.into();
        match (&response, trigger == DEFAULT_TRIGGER) {
            (Response::Text(text), false) if text.trim().is_empty() => {
                return Err(TableError::EmptyResponse(trigger));
            }
            (Response::Choices(_), false) => return Err(TableError::UnexpectedChoices(trigger)),
            (Response::Text(_), true) => return Err(TableError::DefaultNotChoices),
            (Response::Choices(choices), true) => check_defaults(choices)?,
            _ => {}
        }
        self.insert_response(trigger, response);
        Ok(())
    }

    /// Insert or overwrite a command. A leading `/` is dropped and the name lowercased.
    pub fn put_command(&mut self, name: &str, reply: &str) -> Result<(), TableError> {
        let name = normalize_command(name);
        if name.is_empty() {
            return Err(TableError::EmptyCommand);
        }
        if !COMMAND_NAME_RE.is_match(&name) {
            return Err(TableError::InvalidCommand(name));
        }
        if reply.trim().is_empty() {
            return Err(TableError::EmptyResponse(format!("/{name}")));
        }
        self.insert_command(name, reply.to_string());
        Ok(())
    }

    /// All triggers in insertion order, including the reserved `default`.
    pub fn triggers(&self) -> impl Iterator<Item = &str> {
        self.responses.iter().map(|(t, _)| t.as_str())
    }

    /// Trigger/response pairs in insertion order, including `default`.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Response)> {
        self.responses.iter().map(|(t, r)| (t.as_str(), r))
    }

    /// Triggers with a single fixed reply, in insertion order (excludes `default`).
    pub fn keyed_replies(&self) -> impl Iterator<Item = (&str, &str)> {
        self.responses
            .iter()
            .filter(|(t, _)| t != DEFAULT_TRIGGER)
            .filter_map(|(t, r)| r.as_text().map(|text| (t.as_str(), text)))
    }

    /// Fallback pool. Never empty.
    pub fn defaults(&self) -> &[String] {
        match self.get(DEFAULT_TRIGGER) {
            Some(Response::Choices(choices)) => choices.as_slice(),
            _ => &[],
        }
    }

    /// Command name/reply pairs in insertion order.
    pub fn commands(&self) -> impl Iterator<Item = (&str, &str)> {
        self.commands.iter().map(|(n, r)| (n.as_str(), r.as_str()))
    }

    /// Look up a command by name (with or without the leading `/`).
    ///
    /// Unregistered names get [`UNKNOWN_COMMAND`].
    pub fn resolve_command(&self, name: &str) -> &str {
        let name = normalize_command(name);
        self.command_index
            .get(&name)
            .map_or(UNKNOWN_COMMAND, |&i| self.commands[i].1.as_str())
    }

    /// Table seeded from compiled-in data, skipping validation.
    pub(super) fn from_static(defaults: &[&str]) -> Self {
        let mut table = Self::empty();
        table.insert_response(
            DEFAULT_TRIGGER.to_string(),
            Response::Choices(defaults.iter().map(|d| (*d).to_string()).collect()),
        );
        table
    }

    pub(super) fn insert_static(&mut self, trigger: &str, reply: &str) {
        self.insert_response(trigger.to_lowercase(), Response::from(reply));
    }

    pub(super) fn insert_static_command(&mut self, name: &str, reply: &str) {
        self.insert_command(normalize_command(name), reply.to_string());
    }

    fn empty() -> Self {
        Self {
            responses: Vec::new(),
            response_index: HashMap::new(),
            commands: Vec::new(),
            command_index: HashMap::new(),
        }
    }

    fn insert_command(&mut self, name: String, reply: String) {
        match self.command_index.get(&name) {
            Some(&i) => self.commands[i].1 = reply,
            None => {
                self.command_index.insert(name.clone(), self.commands.len());
                self.commands.push((name, reply));
            }
        }
    }

    fn insert_response(&mut self, trigger: String, response: Response) {
        match self.response_index.get(&trigger) {
            Some(&i) => self.responses[i].1 = response,
            None => {
                self.response_index.insert(trigger.clone(), self.responses.len());
                self.responses.push((trigger, response));
            }
        }
    }
}

fn check_defaults(defaults: &[String]) -> Result<(), TableError> {
    if defaults.is_empty() {
        return Err(TableError::MissingDefault);
    }
    if defaults.iter().any(|d| d.trim().is_empty()) {
        return Err(TableError::BlankDefault);
    }
    Ok(())
}

fn normalize_command(name: &str) -> String {
    let name = name.trim();
    name.strip_prefix('/').unwrap_or(name).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ResponseTable {
        let mut table = ResponseTable::new(vec!["shrug".into(), "pardon?".into()]).unwrap();
        table.put("Hello", "hi there").unwrap();
        table.put("good morning", "morning!").unwrap();
        table.put_command("start", "welcome").unwrap();
        table
    }

    #[test]
    fn put_lowercases_and_get_is_exact() {
        let table = table();
        assert_eq!(table.get("hello"), Some(&Response::from("hi there")));
        assert_eq!(table.get("Hello"), None);
        assert_eq!(table.get("hell"), None);
    }

    #[test]
    fn overwrite_keeps_position() {
        let mut table = table();
        table.put("HELLO", "hey again").unwrap();
        let triggers: Vec<_> = table.triggers().collect();
        assert_eq!(triggers, vec!["default", "hello", "good morning"]);
        assert_eq!(table.get("hello"), Some(&Response::from("hey again")));
    }

    #[test]
    fn keyed_replies_skip_default() {
        let table = table();
        let pairs: Vec<_> = table.keyed_replies().collect();
        assert_eq!(pairs, vec![("hello", "hi there"), ("good morning", "morning!")]);
    }

    #[test]
    fn rejects_empty_and_misplaced_lists() {
        let mut table = table();
        assert_eq!(table.put("  ", "x"), Err(TableError::EmptyTrigger));
        assert_eq!(
            table.put("pizza", ""),
            Err(TableError::EmptyResponse("pizza".into()))
        );
        assert_eq!(
            table.put("pizza", Response::Choices(vec!["a".into()])),
            Err(TableError::UnexpectedChoices("pizza".into()))
        );
        assert_eq!(table.put("default", "one"), Err(TableError::DefaultNotChoices));
        assert_eq!(
            table.put("default", Response::Choices(vec![])),
            Err(TableError::MissingDefault)
        );
        assert_eq!(table.defaults(), ["shrug", "pardon?"]);
    }

    #[test]
    fn new_requires_defaults() {
        assert!(matches!(ResponseTable::new(vec![]), Err(TableError::MissingDefault)));
    }

    #[test]
    fn blank_default_candidates_are_rejected() {
        assert!(matches!(
            ResponseTable::new(vec![String::new(), "x".into()]),
            Err(TableError::BlankDefault)
        ));
        let mut table = table();
        assert_eq!(
            table.put("default", Response::Choices(vec!["ok".into(), "  ".into()])),
            Err(TableError::BlankDefault)
        );
        assert_eq!(table.defaults(), ["shrug", "pardon?"]);
    }

    #[test]
    fn command_names_must_be_telegram_commands() {
        let mut table = table();
        let too_long = "x".repeat(33);
        for name in ["my-cmd", "ünïcode", "two words", too_long.as_str()] {
            assert_eq!(
                table.put_command(name, "reply"),
                Err(TableError::InvalidCommand(normalize_command(name)))
            );
        }
        table.put_command("/My_Cmd2", "ok").unwrap();
        table.put_command(&"y".repeat(32), "long").unwrap();
        assert_eq!(table.resolve_command("my_cmd2"), "ok");
    }

    #[test]
    fn commands_resolve_by_normalized_name() {
        let mut table = table();
        assert_eq!(table.resolve_command("start"), "welcome");
        assert_eq!(table.resolve_command("/START"), "welcome");
        assert_eq!(table.resolve_command("unknown123"), UNKNOWN_COMMAND);

        table.put_command("/Start", "welcome back").unwrap();
        assert_eq!(table.resolve_command("start"), "welcome back");
        assert_eq!(table.commands().count(), 1);
        assert_eq!(table.put_command("/", "x"), Err(TableError::EmptyCommand));
    }
}
