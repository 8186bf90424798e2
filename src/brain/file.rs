use std::path::Path;

use anyhow::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::table::{Response, ResponseTable, TableError, DEFAULT_TRIGGER};
use crate::error::ExitError;

/// On-disk brain: ordered responses plus commands.
///
/// Array order is table order, which decides ties in the matcher.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BrainFile {
    #[serde(default)]
    pub responses: Vec<ResponseEntry>,
    #[serde(default)]
    pub commands: Vec<CommandEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResponseEntry {
    /// Phrase to match; stored lowercased. `default` holds the fallback list.
    pub trigger: String,
    pub response: Response,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CommandEntry {
    /// Command name without the leading slash.
    pub name: String,
    pub reply: String,
}

impl BrainFile {
    /// Load a brain file (TOML or JSON, auto-detected by extension).
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            "json" => Self::parse_json(&contents),
            _ => Self::parse_toml(&contents),
        }
    }

    pub fn parse_toml(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| ExitError::Config(format!("invalid brain file: {e}")).into())
    }

    pub fn parse_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ExitError::Config(format!("invalid brain file: {e}")).into())
    }

    /// Snapshot a table, keeping its order.
    pub fn from_table(table: &ResponseTable) -> Self {
        Self {
            responses: table
                .entries()
                .map(|(trigger, response)| ResponseEntry {
                    trigger: trigger.to_string(),
                    response: response.clone(),
                })
                .collect(),
            commands: table
                .commands()
                .map(|(name, reply)| CommandEntry {
                    name: name.to_string(),
                    reply: reply.to_string(),
                })
                .collect(),
        }
    }

    /// Validate and build the in-memory table.
    pub fn into_table(self) -> Result<ResponseTable, TableError> {
        let defaults = self
            .responses
            .iter()
            .rev()
            .find(|e| e.trigger.trim().eq_ignore_ascii_case(DEFAULT_TRIGGER))
            .map(|e| match &e.response {
                Response::Choices(choices) => Ok(choices.clone()),
                Response::Text(_) => Err(TableError::DefaultNotChoices),
            })
            .ok_or(TableError::MissingDefault)??;

        let mut table = ResponseTable::new(defaults)?;
        for entry in self.responses {
            table.put(&entry.trigger, entry.response)?;
        }
        for entry in self.commands {
            table.put_command(&entry.name, &entry.reply)?;
        }
        Ok(table)
    }

    /// Serialize to TOML with a header comment.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        let raw = toml::to_string_pretty(self).context("serializing brain to TOML")?;
        let mut doc: toml_edit::DocumentMut = raw
            .parse()
            .context("parsing generated TOML for comment injection")?;
        doc.decor_mut().set_prefix(
            "# replybot brain\n\
             # Responses are matched in order: exact, then contained phrase, then shared word.\n\
             # The \"default\" entry lists the replies picked at random when nothing matches.\n\n",
        );
        Ok(doc.to_string())
    }

    /// Write to `path`, as JSON for `.json` files and TOML otherwise.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let contents = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => {
                serde_json::to_string_pretty(self).context("serializing brain to JSON")?
            }
            _ => self.to_toml()?,
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        std::fs::write(path, contents).with_context(|| format!("writing {}", path.display()))
    }
}

/// Load the table at `path`, or the built-in brain when the file does not exist.
pub fn load_table(path: Option<&Path>) -> anyhow::Result<ResponseTable> {
    match path {
        Some(path) if path.exists() => {
            let table = BrainFile::load(path)?
                .into_table()
                .map_err(|e| ExitError::Config(format!("{}: {e}", path.display())))?;
            tracing::debug!(
                path = %path.display(),
                triggers = table.triggers().count(),
                "loaded brain"
            );
            Ok(table)
        }
        Some(path) => {
            tracing::debug!(path = %path.display(), "brain file missing, using built-in brain");
            Ok(super::builtin::table())
        }
        None => Ok(super::builtin::table()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::builtin;

    const SAMPLE: &str = r#"
[[responses]]
trigger = "Pizza"
response = "Pineapple belongs on it."

[[responses]]
trigger = "hello"
response = "Hi!"

[[responses]]
trigger = "default"
response = ["hmm", "go on"]

[[commands]]
name = "/Start"
reply = "welcome"
"#;

    #[test]
    fn parse_toml_keeps_order_and_normalizes() {
        let table = BrainFile::parse_toml(SAMPLE).unwrap().into_table().unwrap();
        let triggers: Vec<_> = table.triggers().collect();
        assert_eq!(triggers, vec!["default", "pizza", "hello"]);
        assert_eq!(table.defaults(), ["hmm", "go on"]);
        assert_eq!(table.resolve_command("start"), "welcome");
    }

    #[test]
    fn parse_json_brain() {
        let json = r#"{
            "responses": [
                {"trigger": "default", "response": ["only one"]},
                {"trigger": "bye", "response": "ciao"}
            ],
            "commands": [{"name": "info", "reply": "a bot"}]
        }"#;
        let table = BrainFile::parse_json(json).unwrap().into_table().unwrap();
        assert_eq!(table.get("bye"), Some(&Response::from("ciao")));
        assert_eq!(table.resolve_command("/info"), "a bot");
    }

    #[test]
    fn missing_default_is_rejected() {
        let brain = BrainFile::parse_toml(
            r#"
[[responses]]
trigger = "hello"
response = "Hi!"
"#,
        )
        .unwrap();
        assert!(matches!(brain.into_table(), Err(TableError::MissingDefault)));
    }

    #[test]
    fn blank_default_reply_is_rejected() {
        let brain = BrainFile::parse_toml(
            r#"
[[responses]]
trigger = "default"
response = ["", "ok"]
"#,
        )
        .unwrap();
        assert!(matches!(brain.into_table(), Err(TableError::BlankDefault)));
    }

    #[test]
    fn invalid_command_name_is_rejected() {
        let brain = BrainFile::parse_toml(
            r#"
[[responses]]
trigger = "default"
response = ["ok"]

[[commands]]
name = "my-cmd"
reply = "hi"
"#,
        )
        .unwrap();
        assert!(matches!(
            brain.into_table(),
            Err(TableError::InvalidCommand(name)) if name == "my-cmd"
        ));
    }

    #[test]
    fn list_on_regular_trigger_is_rejected() {
        let brain = BrainFile::parse_toml(
            r#"
[[responses]]
trigger = "default"
response = ["x"]

[[responses]]
trigger = "hello"
response = ["a", "b"]
"#,
        )
        .unwrap();
        assert!(matches!(brain.into_table(), Err(TableError::UnexpectedChoices(_))));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = BrainFile::parse_toml("responses = 3 [[[").unwrap_err();
        assert!(err.to_string().contains("invalid brain file"));
        assert!(err.downcast_ref::<ExitError>().is_some());
    }

    #[test]
    fn save_and_load_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/brain.toml");
        BrainFile::from_table(&builtin::table()).save(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# replybot brain"));

        let loaded = load_table(Some(&path)).unwrap();
        let original = builtin::table();
        assert!(loaded.triggers().eq(original.triggers()));
        assert_eq!(loaded.resolve_command("help"), builtin::HELP);
    }

    #[test]
    fn save_json_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brain.json");
        BrainFile::from_table(&builtin::table()).save(&path).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["responses"][0]["trigger"], "default");
    }

    #[test]
    fn missing_file_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let table = load_table(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(table.defaults().len(), 5);
    }
}
