use std::path::{Path, PathBuf};

use anyhow::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ExitError;

/// Config file name constants.
pub const CONFIG_TOML: &str = ".replybot.toml";
pub const CONFIG_JSON: &str = ".replybot.json";

/// Brain file used when the config does not name one.
pub const DEFAULT_BRAIN: &str = "brain.toml";

/// Find the config file path in `dir`, preferring .replybot.toml over .replybot.json.
pub fn find_config(dir: &Path) -> Option<PathBuf> {
    let toml_path = dir.join(CONFIG_TOML);
    if toml_path.exists() {
        return Some(toml_path);
    }
    let json_path = dir.join(CONFIG_JSON);
    if json_path.exists() {
        return Some(json_path);
    }
    None
}

/// Per-user config location, e.g. `~/.config/replybot/config.toml`.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("replybot").join("config.toml"))
}

/// Top-level replybot config. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    /// Brain file (TOML or JSON). Relative paths resolve against the config file's directory.
    #[serde(default)]
    pub brain: Option<PathBuf>,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub deploy: DeployConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TelegramConfig {
    #[serde(default = "default_telegram_api", alias = "apiBase")]
    pub api_base: String,
    /// Long-poll timeout in seconds.
    #[serde(default = "default_poll_timeout", alias = "pollTimeout")]
    pub poll_timeout: u64,
    /// Pause after a failed poll, in seconds.
    #[serde(default = "default_retry_delay", alias = "retryDelay")]
    pub retry_delay: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: default_telegram_api(),
            poll_timeout: default_poll_timeout(),
            retry_delay: default_retry_delay(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DeployConfig {
    #[serde(default = "default_github_api", alias = "apiBase")]
    pub api_base: String,
    /// Workflow file under `.github/workflows/` to dispatch after pushing.
    #[serde(default = "default_workflow")]
    pub workflow: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default = "default_push_timeout", alias = "pushTimeout")]
    pub push_timeout: u64,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            api_base: default_github_api(),
            workflow: default_workflow(),
            description: default_description(),
            private: false,
            push_timeout: default_push_timeout(),
        }
    }
}

fn default_telegram_api() -> String {
    "https://api.telegram.org".into()
}

const fn default_poll_timeout() -> u64 {
    30
}

const fn default_retry_delay() -> u64 {
    5
}

fn default_github_api() -> String {
    "https://api.github.com".into()
}

fn default_workflow() -> String {
    "deploy-bot.yml".into()
}

fn default_description() -> String {
    "Telegram Bot with GitHub Actions deployment".into()
}

const fn default_push_timeout() -> u64 {
    120
}

/// Config plus the directory relative paths resolve against.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub base_dir: PathBuf,
    pub source: Option<PathBuf>,
}

impl LoadedConfig {
    /// Effective brain file path.
    pub fn brain_path(&self) -> PathBuf {
        let brain = self
            .config
            .brain
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BRAIN));
        if brain.is_absolute() {
            brain
        } else {
            self.base_dir.join(brain)
        }
    }
}

impl Config {
    /// Load config from a file (TOML or JSON, auto-detected by extension).
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            "toml" => Self::parse_toml(&contents),
            "json" => Self::parse_json(&contents),
            _ => Self::parse_toml(&contents).or_else(|_| Self::parse_json(&contents)),
        }
    }

    /// Parse config from a TOML string.
    pub fn parse_toml(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str(toml_str).map_err(|e| {
            ExitError::Config(format!("invalid {CONFIG_TOML}: {e}")).into()
        })
    }

    /// Parse config from a JSON string.
    pub fn parse_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            ExitError::Config(format!("invalid {CONFIG_JSON}: {e}")).into()
        })
    }

    /// Resolve config for a working directory.
    ///
    /// Priority: explicit path, then `dir/.replybot.toml`, `dir/.replybot.json`,
    /// then the per-user config. With none present, defaults apply and
    /// relative paths resolve against `dir`.
    pub fn resolve(dir: &Path, explicit: Option<&Path>) -> anyhow::Result<LoadedConfig> {
        let source = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(
                        ExitError::Config(format!("{} does not exist", path.display())).into()
                    );
                }
                Some(path.to_path_buf())
            }
            None => find_config(dir).or_else(|| user_config_path().filter(|p| p.exists())),
        };

        let Some(path) = source else {
            return Ok(LoadedConfig {
                config: Self::default(),
                base_dir: dir.to_path_buf(),
                source: None,
            });
        };

        let config = Self::load(&path)?;
        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| dir.to_path_buf(), Path::to_path_buf);
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(LoadedConfig {
            config,
            base_dir,
            source: Some(path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_toml_config() {
        let toml_str = r#"
brain = "data/brain.toml"

[telegram]
api_base = "http://localhost:8081"
poll_timeout = 10
retry_delay = 1

[deploy]
workflow = "bot.yml"
private = true
push_timeout = 30
"#;

        let config = Config::parse_toml(toml_str).unwrap();
        assert_eq!(config.brain, Some(PathBuf::from("data/brain.toml")));
        assert_eq!(config.telegram.api_base, "http://localhost:8081");
        assert_eq!(config.telegram.poll_timeout, 10);
        assert_eq!(config.telegram.retry_delay, 1);
        assert_eq!(config.deploy.workflow, "bot.yml");
        assert!(config.deploy.private);
        assert_eq!(config.deploy.push_timeout, 30);
        assert_eq!(config.deploy.api_base, "https://api.github.com");
    }

    #[test]
    fn parse_json_config_with_camel_case() {
        let json = r#"{
            "telegram": { "pollTimeout": 5, "retryDelay": 2 },
            "deploy": { "pushTimeout": 60 }
        }"#;
        let config = Config::parse_json(json).unwrap();
        assert_eq!(config.telegram.poll_timeout, 5);
        assert_eq!(config.telegram.retry_delay, 2);
        assert_eq!(config.deploy.push_timeout, 60);
        assert!(config.brain.is_none());
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse_toml("").unwrap();
        assert_eq!(config.telegram.api_base, "https://api.telegram.org");
        assert_eq!(config.telegram.poll_timeout, 30);
        assert_eq!(config.deploy.workflow, "deploy-bot.yml");
        assert!(!config.deploy.private);
    }

    #[test]
    fn parse_malformed_toml() {
        let err = Config::parse_toml("not valid toml [[[").unwrap_err();
        assert!(err.to_string().contains("invalid .replybot.toml"));
    }

    #[test]
    fn find_config_prefers_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_TOML), "").unwrap();
        std::fs::write(dir.path().join(CONFIG_JSON), "{}").unwrap();

        let found = find_config(dir.path()).unwrap();
        assert!(found.to_string_lossy().ends_with(".replybot.toml"));
    }

    #[test]
    fn find_config_falls_back_to_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_JSON), "{}").unwrap();

        let found = find_config(dir.path()).unwrap();
        assert!(found.to_string_lossy().ends_with(".replybot.json"));
    }

    #[test]
    fn brain_path_resolves_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_TOML), "brain = \"bot/brain.json\"\n").unwrap();

        let loaded = Config::resolve(dir.path(), None).unwrap();
        assert_eq!(loaded.brain_path(), dir.path().join("bot/brain.json"));
        assert!(loaded.source.is_some());
    }

    #[test]
    fn default_brain_path_without_config() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::resolve(dir.path(), Some(&dir.path().join("missing.toml")));
        assert!(loaded.is_err());

        let loaded = LoadedConfig {
            config: Config::default(),
            base_dir: dir.path().to_path_buf(),
            source: None,
        };
        assert_eq!(loaded.brain_path(), dir.path().join(DEFAULT_BRAIN));
    }
}
