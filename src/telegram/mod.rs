//! Telegram Bot API over long polling.

pub mod responder;

use std::time::Duration;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ExitError;

pub use responder::{Inbound, Outgoing, Responder, serve};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// How Telegram should render an outgoing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Plain,
    Markdown,
}

/// Envelope around every Bot API result.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<u16>,
}

impl<T> ApiResponse<T> {
    fn into_result(self, method: &str) -> anyhow::Result<T> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            (ok, _) => Err(ExitError::Api {
                service: "Telegram",
                status: self.error_code.unwrap_or(0),
                message: format!(
                    "{method}: {}",
                    self.description.as_deref().unwrap_or(if ok {
                        "missing result"
                    } else {
                        "request failed"
                    })
                ),
            }
            .into()),
        }
    }
}

#[derive(Debug, Serialize)]
struct GetUpdates<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}

/// Where updates come from and replies go to.
pub trait Transport {
    /// Fetch updates with id >= `offset`, blocking up to the poll timeout.
    fn poll(&mut self, offset: Option<i64>) -> anyhow::Result<Vec<Update>>;

    /// Deliver `text` to `chat_id`.
    fn send(&mut self, chat_id: i64, text: &str, mode: ParseMode) -> anyhow::Result<()>;
}

/// Blocking Bot API client.
pub struct TelegramClient {
    agent: ureq::Agent,
    base: String,
    poll_timeout: u64,
}

impl TelegramClient {
    pub fn new(api_base: &str, token: &str, poll_timeout: u64) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(poll_timeout + 15)))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            base: method_base(api_base, token),
            poll_timeout,
        }
    }

    /// The bot's own account, used to verify the token at startup.
    pub fn get_me(&self) -> anyhow::Result<User> {
        self.call("getMe", &serde_json::json!({}))
    }

    fn call<B: Serialize, T: DeserializeOwned>(&self, method: &str, body: &B) -> anyhow::Result<T> {
        let url = format!("{}/{method}", self.base);
        let mut response = self
            .agent
            .post(&url)
            .send_json(body)
            .with_context(|| format!("calling Telegram {method}"))?;
        let parsed: ApiResponse<T> = response
            .body_mut()
            .read_json()
            .with_context(|| format!("decoding Telegram {method} response"))?;
        parsed.into_result(method)
    }
}

impl Transport for TelegramClient {
    fn poll(&mut self, offset: Option<i64>) -> anyhow::Result<Vec<Update>> {
        self.call(
            "getUpdates",
            &GetUpdates {
                offset,
                timeout: self.poll_timeout,
                allowed_updates: &["message"],
            },
        )
    }

    fn send(&mut self, chat_id: i64, text: &str, mode: ParseMode) -> anyhow::Result<()> {
        let _: Message = self.call(
            "sendMessage",
            &SendMessage {
                chat_id,
                text,
                parse_mode: match mode {
                    ParseMode::Plain => None,
                    ParseMode::Markdown => Some("Markdown"),
                },
            },
        )?;
        Ok(())
    }
}

fn method_base(api_base: &str, token: &str) -> String {
    format!("{}/bot{token}", api_base.trim_end_matches('/'))
}
