//! Replybot - keyword-triggered Telegram responder with a trainable brain

pub mod brain;
pub mod commands;
pub mod config;
pub mod error;
pub mod github;
pub mod subprocess;
pub mod telegram;
pub mod telemetry;
pub mod template;
