use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Context;
use clap::Args;

use crate::brain::load_table;
use crate::config::LoadedConfig;
use crate::error::ExitError;
use crate::telegram::{Responder, TelegramClient, serve};

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Telegram bot token (from @BotFather)
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
    /// Long-poll timeout in seconds (overrides config)
    #[arg(long)]
    pub poll_timeout: Option<u64>,
}

impl ServeArgs {
    pub fn execute(&self, loaded: &LoadedConfig) -> anyhow::Result<()> {
        let token = self
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ExitError::MissingCredential {
                name: "BOT_TOKEN".to_string(),
            })?;

        let telegram = &loaded.config.telegram;
        let table = load_table(Some(&loaded.brain_path()))?;
        let mut client = TelegramClient::new(
            &telegram.api_base,
            token,
            self.poll_timeout.unwrap_or(telegram.poll_timeout),
        );

        let me = client.get_me().context("verifying bot token")?;
        tracing::info!(
            bot = me.username.as_deref().unwrap_or(&me.first_name),
            triggers = table.keyed_replies().count(),
            commands = table.commands().count(),
            "starting bot"
        );
        eprintln!("Bot is starting...");
        eprintln!("Press Ctrl+C to stop the bot");

        let stop = Arc::new(AtomicBool::new(false));
        let handler_stop = Arc::clone(&stop);
        ctrlc::set_handler(move || {
            eprintln!("\nStopping after the current poll...");
            handler_stop.store(true, Ordering::SeqCst);
        })
        .context("installing Ctrl+C handler")?;

        let mut responder = Responder::new(&table, rand::rng());
        serve(
            &mut client,
            &mut responder,
            &stop,
            Duration::from_secs(telegram.retry_delay),
        )
    }
}
