use std::io::IsTerminal;
use std::path::Path;

use anyhow::Context;
use clap::Args;

use super::brain::{add_command, add_response, format_listing, save};
use crate::brain::{ResponseTable, load_table};
use crate::config::LoadedConfig;
use crate::error::ExitError;

const MENU: &[&str] = &["add", "list", "cmd", "quit"];

#[derive(Debug, Args)]
pub struct TrainArgs {}

/// One step of a training session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainAction {
    Add { trigger: String, response: String },
    Command { name: String, reply: String },
    List,
    Quit,
}

impl TrainArgs {
    pub fn execute(&self, loaded: &LoadedConfig) -> anyhow::Result<()> {
        if !std::io::stdin().is_terminal() {
            return Err(ExitError::Other(
                "train needs an interactive terminal; use `replybot brain add` instead".to_string(),
            )
            .into());
        }

        let path = loaded.brain_path();
        let mut table = load_table(Some(&path))?;

        println!("=== BOT TRAINING MODE ===");
        println!("Choose 'quit' to exit training");
        println!("Choose 'list' to see all responses");
        println!("Choose 'cmd' to add a command instead of a response");
        println!("Changes are saved to {}", path.display());

        loop {
            let action = prompt_action()?;
            if action == TrainAction::Quit {
                break;
            }
            apply(&mut table, action, &path)?;
        }
        Ok(())
    }
}

/// Apply one action, saving the brain after every change.
pub fn apply(table: &mut ResponseTable, action: TrainAction, path: &Path) -> anyhow::Result<()> {
    match action {
        TrainAction::Add { trigger, response } => {
            if let Err(e) = add_response(table, &trigger, &response) {
                eprintln!("Not added: {e}");
                return Ok(());
            }
            save(table, path)
        }
        TrainAction::Command { name, reply } => {
            if let Err(e) = add_command(table, &name, &reply) {
                eprintln!("Not added: {e}");
                return Ok(());
            }
            save(table, path)
        }
        TrainAction::List => {
            print!("{}", format_listing(table));
            Ok(())
        }
        TrainAction::Quit => Ok(()),
    }
}

// --- Interactive prompts using dialoguer ---

fn prompt_action() -> anyhow::Result<TrainAction> {
    let choice = dialoguer::Select::new()
        .with_prompt("What would you like to do?")
        .items(MENU)
        .default(0)
        .interact()
        .context("reading menu choice")?;

    Ok(match MENU[choice] {
        "add" => TrainAction::Add {
            trigger: prompt_input("Enter trigger word/phrase")?,
            response: prompt_input("Enter response")?,
        },
        "cmd" => TrainAction::Command {
            name: prompt_input("Enter command name (without /)")?,
            reply: prompt_input("Enter command response")?,
        },
        "list" => TrainAction::List,
        _ => TrainAction::Quit,
    })
}

fn prompt_input(prompt: &str) -> anyhow::Result<String> {
    dialoguer::Input::<String>::new()
        .with_prompt(prompt)
        .interact_text()
        .context("reading user input")
}
