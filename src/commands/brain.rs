use std::fmt::Write as _;
use std::path::Path;

use clap::Subcommand;

use crate::brain::{BrainFile, ResponseTable, builtin, load_table};
use crate::config::LoadedConfig;
use crate::error::ExitError;

/// Command replies longer than this are cut short in listings.
const LIST_PREVIEW_CHARS: usize = 50;

#[derive(Debug, Subcommand)]
pub enum BrainCommand {
    /// Write the built-in brain to the brain file
    Init {
        /// Overwrite an existing brain file
        #[arg(long)]
        force: bool,
    },
    /// Add or replace a trigger phrase and its response
    Add {
        /// Trigger word or phrase
        trigger: String,
        /// Response sent when the trigger matches
        response: String,
    },
    /// Add or replace a slash command
    AddCommand {
        /// Command name without / (letters, digits or _, up to 32)
        name: String,
        /// Reply sent for the command (Markdown allowed)
        reply: String,
    },
    /// List all responses and commands
    List,
}

impl BrainCommand {
    pub fn execute(&self, loaded: &LoadedConfig) -> anyhow::Result<()> {
        let path = loaded.brain_path();
        match self {
            BrainCommand::Init { force } => init_brain(&path, *force),
            BrainCommand::Add { trigger, response } => {
                let mut table = load_table(Some(&path))?;
                add_response(&mut table, trigger, response)?;
                save(&table, &path)
            }
            BrainCommand::AddCommand { name, reply } => {
                let mut table = load_table(Some(&path))?;
                add_command(&mut table, name, reply)?;
                save(&table, &path)
            }
            BrainCommand::List => {
                let table = load_table(Some(&path))?;
                print!("{}", format_listing(&table));
                Ok(())
            }
        }
    }
}

fn init_brain(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        return Err(ExitError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ))
        .into());
    }
    save(&builtin::table(), path)?;
    println!("Wrote built-in brain to {}", path.display());
    Ok(())
}

/// Add a trigger/response pair to the table.
pub fn add_response(
    table: &mut ResponseTable,
    trigger: &str,
    response: &str,
) -> anyhow::Result<()> {
    table
        .put(trigger, response)
        .map_err(|e| ExitError::Other(e.to_string()))?;
    println!("Added: '{}' -> '{response}'", trigger.trim().to_lowercase());
    Ok(())
}

/// Add a command/reply pair to the table.
pub fn add_command(table: &mut ResponseTable, name: &str, reply: &str) -> anyhow::Result<()> {
    table
        .put_command(name, reply)
        .map_err(|e| ExitError::Other(e.to_string()))?;
    let name = name.trim();
    println!(
        "Added command: /{} -> '{reply}'",
        name.strip_prefix('/').unwrap_or(name).to_lowercase()
    );
    Ok(())
}

pub fn save(table: &ResponseTable, path: &Path) -> anyhow::Result<()> {
    BrainFile::from_table(table).save(path)?;
    tracing::info!(path = %path.display(), "saved brain");
    Ok(())
}

/// Human-readable dump of every response (except the default pool) and command.
pub fn format_listing(table: &ResponseTable) -> String {
    let mut out = String::from("\n=== CURRENT RESPONSES ===\n");
    for (trigger, response) in table.keyed_replies() {
        let _ = writeln!(out, "'{trigger}' -> '{response}'");
    }

    out.push_str("\n=== CURRENT COMMANDS ===\n");
    for (name, reply) in table.commands() {
        let _ = writeln!(out, "/{name} -> '{}'", preview(reply));
    }
    out
}

fn preview(reply: &str) -> String {
    let flat = reply.replace('\n', " ");
    if flat.chars().count() > LIST_PREVIEW_CHARS {
        let cut: String = flat.chars().take(LIST_PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        flat
    }
}
