use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};

use replybot::commands::ask::{AskArgs, CommandArgs};
use replybot::commands::brain::BrainCommand;
use replybot::commands::deploy::DeployArgs;
use replybot::commands::schema::SchemaArgs;
use replybot::commands::serve::ServeArgs;
use replybot::commands::train::TrainArgs;
use replybot::config::{Config, LoadedConfig};
use replybot::{error, telemetry};

#[derive(Debug, Parser)]
#[command(
    name = "replybot",
    version,
    about = "Keyword-triggered Telegram chat responder"
)]
struct Cli {
    /// Config file (defaults to .replybot.toml or .replybot.json in the current directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Brain file, overriding the configured one
    #[arg(long, global = true, env = "REPLYBOT_BRAIN")]
    brain: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the bot against the Telegram Bot API
    Serve(ServeArgs),
    /// Print the reply the bot would give to a message
    Ask(AskArgs),
    /// Print the reply to a slash command
    Command(CommandArgs),
    /// Edit the brain file (init, add, add-command, list)
    Brain {
        #[command(subcommand)]
        command: BrainCommand,
    },
    /// Interactive training session
    Train(TrainArgs),
    /// Create a GitHub repository and deploy the bot with Actions
    Deploy(DeployArgs),
    /// Print the JSON Schema for the brain or config file
    Schema(SchemaArgs),
}

impl Commands {
    const fn name(&self) -> &'static str {
        match self {
            Self::Serve(_) => "serve",
            Self::Ask(_) => "ask",
            Self::Command(_) => "command",
            Self::Brain { .. } => "brain",
            Self::Train(_) => "train",
            Self::Deploy(_) => "deploy",
            Self::Schema(_) => "schema",
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<LoadedConfig> {
    let cwd = std::env::current_dir().context("could not determine current directory")?;
    let mut loaded = Config::resolve(&cwd, cli.config.as_deref())?;
    if let Some(brain) = &cli.brain {
        loaded.config.brain = Some(cwd.join(brain));
    }
    Ok(loaded)
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    if let Commands::Schema(args) = &cli.command {
        return args.execute();
    }
    let loaded = load_config(cli)?;
    match &cli.command {
        Commands::Serve(args) => args.execute(&loaded),
        Commands::Ask(args) => args.execute(&loaded),
        Commands::Command(args) => args.execute(&loaded),
        Commands::Brain { command } => command.execute(&loaded),
        Commands::Train(args) => args.execute(&loaded),
        Commands::Deploy(args) => args.execute(&loaded),
        Commands::Schema(args) => args.execute(),
    }
}

fn main() -> ExitCode {
    // A missing .env is normal.
    let _ = dotenvy::dotenv();
    telemetry::init();

    let cli = Cli::parse();

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(exit_err) = e.downcast_ref::<error::ExitError>() {
                eprintln!("error: {exit_err}");
                exit_err.exit_code()
            } else {
                eprintln!("error: {e:#}");
                ExitCode::FAILURE
            }
        }
    }
}
