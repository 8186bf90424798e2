use clap::Args;
use schemars::schema_for;

use crate::brain::BrainFile;
use crate::config::Config;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaTarget {
    /// brain.toml / brain.json
    Brain,
    /// .replybot.toml / .replybot.json
    Config,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Which file to describe
    #[arg(long, value_enum, default_value_t = SchemaTarget::Brain)]
    pub target: SchemaTarget,
}

impl SchemaArgs {
    /// Print the JSON Schema for the chosen file to stdout.
    pub fn execute(&self) -> anyhow::Result<()> {
        let schema = match self.target {
            SchemaTarget::Brain => schema_for!(BrainFile),
            SchemaTarget::Config => schema_for!(Config),
        };
        let json = serde_json::to_string_pretty(&schema)?;
        println!("{json}");
        Ok(())
    }
}
