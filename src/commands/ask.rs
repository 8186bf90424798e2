use clap::Args;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::brain::{Matcher, load_table};
use crate::config::LoadedConfig;

#[derive(Debug, Args)]
pub struct AskArgs {
    /// Message text, as a user would send it
    #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
    pub message: Vec<String>,
    /// Also print which rule matched and the trigger
    #[arg(long)]
    pub explain: bool,
    /// Seed for picking a default reply (repeatable output)
    #[arg(long)]
    pub seed: Option<u64>,
}

impl AskArgs {
    pub fn execute(&self, loaded: &LoadedConfig) -> anyhow::Result<()> {
        let table = load_table(Some(&loaded.brain_path()))?;
        let matcher = Matcher::new(&table);
        let message = self.message.join(" ");

        let hit = match self.seed {
            Some(seed) => matcher.find(&message, &mut StdRng::seed_from_u64(seed)),
            None => matcher.find(&message, &mut rand::rng()),
        };

        if self.explain {
            match hit.trigger {
                Some(trigger) => println!("[{}] {trigger:?}", hit.kind.as_str()),
                None => println!("[{}]", hit.kind.as_str()),
            }
        }
        println!("{}", hit.reply);
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct CommandArgs {
    /// Command name, with or without the leading slash
    pub name: String,
}

impl CommandArgs {
    pub fn execute(&self, loaded: &LoadedConfig) -> anyhow::Result<()> {
        let table = load_table(Some(&loaded.brain_path()))?;
        println!("{}", table.resolve_command(&self.name));
        Ok(())
    }
}
