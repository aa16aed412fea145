//! Config command implementation

use anyhow::{Context, Result};
use std::fs;

use crate::args::{ConfigArgs, ConfigCommands};
use crate::config::AppConfig;

pub async fn execute(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Init { path, force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }

            let example = AppConfig::example_toml();
            fs::write(&path, example)
                .with_context(|| format!("Failed to write config to {}", path.display()))?;

            println!("Created example configuration at {}", path.display());
            println!();
            println!("Next steps:");
            println!("  1. Export credentials (REDDIT_CLIENT_ID, X_BEARER_TOKEN, ...)");
            println!("  2. Run 'autoposter doctor' to validate the setup");
            println!("  3. Run 'autoposter run --dry-run' for a no-publish pass");

            Ok(())
        }
    }
}
