use crate::GlobalOpts;
use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use vizpack_config::Settings;
use vizpack_logger as logger;

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show every setting and its current value
    Show,
    /// Set a value (e.g. `vizpack config set server-port 9000`)
    Set { key: String, value: String },
    /// Print the settings file location
    Path,
}

pub fn handle_config(action: Option<ConfigAction>, opts: &GlobalOpts) -> Result<()> {
    match action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => {
            let settings = Settings::load().context("Failed to load settings")?;
            println!("{}", "Configuration:".bold().green());
            for (key, value) in settings.values_iter() {
                println!("  {}: {}", key.cyan(), value);
            }
            if opts.verbosity_level() > 0 {
                if let Ok(path) = Settings::path() {
                    println!("  {} {}", "from".dimmed(), path.display());
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut settings = Settings::load().context("Failed to load settings")?;
            settings
                .set(&key, value.clone())
                .with_context(|| format!("Cannot set {}", key))?;
            settings.save().context("Failed to save settings")?;
            logger::success(&format!("Set {} = {}", key, value));
        }
        ConfigAction::Path => {
            let path = Settings::path().context("Failed to locate settings file")?;
            logger::debug(&format!("Settings file: {}", path.display()));
            println!("{}", path.display());
        }
    }
    Ok(())
}
