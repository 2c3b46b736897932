//! `lifeforge config` - show and edit the persisted CLI configuration.

use crate::config_manager::{Config, ConfigError};
use clap::Subcommand;

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show the current configuration
    Show,
    /// Set a configuration value (api-host, frontend-path, session-token)
    Set { key: String, value: String },
    /// Remove a configuration value
    Unset { key: String },
}

pub fn handle_config(action: Option<ConfigAction>) -> Result<(), ConfigError> {
    match action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => {
            let config = Config::load()?;
            println!("Configuration: {}", Config::path().display());
            let values = config.values_iter();
            if values.is_empty() {
                println!("  (empty)");
            }
            for (key, value) in values {
                println!("  {} = {}", key, value);
            }
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, value)?;
            config.save()?;
            lifeforge_logger::success(&format!("Set {}", key));
            Ok(())
        }
        ConfigAction::Unset { key } => {
            let mut config = Config::load()?;
            config.unset(&key)?;
            config.save()?;
            lifeforge_logger::success(&format!("Unset {}", key));
            Ok(())
        }
    }
}
