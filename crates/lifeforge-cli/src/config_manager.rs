//! Persistent CLI configuration.
//!
//! The config file holds the pointers the pipelines need: the remote API
//! host, the local frontend checkout, and the session token for the module
//! store. The token can always be supplied via `LIFEFORGE_SESSION_TOKEN`
//! instead of being written to disk.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable overriding the config file location (tests,
/// isolated runs).
pub const CONFIG_ENV: &str = "LIFEFORGE_CONFIG";

/// Environment variable overriding the stored session token.
pub const SESSION_TOKEN_ENV: &str = "LIFEFORGE_SESSION_TOKEN";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("{0} is not configured. Run `lifeforge config set {0} <value>` first.")]
    Missing(&'static str),

    #[error("Unknown config key: {0}")]
    UnknownKey(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontend_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
}

impl Config {
    pub fn path() -> PathBuf {
        // Honor explicit override for tests / isolated runs.
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return PathBuf::from(trimmed);
            }
        }

        #[cfg(not(target_os = "windows"))]
        let default = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("lifeforge")
            .join("lifeforge.toml");

        #[cfg(target_os = "windows")]
        let default = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lifeforge")
            .join("lifeforge.toml");

        default
    }

    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "api-host" => self.api_host.clone(),
            "frontend-path" => self.frontend_path.clone(),
            "session-token" => self.session_token.clone(),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: String) -> Result<(), ConfigError> {
        match key {
            "api-host" => self.api_host = Some(value),
            "frontend-path" => self.frontend_path = Some(value),
            "session-token" => self.session_token = Some(value),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    pub fn unset(&mut self, key: &str) -> Result<(), ConfigError> {
        match key {
            "api-host" => self.api_host = None,
            "frontend-path" => self.frontend_path = None,
            "session-token" => self.session_token = None,
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    pub fn values_iter(&self) -> Vec<(&'static str, String)> {
        let mut values = Vec::new();
        if let Some(ref val) = self.api_host {
            values.push(("api-host", val.clone()));
        }
        if let Some(ref val) = self.frontend_path {
            values.push(("frontend-path", val.clone()));
        }
        if self.session_token.is_some() {
            // Never echo the token back to the terminal.
            values.push(("session-token", "<set>".to_string()));
        }
        values
    }

    pub fn require_api_host(&self) -> Result<&str, ConfigError> {
        self.api_host
            .as_deref()
            .ok_or(ConfigError::Missing("api-host"))
    }

    pub fn require_frontend_path(&self) -> Result<PathBuf, ConfigError> {
        self.frontend_path
            .as_deref()
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing("frontend-path"))
    }

    /// The session token, preferring the environment over the config file.
    pub fn require_session_token(&self) -> Result<String, ConfigError> {
        if let Ok(token) = std::env::var(SESSION_TOKEN_ENV) {
            if !token.trim().is_empty() {
                return Ok(token);
            }
        }
        self.session_token
            .clone()
            .ok_or(ConfigError::Missing("session-token"))
    }
}
