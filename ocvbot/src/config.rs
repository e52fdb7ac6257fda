use crate::errors::BotError;
use crate::session::SessionConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    pub main: MainConfig,
}

/// The `main` section. Durations are in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainConfig {
    pub min_session_duration: u64,
    pub max_session_duration: u64,
    pub min_break_duration: u64,
    pub max_break_duration: u64,
    pub min_sessions: u32,
    pub max_sessions: u32,
}

impl BotConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, BotError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            BotError::InvalidConfig(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, BotError> {
        serde_yaml::from_str(content)
            .map_err(|e| BotError::InvalidConfig(format!("Failed to parse config: {e}")))
    }
}

impl MainConfig {
    /// Convert to seconds and validate every min/max pair.
    pub fn session_config(&self) -> Result<SessionConfig, BotError> {
        let config = SessionConfig {
            min_session_duration_secs: minutes(self.min_session_duration)?,
            max_session_duration_secs: minutes(self.max_session_duration)?,
            min_break_duration_secs: minutes(self.min_break_duration)?,
            max_break_duration_secs: minutes(self.max_break_duration)?,
            min_sessions: self.min_sessions,
            max_sessions: self.max_sessions,
        };
        config.validate()?;
        Ok(config)
    }
}

fn minutes(value: u64) -> Result<u64, BotError> {
    value
        .checked_mul(60)
        .ok_or_else(|| BotError::InvalidConfig(format!("{value} minutes is out of range")))
}
