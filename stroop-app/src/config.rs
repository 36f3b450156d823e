use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use stroop_experiment::SessionConfig;
use tracing::Level;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticipantConfig {
    pub user_id: String,
    /// Generated per run when absent.
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub participant: ParticipantConfig,
    pub log_level: String,
    pub trials_path: PathBuf,
    pub interactions_path: PathBuf,
    /// Event-loop tick for polling the trial clock.
    pub tick_ms: u64,
    /// Fixed stimulus seed, for reproducible sessions.
    pub seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            participant: ParticipantConfig::default(),
            log_level: "info".to_string(),
            trials_path: PathBuf::from("stroop_trials.jsonl"),
            interactions_path: PathBuf::from("chat_interactions.jsonl"),
            tick_ms: 10,
            seed: None,
        }
    }
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                Self::from_toml(&raw)
                    .with_context(|| format!("invalid config {}", path.display()))?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.session.validate()?;
        anyhow::ensure!(self.tick_ms > 0, "tick_ms must be at least 1");
        Level::from_str(&self.log_level)
            .with_context(|| format!("unknown log level {:?}", self.log_level))?;
        Ok(())
    }

    /// Configured level, raised by each `-v`.
    pub fn log_level(&self, verbose: u8) -> Result<Level> {
        let base = Level::from_str(&self.log_level)
            .with_context(|| format!("unknown log level {:?}", self.log_level))?;
        Ok(match verbose {
            0 => base,
            1 => base.max(Level::DEBUG),
            _ => Level::TRACE,
        })
    }
}
