//! Configuration loader and validator for the broadcast-schedule notifier.
use crate::scheduler::normalize_cron;
use chrono::FixedOffset;
use cron::Schedule;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub annict: Annict,
    pub discord: Discord,
    pub schedule: ScheduleCfg,
}

/// Annict API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Annict {
    pub token: String,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default = "default_fetch_all_pages")]
    pub fetch_all_pages: bool,
}

/// Discord webhook settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Discord {
    pub webhook_url: String,
}

/// Trigger settings. `utc_offset` pins the zone used for both cron firing
/// times and "today" comparisons, independent of the host's local zone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleCfg {
    pub cron: String,
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
}

fn default_per_page() -> u32 {
    50
}

fn default_fetch_all_pages() -> bool {
    true
}

fn default_utc_offset() -> String {
    // Asia/Tokyo; no DST, so a fixed offset is exact.
    "+09:00".to_string()
}

impl ScheduleCfg {
    pub fn offset(&self) -> Result<FixedOffset, ConfigError> {
        self.utc_offset.parse().map_err(|_| {
            ConfigError::Invalid("schedule.utc_offset must be a fixed offset like \"+09:00\"")
        })
    }
}

/// Load configuration from a YAML file, apply environment overrides for the
/// two secrets, and validate.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let mut cfg: Config = serde_yaml::from_str(&content)?;
    apply_env_overrides(&mut cfg);
    validate(&cfg)?;
    Ok(cfg)
}

/// `ANNICT_TOKEN` and `DISCORD_WEBHOOK_URL` override the file values when
/// set and non-empty, so secrets can stay out of the file.
fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(token) = std::env::var("ANNICT_TOKEN") {
        if !token.trim().is_empty() {
            cfg.annict.token = token;
        }
    }
    if let Ok(url) = std::env::var("DISCORD_WEBHOOK_URL") {
        if !url.trim().is_empty() {
            cfg.discord.webhook_url = url;
        }
    }
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.annict.token.trim().is_empty() {
        return Err(ConfigError::Invalid("annict.token must be non-empty"));
    }
    if cfg.annict.per_page == 0 || cfg.annict.per_page > 50 {
        return Err(ConfigError::Invalid("annict.per_page must be in 1..=50"));
    }

    if cfg.discord.webhook_url.trim().is_empty() {
        return Err(ConfigError::Invalid("discord.webhook_url must be non-empty"));
    }
    if !cfg.discord.webhook_url.starts_with("http") {
        return Err(ConfigError::Invalid("discord.webhook_url must be an http(s) URL"));
    }

    if cfg.schedule.cron.trim().is_empty() {
        return Err(ConfigError::Invalid("schedule.cron must be non-empty"));
    }
    if Schedule::from_str(&normalize_cron(&cfg.schedule.cron)).is_err() {
        return Err(ConfigError::Invalid(
            "schedule.cron is not a valid cron expression",
        ));
    }
    cfg.schedule.offset()?;

    Ok(())
}

/// Returns the example YAML content shipped with the repository.
pub fn example() -> &'static str {
    r#"annict:
  token: "YOUR_ANNICT_ACCESS_TOKEN"
  per_page: 50
  fetch_all_pages: true

discord:
  webhook_url: "https://discord.com/api/webhooks/000000000000000000/TOKEN"

schedule:
  cron: "0 8 * * *"
  utc_offset: "+09:00"
"#
}
