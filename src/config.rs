//! Configuration management for raidclip
//!
//! Handles config file loading/saving, credential lookup and validation.
//! Config is stored at ~/.config/raidclip/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::models::{ChoiceRule, SelectionRequest};
use crate::overlay::PlayerType;

/// Ten years per window is already far past the oldest clip
pub const MAX_WINDOW_DAYS: u32 = 3650;

/// Problems that stop the bot from starting
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Unknown choice rule: {0} (expected RANDOM or MOST_POPULAR)")]
    InvalidRule(String),

    #[error("Volume must be between 0.0 and 1.0, got {0}")]
    InvalidVolume(f32),

    #[error("window_days must be between 1 and {}", MAX_WINDOW_DAYS)]
    InvalidWindow,

    #[error("Unknown player: {0} (expected mpv, vlc or none)")]
    InvalidPlayer(String),

    #[error("Missing Twitch credentials: set TWITCH_CLIENT_ID and TWITCH_CLIENT_SECRET or add them to the config file")]
    MissingCredentials,

    #[error("No channel to monitor: set `channel` in the config file or pass --channel")]
    MissingChannel,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Twitch application client id
    pub client_id: Option<String>,
    /// Twitch application client secret
    pub client_secret: Option<String>,
    /// Channel whose chat is monitored
    pub channel: Option<String>,
    /// Chat command that triggers a shoutout
    pub command: String,
    /// Width of each clip search window in days
    pub window_days: u32,
    /// RANDOM or MOST_POPULAR
    pub choice_rule: String,
    /// Clips with fewer views are never shown
    pub min_view_count: u64,
    /// Playback volume, 0.0–1.0
    pub volume: f32,
    /// mpv, vlc or none (headless)
    pub player: String,
    /// Length of the hide transition in milliseconds
    pub fade_ms: u64,
    /// Per HTTP request
    pub request_timeout_secs: u64,
    /// Per chat command, covering user lookup and all clip pages
    pub command_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            channel: None,
            command: "?so".to_string(),
            window_days: 30,
            choice_rule: ChoiceRule::Random.to_string(),
            min_view_count: 2,
            volume: 0.8,
            player: "mpv".to_string(),
            fade_ms: 1000,
            request_timeout_secs: 30,
            command_timeout_secs: 120,
        }
    }
}

/// Client id and secret after env/config resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Config {
    /// Get config file path (~/.config/raidclip/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("raidclip").join("config.toml"))
    }

    /// Load config from the default path, or return default if not found
    pub fn load() -> Result<Self> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from `path`. A missing file yields defaults, a broken one is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Write config as TOML, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Parsed choice rule
    pub fn rule(&self) -> Result<ChoiceRule, ConfigError> {
        self.choice_rule
            .parse()
            .map_err(|_| ConfigError::InvalidRule(self.choice_rule.clone()))
    }

    /// Player to launch, `None` for headless
    pub fn player_type(&self) -> Result<Option<PlayerType>, ConfigError> {
        match self.player.trim().to_lowercase().as_str() {
            "mpv" => Ok(Some(PlayerType::Mpv)),
            "vlc" => Ok(Some(PlayerType::Vlc)),
            "none" | "" => Ok(None),
            _ => Err(ConfigError::InvalidPlayer(self.player.clone())),
        }
    }

    /// Check everything that does not need credentials
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rule()?;
        self.player_type()?;
        if !(1..=MAX_WINDOW_DAYS).contains(&self.window_days) {
            return Err(ConfigError::InvalidWindow);
        }
        if !(0.0..=1.0).contains(&self.volume) || self.volume.is_nan() {
            return Err(ConfigError::InvalidVolume(self.volume));
        }
        Ok(())
    }

    /// Selection parameters for every command
    pub fn selection_request(&self) -> Result<SelectionRequest, ConfigError> {
        self.validate()?;
        Ok(SelectionRequest::new(self.window_days, self.rule()?)
            .with_min_view_count(self.min_view_count))
    }

    /// Credentials with fallback chain:
    /// 1. Environment variables TWITCH_CLIENT_ID / TWITCH_CLIENT_SECRET
    /// 2. Values from the config file
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let client_id = env_or("TWITCH_CLIENT_ID", self.client_id.as_deref());
        let client_secret = env_or("TWITCH_CLIENT_SECRET", self.client_secret.as_deref());

        match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) => Ok(Credentials {
                client_id,
                client_secret,
            }),
            _ => Err(ConfigError::MissingCredentials),
        }
    }

    /// Channel to join, with an optional command-line override
    pub fn channel(&self, overridden: Option<&str>) -> Result<String, ConfigError> {
        overridden
            .or(self.channel.as_deref())
            .map(|c| c.trim().trim_start_matches('#').to_lowercase())
            .filter(|c| !c.is_empty())
            .ok_or(ConfigError::MissingChannel)
    }

    pub fn fade(&self) -> Duration {
        Duration::from_millis(self.fade_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs.max(1))
    }
}

fn env_or(key: &str, fallback: Option<&str>) -> Option<String> {
    std::env::var(key)
        .ok()
        .or_else(|| fallback.map(str::to_string))
        .filter(|v| !v.trim().is_empty())
}
