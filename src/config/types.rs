//! Core configuration types.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use kneiss_proto::{Capability, ConnectionError, Endpoint};
use serde::Deserialize;
use thiserror::Error;

use super::defaults::*;
use super::validation::{self, ValidationError};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Main bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Account and channel settings.
    pub twitch: TwitchConfig,
    /// Transport and session timing.
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Reconnect supervisor settings.
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    /// Per-channel chat transcripts.
    #[serde(default)]
    pub transcript: TranscriptConfig,
    /// Static chat commands: `name` (or `!name`) to reply text.
    #[serde(default)]
    pub commands: HashMap<String, String>,
}

/// Twitch account configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TwitchConfig {
    /// Login name of the bot account.
    pub username: String,
    /// OAuth token, with or without the `oauth:` prefix.
    #[serde(default)]
    pub token: String,
    /// Channels to join. Empty means the bot's own channel.
    #[serde(default)]
    pub channels: Vec<String>,
    /// Capabilities requested after connecting.
    #[serde(default = "default_capabilities")]
    pub capabilities: Vec<String>,
}

impl TwitchConfig {
    /// Channels to join after connecting.
    pub fn channels(&self) -> Vec<String> {
        if self.channels.is_empty() {
            vec![self.username.clone()]
        } else {
            self.channels.clone()
        }
    }

    /// Requested capabilities, typed.
    pub fn capabilities(&self) -> Vec<Capability> {
        self.capabilities
            .iter()
            .map(|cap| Capability::from(cap.as_str()))
            .collect()
    }
}

/// Connection and session timing.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    /// `irc://`, `ircs://`, `ws://` or `wss://` URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Close the session after this long without inbound data.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    /// Upper bound for each connect or join handshake.
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_secs: u64,
    /// Upper bound for each session loop to stop on close.
    #[serde(default = "default_close_timeout")]
    pub close_timeout_secs: u64,
    /// Longest line accepted or sent, in bytes.
    #[serde(default = "default_max_line_len")]
    pub max_line_len: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            read_timeout_secs: default_read_timeout(),
            handshake_timeout_secs: default_handshake_timeout(),
            close_timeout_secs: default_close_timeout(),
            max_line_len: default_max_line_len(),
        }
    }
}

impl ConnectionConfig {
    pub fn endpoint(&self) -> Result<Endpoint, ConnectionError> {
        Endpoint::parse(&self.endpoint)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_secs(self.close_timeout_secs)
    }
}

/// Reconnect supervisor configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_secs: u64,
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,
    /// Give up after this many consecutive failures. 0 means never.
    #[serde(default)]
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_backoff_secs: default_initial_backoff(),
            max_backoff_secs: default_max_backoff(),
            max_attempts: 0,
        }
    }
}

/// Chat transcript configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Directory holding one `<channel>.txt` per channel.
    #[serde(default = "default_transcript_dir")]
    pub dir: PathBuf,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: default_transcript_dir(),
        }
    }
}

impl Config {
    /// Load, apply the token override from the environment and validate.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_token_override(std::env::var(TOKEN_ENV).ok());
        validation::validate(&config).map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// A non-empty override replaces the configured token.
    pub fn apply_token_override(&mut self, token: Option<String>) {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.twitch.token = token;
        }
    }
}
