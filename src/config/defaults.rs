//! Default value functions for configuration.
//!
//! Separated into its own module so serde attributes and `Default` impls
//! share one source of truth.

use std::path::PathBuf;

use kneiss_proto::{Capability, DEFAULT_MAX_LINE_LEN, TWITCH_WEBSOCKET};

/// Path used when no config file is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "kneissbot.toml";

/// Environment variable that overrides `twitch.token`.
pub const TOKEN_ENV: &str = "KNEISSBOT_TOKEN";

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

// =============================================================================
// Twitch Defaults
// =============================================================================

pub fn default_capabilities() -> Vec<String> {
    Capability::ALL.iter().map(|cap| cap.as_str().to_string()).collect()
}

// =============================================================================
// Connection Defaults
// =============================================================================

pub fn default_endpoint() -> String {
    TWITCH_WEBSOCKET.to_string()
}

/// Twitch pings roughly every five minutes.
pub fn default_read_timeout() -> u64 {
    360
}

pub fn default_handshake_timeout() -> u64 {
    10
}

pub fn default_close_timeout() -> u64 {
    5
}

pub fn default_max_line_len() -> usize {
    DEFAULT_MAX_LINE_LEN
}

// =============================================================================
// Transcript Defaults
// =============================================================================

pub fn default_transcript_dir() -> PathBuf {
    PathBuf::from("data")
}

// =============================================================================
// Reconnect Defaults
// =============================================================================

pub fn default_initial_backoff() -> u64 {
    1
}

pub fn default_max_backoff() -> u64 {
    60
}
