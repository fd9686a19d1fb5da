//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use thiserror::Error;

use super::Config;

/// Shortest line bound a chat server is allowed to assume.
const MIN_LINE_LEN: usize = 512;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("twitch.username is required")]
    MissingUsername,
    #[error("twitch.token is required (or set KNEISSBOT_TOKEN)")]
    MissingToken,
    #[error("connection.endpoint is invalid: {0}")]
    InvalidEndpoint(String),
    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
    #[error("connection.max_line_len must be at least 512, got {0}")]
    LineLimitTooSmall(usize),
    #[error("reconnect.initial_backoff_secs ({initial}) exceeds max_backoff_secs ({max})")]
    BackoffOrder { initial: u64, max: u64 },
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.twitch.username.trim().is_empty() {
        errors.push(ValidationError::MissingUsername);
    }
    if config.twitch.token.trim().is_empty() {
        errors.push(ValidationError::MissingToken);
    }

    let conn = &config.connection;
    if let Err(e) = conn.endpoint() {
        errors.push(ValidationError::InvalidEndpoint(e.to_string()));
    }
    for (name, secs) in [
        ("connection.read_timeout_secs", conn.read_timeout_secs),
        ("connection.handshake_timeout_secs", conn.handshake_timeout_secs),
        ("connection.close_timeout_secs", conn.close_timeout_secs),
    ] {
        if secs == 0 {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }
    if conn.max_line_len < MIN_LINE_LEN {
        errors.push(ValidationError::LineLimitTooSmall(conn.max_line_len));
    }

    let reconnect = &config.reconnect;
    if reconnect.initial_backoff_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("reconnect.initial_backoff_secs"));
    }
    if reconnect.initial_backoff_secs > reconnect.max_backoff_secs {
        errors.push(ValidationError::BackoffOrder {
            initial: reconnect.initial_backoff_secs,
            max: reconnect.max_backoff_secs,
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
