//! Error types shared across the bot.
//!
//! Transport and connection errors live in `kneiss_proto::transport`; the
//! errors here cover the session queue, handshakes and command handlers.

use std::time::Duration;

use thiserror::Error;

use crate::handshake::HandshakeKey;

// ============================================================================
// Session Errors
// ============================================================================

/// Errors raised by [`crate::network::SessionHandle`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The write loop has stopped; nothing more can be sent.
    #[error("session is closed")]
    Closed,
}

// ============================================================================
// Handshake Errors
// ============================================================================

/// Why a connect or join handshake did not complete.
#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("{key} timed out after {after:?}")]
    Timeout { key: HandshakeKey, after: Duration },

    #[error("{key} rejected: {reason}")]
    Rejected { key: HandshakeKey, reason: String },

    #[error("{0} is already pending")]
    AlreadyPending(HandshakeKey),

    #[error("session closed during {0}")]
    SessionClosed(HandshakeKey),

    #[error("failed to send handshake request: {0}")]
    Send(#[from] SessionError),
}

impl HandshakeError {
    /// True when the server explicitly refused, so retrying is pointless.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

// ============================================================================
// Handler Errors (command processing)
// ============================================================================

/// Errors that can occur during command handling.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("missing parameter: {0}")]
    MissingParam(&'static str),

    #[error("send error: {0}")]
    Session(#[from] SessionError),
}

impl HandlerError {
    /// Get a static error code string for log fields.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingParam(_) => "missing_param",
            Self::Session(_) => "session_closed",
        }
    }
}
