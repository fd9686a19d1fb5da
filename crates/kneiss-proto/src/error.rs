//! Error types for the protocol library.
//!
//! Inbound parsing is infallible, so these errors only arise when encoding
//! outbound lines or when the underlying I/O fails.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Protocol-level errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Line exceeded the maximum allowed length.
    #[error("message too long: {actual} bytes (limit: {limit})")]
    MessageTooLong {
        /// Actual line length.
        actual: usize,
        /// Maximum allowed length.
        limit: usize,
    },

    /// Outbound line was empty once line terminators were stripped.
    #[error("refusing to send an empty line")]
    EmptyLine,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_too_long_display() {
        let err = ProtocolError::MessageTooLong {
            actual: 4096,
            limit: 2048,
        };
        assert_eq!(
            err.to_string(),
            "message too long: 4096 bytes (limit: 2048)"
        );
    }

    #[test]
    fn test_io_error_source_is_chained() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken pipe");
        let err: ProtocolError = io_err.into();

        let source = std::error::Error::source(&err);
        assert_eq!(source.map(|s| s.to_string()).as_deref(), Some("broken pipe"));
    }
}
