//! Telemetry utilities for session logging.

/// Hide the password of an outbound `PASS` line before it reaches the logs.
pub fn redact(line: &str) -> &str {
    match line.get(..5) {
        Some(verb) if verb.eq_ignore_ascii_case("PASS ") => "PASS ********",
        _ => line,
    }
}

/// Standardized span constructors for chat observability.
pub mod spans {
    use tracing::{Span, info_span};

    /// Create a span for a connection to a chat server.
    pub fn connection(endpoint: &str) -> Span {
        info_span!("connection", endpoint = %endpoint)
    }

    /// Create a span for the loops of one session.
    pub fn session(id: u64) -> Span {
        info_span!("session", id = id)
    }
}
