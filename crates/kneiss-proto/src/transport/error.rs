//! Transport error types.

use std::io;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::error::ProtocolError;

/// Errors raised while establishing a connection.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConnectionError {
    /// The endpoint string is not a usable URL.
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint {
        /// The rejected input.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },

    /// DNS resolution or the TCP connect failed.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        /// `host:port` that was dialled.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The host is not a valid TLS server name.
    #[error("invalid TLS server name {0:?}")]
    ServerName(String),

    /// The TLS handshake failed.
    #[error("TLS handshake with {host} failed: {source}")]
    Tls {
        /// Server name used for verification.
        host: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The WebSocket upgrade failed.
    #[error("WebSocket handshake failed: {0}")]
    WebSocket(#[source] Box<WsError>),
}

/// Errors that can occur when reading from a transport.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReadError {
    /// An I/O error occurred.
    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),

    /// The WebSocket layer reported an error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[source] Box<WsError>),
}

impl ReadError {
    /// True when the connection cannot deliver any more data.
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Io(e) => is_terminal_io(e),
            Self::WebSocket(e) => match e.as_ref() {
                WsError::ConnectionClosed | WsError::AlreadyClosed => true,
                WsError::Io(e) => is_terminal_io(e),
                WsError::Protocol(_) => true,
                _ => false,
            },
        }
    }
}

impl From<WsError> for ReadError {
    fn from(e: WsError) -> Self {
        Self::WebSocket(Box::new(e))
    }
}

fn is_terminal_io(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::NotConnected
    )
}

/// Errors that can occur when writing a line.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteError {
    /// The line was rejected by the codec or the stream failed.
    #[error("transport write error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The WebSocket sink failed.
    #[error("WebSocket send error: {0}")]
    WebSocket(#[source] Box<WsError>),
}

impl From<WsError> for WriteError {
    fn from(e: WsError) -> Self {
        Self::WebSocket(Box::new(e))
    }
}

/// Errors that can occur while closing a transport.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CloseError {
    /// Flushing or shutting down the stream failed.
    #[error("transport close error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The WebSocket close handshake failed.
    #[error("WebSocket close error: {0}")]
    WebSocket(#[source] Box<WsError>),

    /// A session task did not stop within the close timeout.
    #[error("timed out waiting for {0} to stop")]
    Timeout(&'static str),
}

impl From<WsError> for CloseError {
    fn from(e: WsError) -> Self {
        Self::WebSocket(Box::new(e))
    }
}
