//! # kneiss-proto
//!
//! Protocol library for the Twitch chat flavour of IRC.
//!
//! ## Features
//!
//! - IRC line parsing with IRCv3 tags, prefixes, commands and parameters
//! - A frame splitter that turns arbitrary byte chunks into whole lines
//! - Outbound serialization through [`Message`]'s `Display` impl
//! - Numeric replies and Twitch capabilities used by a chat client
//! - Optional Tokio transports over TCP, TLS and WebSocket
//!
//! ## Parsing
//!
//! ```rust
//! use kneiss_proto::message::parse;
//!
//! let msg = parse("@ban-duration=10 :nick!user@host PRIVMSG #chan :hello world");
//! assert_eq!(msg.command, "PRIVMSG");
//! assert_eq!(msg.tag("ban-duration"), Some("10"));
//! assert_eq!(msg.params, vec!["#chan", "hello world"]);
//! ```
//!
//! Parsing never fails. Components that cannot be matched are left empty,
//! so a garbage line yields a [`Message`] with an empty command that no
//! handler will claim.
//!
//! ## Framing
//!
//! ```rust
//! use kneiss_proto::FrameSplitter;
//!
//! let mut splitter = FrameSplitter::new();
//! assert!(splitter.split(b"PING :tmi.tw").is_empty());
//! assert_eq!(splitter.split(b"itch.tv\r\n"), vec!["PING :tmi.twitch.tv"]);
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod caps;
pub mod error;
pub mod frame;
#[cfg(feature = "tokio")]
pub mod line;
pub mod message;
pub mod prefix;
pub mod response;
#[cfg(feature = "tokio")]
pub mod transport;

pub use self::caps::Capability;
pub use self::error::ProtocolError;
pub use self::frame::{FrameSplitter, DEFAULT_MAX_LINE_LEN};
#[cfg(feature = "tokio")]
pub use self::line::LineCodec;
pub use self::message::{parse, Message, Tags};
pub use self::prefix::Prefix;
pub use self::response::Response;

#[cfg(feature = "tokio")]
pub use self::transport::{
    CloseError, ConnectionError, Endpoint, ReadError, Scheme, Transport, TransportReader,
    TransportWriter, WriteError, TWITCH_WEBSOCKET,
};
