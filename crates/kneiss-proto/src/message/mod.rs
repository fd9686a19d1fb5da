//! IRC message types and parsing.
//!
//! - [`Message`]: one protocol line as tags, prefix, command and params
//! - [`parse`]: infallible nom-based parser from a raw line

mod parse;
mod tags;
mod types;

pub use self::parse::parse;
pub use self::tags::{parse_tags, Tags};
pub use self::types::Message;
