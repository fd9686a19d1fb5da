//! IRCv3 message tags.
//!
//! ```text
//! <tags> ::= <tag> [';' <tag>]*
//! <tag>  ::= <key> ['=' <value>]
//! ```
//!
//! Values are kept exactly as they appear on the wire. IRCv3 escape
//! sequences (`\s`, `\:`, `\\` and friends) are not decoded.

use std::collections::HashMap;

/// Tag key to raw tag value. Empty when a line carries no tags.
pub type Tags = HashMap<String, String>;

/// Parse a raw tags string (without the leading `@`).
///
/// A key without `=` maps to an empty value. Empty entries are skipped and a
/// repeated key keeps its last value.
pub fn parse_tags(raw: &str) -> Tags {
    raw.split(';')
        .filter(|tag| !tag.is_empty())
        .map(|tag| match tag.split_once('=') {
            Some((key, value)) => (key.to_owned(), value.to_owned()),
            None => (tag.to_owned(), String::new()),
        })
        .collect()
}
