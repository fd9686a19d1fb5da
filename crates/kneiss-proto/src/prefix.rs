//! IRC message prefix.
//!
//! The prefix identifies the origin of a message:
//!
//! ```text
//! <prefix> ::= <servername> | <nick> [ '!' <user> ] [ '@' <host> ]
//! ```
//!
//! A server name is not distinguished from a nickname: it lands in
//! [`Prefix::name`] with empty `user` and `host`.

use std::fmt;
use std::str::FromStr;

/// Sender identification of an IRC message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Prefix {
    /// Nickname or server name.
    pub name: String,
    /// Username, empty when absent.
    pub user: String,
    /// Hostname, empty when absent.
    pub host: String,
}

impl Prefix {
    /// Create a prefix from its three components.
    pub fn new(name: impl Into<String>, user: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            user: user.into(),
            host: host.into(),
        }
    }

    /// Parse a prefix string (without the leading `:`).
    ///
    /// This is lenient: `!` starts the user part only while still reading
    /// the name, and the first `@` starts the host part.
    pub fn new_from_str(s: &str) -> Self {
        let (rest, host) = match s.split_once('@') {
            Some((rest, host)) => (rest, host),
            None => (s, ""),
        };
        let (name, user) = match rest.split_once('!') {
            Some((name, user)) => (name, user),
            None => (rest, ""),
        };

        Self::new(name, user, host)
    }

    /// True when only a name is present, as for server-originated lines.
    pub fn is_server_like(&self) -> bool {
        self.user.is_empty() && self.host.is_empty()
    }
}

impl FromStr for Prefix {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Prefix::new_from_str(s))
    }
}

impl From<&str> for Prefix {
    fn from(s: &str) -> Self {
        Prefix::new_from_str(s)
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.user.is_empty() {
            write!(f, "!{}", self.user)?;
        }
        if !self.host.is_empty() {
            write!(f, "@{}", self.host)?;
        }
        Ok(())
    }
}
