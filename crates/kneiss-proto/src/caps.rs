//! Twitch IRCv3 capabilities.
//!
//! Twitch accepts `CAP REQ` without the usual `CAP LS` negotiation. Each
//! capability is requested on its own line after registration.

use std::fmt;

/// Capability understood by the Twitch chat servers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Capability {
    /// Twitch-specific commands (CLEARCHAT, RECONNECT, USERNOTICE, ...)
    Commands,
    /// JOIN/PART membership events and NAMES replies
    Membership,
    /// IRCv3 message tags on chat lines
    Tags,
    /// Any other capability name
    Custom(String),
}

impl Capability {
    /// The three capabilities a chat bot usually wants.
    pub const ALL: [Capability; 3] = [Self::Commands, Self::Membership, Self::Tags];

    /// Wire name of the capability.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Commands => "twitch.tv/commands",
            Self::Membership => "twitch.tv/membership",
            Self::Tags => "twitch.tv/tags",
            Self::Custom(s) => s,
        }
    }
}

impl AsRef<str> for Capability {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Capability {
    fn from(s: &str) -> Self {
        match s {
            "twitch.tv/commands" => Self::Commands,
            "twitch.tv/membership" => Self::Membership,
            "twitch.tv/tags" => Self::Tags,
            other => Self::Custom(other.to_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names_round_trip() {
        for cap in Capability::ALL {
            assert_eq!(Capability::from(cap.as_str()), cap);
        }
    }

    #[test]
    fn test_custom_capability() {
        let cap = Capability::from("server-time");
        assert_eq!(cap, Capability::Custom("server-time".to_owned()));
        assert_eq!(cap.to_string(), "server-time");
    }
}
