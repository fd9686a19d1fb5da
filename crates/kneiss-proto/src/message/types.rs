use std::fmt;

use crate::prefix::Prefix;
use crate::response::Response;

use super::tags::Tags;

/// An owned IRC message.
///
/// Built once per inbound line by [`super::parse`] and treated as immutable
/// afterwards. Outbound messages are built with the constructors below and
/// serialized with `Display`, which produces the wire form without the line
/// terminator.
///
/// # Example
///
/// ```
/// use kneiss_proto::Message;
///
/// let msg = Message::privmsg("#kneiss", "hello chat");
/// assert_eq!(msg.to_string(), "PRIVMSG #kneiss :hello chat");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Message {
    /// IRCv3 message tags. Empty when the line carries none.
    pub tags: Tags,
    /// Message prefix/source (e.g. `nick!user@host`).
    pub prefix: Option<Prefix>,
    /// Alphabetic verb or three-digit numeric. Empty when unclassifiable.
    pub command: String,
    /// Parameters in wire order, the trailing one included.
    pub params: Vec<String>,
}

impl Message {
    /// Create a message from a command and its parameters.
    pub fn new<C, I, P>(command: C, params: I) -> Self
    where
        C: Into<String>,
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            tags: Tags::new(),
            prefix: None,
            command: command.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// Add a tag, returning the updated message.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Set the prefix, returning the updated message.
    #[must_use]
    pub fn with_prefix(mut self, prefix: Prefix) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// Get the value of a tag by key.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Get the parameter at `index`.
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// Get the last parameter, which carries the text of most chat lines.
    pub fn trailing(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }

    /// Get the sender's nickname (or server name) from the prefix.
    pub fn nick(&self) -> Option<&str> {
        self.prefix
            .as_ref()
            .map(|p| p.name.as_str())
            .filter(|name| !name.is_empty())
    }

    /// True for three-digit numeric replies.
    pub fn is_numeric(&self) -> bool {
        self.command.len() == 3 && self.command.bytes().all(|b| b.is_ascii_digit())
    }

    /// Get the numeric reply, if this is one the library knows about.
    pub fn response(&self) -> Option<Response> {
        if !self.is_numeric() {
            return None;
        }
        self.command.parse::<u16>().ok().and_then(Response::from_code)
    }

    /// `PASS <password>`
    #[must_use]
    pub fn pass(password: impl Into<String>) -> Self {
        Self::new("PASS", [password.into()])
    }

    /// `NICK <nickname>`
    #[must_use]
    pub fn nick_cmd(nickname: impl Into<String>) -> Self {
        Self::new("NICK", [nickname.into()])
    }

    /// `JOIN <channel>`
    #[must_use]
    pub fn join(channel: impl Into<String>) -> Self {
        Self::new("JOIN", [channel.into()])
    }

    /// `PART <channel>`
    #[must_use]
    pub fn part(channel: impl Into<String>) -> Self {
        Self::new("PART", [channel.into()])
    }

    /// `PRIVMSG <target> :<text>`
    #[must_use]
    pub fn privmsg(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new("PRIVMSG", [target.into(), text.into()])
    }

    /// `PONG :<server>`
    #[must_use]
    pub fn pong(server: impl Into<String>) -> Self {
        Self::new("PONG", [server.into()])
    }

    /// `CAP REQ :<capabilities>`
    #[must_use]
    pub fn cap_req(capabilities: impl Into<String>) -> Self {
        Self::new("CAP", ["REQ".to_owned(), capabilities.into()])
    }
}

/// Commands whose last parameter is always written in trailing form.
const TRAILING_COMMANDS: &[&str] = &["PONG", "CAP", "PRIVMSG", "NOTICE"];

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.tags.is_empty() {
            let mut keys: Vec<&String> = self.tags.keys().collect();
            keys.sort();

            f.write_str("@")?;
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    f.write_str(";")?;
                }
                f.write_str(key)?;
                let value = &self.tags[key];
                if !value.is_empty() {
                    write!(f, "={value}")?;
                }
            }
            f.write_str(" ")?;
        }

        if let Some(prefix) = &self.prefix {
            write!(f, ":{prefix} ")?;
        }

        f.write_str(&self.command)?;

        let Some((last, middle)) = self.params.split_last() else {
            return Ok(());
        };
        for param in middle {
            write!(f, " {param}")?;
        }

        let needs_colon = last.is_empty()
            || last.contains(' ')
            || last.starts_with(':')
            || TRAILING_COMMANDS.contains(&self.command.as_str());
        if needs_colon {
            write!(f, " :{last}")
        } else {
            write!(f, " {last}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_privmsg() {
        let msg = Message::privmsg("#kneiss", "hello world");
        assert_eq!(msg.to_string(), "PRIVMSG #kneiss :hello world");
    }

    #[test]
    fn test_display_single_word_privmsg_uses_trailing() {
        let msg = Message::privmsg("#kneiss", "hi");
        assert_eq!(msg.to_string(), "PRIVMSG #kneiss :hi");
    }

    #[test]
    fn test_display_join_and_nick() {
        assert_eq!(Message::join("#lirik").to_string(), "JOIN #lirik");
        assert_eq!(Message::nick_cmd("kneissbot").to_string(), "NICK kneissbot");
        assert_eq!(Message::part("#lirik").to_string(), "PART #lirik");
    }

    #[test]
    fn test_display_pong_and_cap() {
        assert_eq!(
            Message::pong("tmi.twitch.tv").to_string(),
            "PONG :tmi.twitch.tv"
        );
        assert_eq!(
            Message::cap_req("twitch.tv/tags").to_string(),
            "CAP REQ :twitch.tv/tags"
        );
    }

    #[test]
    fn test_display_tags_and_prefix() {
        let msg = Message::new("CLEARCHAT", ["#chan", "spammer"])
            .with_tag("room-id", "42")
            .with_tag("ban-duration", "600")
            .with_prefix(Prefix::new("tmi.twitch.tv", "", ""));
        assert_eq!(
            msg.to_string(),
            "@ban-duration=600;room-id=42 :tmi.twitch.tv CLEARCHAT #chan spammer"
        );
    }

    #[test]
    fn test_display_empty_trailing() {
        let msg = Message::new("TOPIC", ["#chan", ""]);
        assert_eq!(msg.to_string(), "TOPIC #chan :");
    }

    #[test]
    fn test_accessors() {
        let msg = Message::new("366", ["kneissbot", "#lirik", "End of /NAMES list"])
            .with_prefix(Prefix::new("kneissbot.tmi.twitch.tv", "", ""));
        assert!(msg.is_numeric());
        assert_eq!(msg.response(), Some(Response::RPL_ENDOFNAMES));
        assert_eq!(msg.param(1), Some("#lirik"));
        assert_eq!(msg.trailing(), Some("End of /NAMES list"));
        assert_eq!(msg.nick(), Some("kneissbot.tmi.twitch.tv"));
        assert_eq!(msg.tag("missing"), None);
    }

    #[test]
    fn test_verbs_are_not_numeric() {
        let msg = Message::new("PING", ["tmi.twitch.tv"]);
        assert!(!msg.is_numeric());
        assert_eq!(msg.response(), None);
    }
}
