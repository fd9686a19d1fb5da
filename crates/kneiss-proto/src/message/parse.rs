//! Nom-based IRC line parser.
//!
//! ```text
//! [@tags] [:prefix] <command> [params...] [:trailing]
//! ```
//!
//! Each zone is matched on its own so that a failure in one leaves the
//! others intact. The parser never returns an error: anything that cannot be
//! matched stays at its zero value.

use std::convert::Infallible;
use std::str::FromStr;

use nom::{
    bytes::complete::{tag, take_till, take_till1, take_while1},
    character::complete::{char, space0, space1},
    combinator::{eof, opt, peek, rest, verify},
    multi::many0,
    sequence::preceded,
    IResult,
};

use crate::prefix::Prefix;

use super::tags::{parse_tags, Tags};
use super::types::Message;

/// Parse the tag zone (the part after `@` and before the first space).
fn tags_zone(input: &str) -> IResult<&str, &str> {
    preceded(char('@'), take_till(|c| c == ' '))(input)
}

/// Parse the prefix zone (the part after `:` and before the first space).
fn prefix_zone(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), take_till1(|c| c == ' '))(input)
}

/// Parse the command: 1*letter or exactly three digits, followed by a space
/// or the end of the line.
fn command_zone(input: &str) -> IResult<&str, &str> {
    let (rest, cmd) = verify(take_while1(|c: char| c.is_ascii_alphanumeric()), |cmd: &str| {
        cmd.bytes().all(|b| b.is_ascii_alphabetic())
            || (cmd.len() == 3 && cmd.bytes().all(|b| b.is_ascii_digit()))
    })(input)?;
    let (rest, _) = peek(nom::branch::alt((tag(" "), eof)))(rest)?;
    Ok((rest, cmd))
}

/// A middle parameter: a space-separated token that does not start with `:`.
fn middle_param(input: &str) -> IResult<&str, &str> {
    preceded(
        space1,
        verify(take_till1(|c| c == ' '), |token: &str| !token.starts_with(':')),
    )(input)
}

/// The trailing parameter: everything after ` :` up to the end of the line.
fn trailing_param(input: &str) -> IResult<&str, &str> {
    preceded(space1, preceded(char(':'), rest))(input)
}

/// Parse all parameters. Middle params repeat greedily; once the colon of
/// the trailing param is seen nothing else is matched.
fn params_zone(input: &str) -> IResult<&str, Vec<&str>> {
    let (input, mut params) = many0(middle_param)(input)?;
    let (input, trailing) = opt(trailing_param)(input)?;
    let (input, _) = space0(input)?;
    params.extend(trailing);
    Ok((input, params))
}

/// Parse one raw line into a [`Message`].
///
/// A trailing `\r\n` (or either half of it) is ignored. Malformed input
/// degrades to empty fields rather than an error. Tag values are returned
/// without IRCv3 unescaping.
///
/// # Example
///
/// ```
/// use kneiss_proto::message::parse;
///
/// let msg = parse(":tmi.twitch.tv 376 kneissbot :>");
/// assert_eq!(msg.command, "376");
/// assert!(msg.tags.is_empty());
/// assert_eq!(msg.params, vec!["kneissbot", ">"]);
/// ```
pub fn parse(line: &str) -> Message {
    let line = line.trim_end_matches(['\r', '\n']);

    let (input, tags) = match tags_zone(line) {
        Ok((input, raw)) => (input, parse_tags(raw)),
        Err(_) => (line, Tags::new()),
    };
    let input = skip_spaces(input);

    let (input, prefix) = match prefix_zone(input) {
        Ok((input, raw)) => (input, Some(Prefix::new_from_str(raw))),
        Err(_) => (input, None),
    };
    let input = skip_spaces(input);

    let Ok((input, command)) = command_zone(input) else {
        return Message {
            tags,
            prefix,
            ..Message::default()
        };
    };

    let params = match params_zone(input) {
        Ok((_, params)) => params.into_iter().map(str::to_owned).collect(),
        Err(_) => Vec::new(),
    };

    Message {
        tags,
        prefix,
        command: command.to_owned(),
        params,
    }
}

fn skip_spaces(input: &str) -> &str {
    input.trim_start_matches(' ')
}

impl FromStr for Message {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Message, Self::Err> {
        Ok(parse(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_privmsg() {
        let msg = parse("@ban-duration=10 :nick!user@host PRIVMSG #chan :hello world");
        assert_eq!(msg.tags.len(), 1);
        assert_eq!(msg.tag("ban-duration"), Some("10"));
        assert_eq!(msg.prefix, Some(Prefix::new("nick", "user", "host")));
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.params, vec!["#chan", "hello world"]);
    }

    #[test]
    fn test_numeric_end_of_motd() {
        let msg = parse(":tmi.twitch.tv 376 user :End of /MOTD");
        assert_eq!(msg.command, "376");
        assert!(msg.tags.is_empty());
        let prefix = msg.prefix.as_ref().unwrap();
        assert_eq!(prefix.name, "tmi.twitch.tv");
        assert_eq!(prefix.user, "");
        assert_eq!(prefix.host, "");
        assert_eq!(msg.params, vec!["user", "End of /MOTD"]);
    }

    #[test]
    fn test_simple_command() {
        let msg = parse("PING");
        assert_eq!(msg.command, "PING");
        assert!(msg.prefix.is_none());
        assert!(msg.params.is_empty());
    }

    #[test]
    fn test_crlf_is_stripped() {
        let msg = parse("PING :tmi.twitch.tv\r\n");
        assert_eq!(msg.command, "PING");
        assert_eq!(msg.params, vec!["tmi.twitch.tv"]);
    }

    #[test]
    fn test_middle_params_only() {
        let msg = parse(":kneissbot!kneissbot@kneissbot.tmi.twitch.tv JOIN #lirik");
        assert_eq!(msg.command, "JOIN");
        assert_eq!(msg.params, vec!["#lirik"]);
    }

    #[test]
    fn test_many_middle_params_then_trailing() {
        let msg = parse(":kneissbot.tmi.twitch.tv 353 kneissbot = #lirik :a b c");
        assert_eq!(msg.command, "353");
        assert_eq!(msg.params, vec!["kneissbot", "=", "#lirik", "a b c"]);
    }

    #[test]
    fn test_trailing_keeps_colons_and_extra_spaces() {
        let msg = parse("PRIVMSG #chan :look:  here :)");
        assert_eq!(msg.params, vec!["#chan", "look:  here :)"]);
    }

    #[test]
    fn test_empty_trailing() {
        let msg = parse("PRIVMSG #chan :");
        assert_eq!(msg.params, vec!["#chan", ""]);
    }

    #[test]
    fn test_space_only_trailing() {
        let msg = parse("MODE #chan +k : ");
        assert_eq!(msg.params, vec!["#chan", "+k", " "]);
    }

    #[test]
    fn test_consecutive_spaces_are_one_separator() {
        let msg = parse("CAP  *   ACK :twitch.tv/tags");
        assert_eq!(msg.command, "CAP");
        assert_eq!(msg.params, vec!["*", "ACK", "twitch.tv/tags"]);
    }

    #[test]
    fn test_trailing_spaces_after_middles_ignored() {
        let msg = parse("JOIN #lirik   ");
        assert_eq!(msg.params, vec!["#lirik"]);
    }

    #[test]
    fn test_tag_without_value() {
        let msg = parse("@emote-only;room-id=1 :tmi.twitch.tv ROOMSTATE #chan");
        assert_eq!(msg.tag("emote-only"), Some(""));
        assert_eq!(msg.tag("room-id"), Some("1"));
        assert_eq!(msg.command, "ROOMSTATE");
    }

    #[test]
    fn test_tags_without_prefix() {
        let msg = parse("@badge-info=;badges= GLOBALUSERSTATE");
        assert_eq!(msg.tags.len(), 2);
        assert!(msg.prefix.is_none());
        assert_eq!(msg.command, "GLOBALUSERSTATE");
    }

    #[test]
    fn test_invalid_commands_degrade_to_empty() {
        for line in ["PING123 :x", "12 foo", "1234", ":prefix.only", "", "   ", "#chan"] {
            let msg = parse(line);
            assert_eq!(msg.command, "", "line {line:?} should not yield a command");
            assert!(msg.params.is_empty(), "line {line:?} should not yield params");
        }
    }

    #[test]
    fn test_unclassifiable_command_keeps_tags_and_prefix() {
        let msg = parse("@a=1 :server.example 12345 stuff");
        assert_eq!(msg.tag("a"), Some("1"));
        assert_eq!(msg.nick(), Some("server.example"));
        assert_eq!(msg.command, "");
    }

    #[test]
    fn test_from_str_matches_parse() {
        let line = ":tmi.twitch.tv RECONNECT";
        let msg: Message = line.parse().unwrap();
        assert_eq!(msg, parse(line));
        assert_eq!(msg.command, "RECONNECT");
    }
}
