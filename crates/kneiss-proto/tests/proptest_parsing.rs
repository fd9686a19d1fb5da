//! Property-based tests for line parsing and framing.
//!
//! Verifies that:
//! 1. Parsing never panics, whatever the input
//! 2. A colon-introduced trailing parameter comes back verbatim
//! 3. Chunk boundaries do not change what the splitter produces

use kneiss_proto::{parse, FrameSplitter, Message, Prefix};
use proptest::prelude::*;

// =============================================================================
// STRATEGIES
// =============================================================================

/// Twitch login names: lowercase letters, digits and underscores.
fn nickname_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,24}").expect("valid regex")
}

fn channel_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("#[a-z0-9_]{1,24}").expect("valid regex")
}

/// Chat text: anything but line breaks and NUL.
fn message_text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[^\r\n\0]{0,400}").expect("valid regex")
}

fn tag_key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9\\-]{0,20}").expect("valid regex")
}

/// Tag value: no spaces, semicolons or line breaks.
fn tag_value_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9#/,._\\-]{0,40}").expect("valid regex")
}

fn privmsg_strategy() -> impl Strategy<Value = Message> {
    (
        prop::collection::hash_map(tag_key_strategy(), tag_value_strategy(), 0..5),
        nickname_strategy(),
        channel_strategy(),
        message_text_strategy(),
    )
        .prop_map(|(tags, nick, channel, text)| {
            let host = format!("{nick}.tmi.twitch.tv");
            let mut msg = Message::privmsg(channel, text)
                .with_prefix(Prefix::new(nick.clone(), nick, host));
            msg.tags = tags;
            msg
        })
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    #[test]
    fn parse_never_panics(line in "\\PC{0,600}") {
        let _ = parse(&line);
    }

    #[test]
    fn parse_never_panics_on_bytes(bytes in prop::collection::vec(any::<u8>(), 0..600)) {
        let line = String::from_utf8_lossy(&bytes);
        let _ = parse(&line);
    }

    #[test]
    fn trailing_param_is_verbatim(
        channel in channel_strategy(),
        text in message_text_strategy(),
    ) {
        let line = format!(":kneiss!kneiss@kneiss.tmi.twitch.tv PRIVMSG {channel} :{text}");
        let msg = parse(&line);
        prop_assert_eq!(msg.command.as_str(), "PRIVMSG");
        prop_assert_eq!(msg.params.len(), 2);
        prop_assert_eq!(msg.param(0), Some(channel.as_str()));
        prop_assert_eq!(msg.trailing(), Some(text.as_str()));
    }

    #[test]
    fn display_then_parse_preserves_privmsg(msg in privmsg_strategy()) {
        let reparsed = parse(&msg.to_string());
        prop_assert_eq!(reparsed, msg);
    }

    #[test]
    fn split_offset_does_not_matter(msg in privmsg_strategy(), cut in any::<prop::sample::Index>()) {
        let wire = format!("{msg}\r\n");
        let bytes = wire.as_bytes();
        let at = cut.index(bytes.len() + 1);

        // Multi-byte text can push a tagged line past the default bound.
        let mut splitter = FrameSplitter::with_max_len(8192);
        let mut lines = splitter.split(&bytes[..at]);
        lines.extend(splitter.split(&bytes[at..]));

        prop_assert_eq!(lines.len(), 1);
        prop_assert_eq!(parse(&lines[0]), msg);
        prop_assert_eq!(splitter.pending(), 0);
    }

    #[test]
    fn n_lines_yield_n_frames(
        texts in prop::collection::vec(message_text_strategy(), 1..20),
        chunk in 1usize..64,
    ) {
        let wire: String = texts
            .iter()
            .map(|text| format!("{}\r\n", Message::privmsg("#kneiss", text.as_str())))
            .collect();

        let mut splitter = FrameSplitter::new();
        let lines: Vec<String> = wire
            .as_bytes()
            .chunks(chunk)
            .flat_map(|c| splitter.split(c))
            .collect();

        prop_assert_eq!(lines.len(), texts.len());
        for (line, text) in lines.iter().zip(&texts) {
            prop_assert!(!line.is_empty());
            prop_assert!(!line.contains('\n'));
            let msg = parse(line);
            prop_assert_eq!(msg.trailing(), Some(text.as_str()));
        }
    }
}
