//! Bot state and the operations handlers and the connector run on a session.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use kneiss_proto::{Capability, Message};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{HandshakeError, SessionError};
use crate::handshake::{channel_name, HandshakeKey, Handshakes};
use crate::network::SessionHandle;
use crate::transcript::Transcript;

/// Login credentials.
#[derive(Clone)]
pub struct Identity {
    pub username: String,
    pub token: String,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("username", &self.username)
            .field("token", &"********")
            .finish()
    }
}

// ============================================================================
// Chat statistics
// ============================================================================

/// Counters updated by the chat handlers.
#[derive(Debug, Default)]
pub struct ChatStats {
    messages: AtomicU64,
    bans: AtomicU64,
    timeouts: AtomicU64,
    clears: AtomicU64,
    notices: AtomicU64,
}

/// Point-in-time copy of [`ChatStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub messages: u64,
    pub bans: u64,
    pub timeouts: u64,
    pub clears: u64,
    pub notices: u64,
}

impl ChatStats {
    pub fn record_message(&self) {
        self.messages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ban(&self) {
        self.bans.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_clear(&self) {
        self.clears.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_notice(&self) {
        self.notices.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            messages: self.messages.load(Ordering::Relaxed),
            bans: self.bans.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            clears: self.clears.load(Ordering::Relaxed),
            notices: self.notices.load(Ordering::Relaxed),
        }
    }
}

// ============================================================================
// Bot
// ============================================================================

/// Everything the bot knows that outlives a single session.
pub struct Bot {
    identity: Identity,
    capabilities: Vec<Capability>,
    /// Keyed by lowercase name without `!`.
    commands: HashMap<String, String>,
    handshakes: Handshakes,
    stats: ChatStats,
    joined: Mutex<BTreeSet<String>>,
    transcript: Option<Transcript>,
}

impl Bot {
    /// Build a bot. Command names are normalized to lowercase without `!`.
    pub fn new(
        identity: Identity,
        capabilities: Vec<Capability>,
        commands: HashMap<String, String>,
        handshake_timeout: Duration,
    ) -> Self {
        let commands = commands
            .into_iter()
            .map(|(name, reply)| (name.trim_start_matches('!').to_lowercase(), reply))
            .collect();

        Self {
            identity,
            capabilities,
            commands,
            handshakes: Handshakes::new(handshake_timeout),
            stats: ChatStats::default(),
            joined: Mutex::new(BTreeSet::new()),
            transcript: None,
        }
    }

    /// Record channel traffic to `transcript`.
    pub fn with_transcript(mut self, transcript: Transcript) -> Self {
        self.transcript = Some(transcript);
        self
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Identity {
                username: config.twitch.username.clone(),
                token: config.twitch.token.clone(),
            },
            config.twitch.capabilities(),
            config.commands.clone(),
            config.connection.handshake_timeout(),
        )
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn handshakes(&self) -> &Handshakes {
        &self.handshakes
    }

    pub fn stats(&self) -> &ChatStats {
        &self.stats
    }

    pub fn transcript(&self) -> Option<&Transcript> {
        self.transcript.as_ref()
    }

    /// Append a raw inbound line to the transcript of the channel it names.
    pub fn transcribe(&self, msg: &Message, raw: &str) {
        if let Some(transcript) = &self.transcript
            && let Some(channel) = msg.params.iter().find(|p| p.starts_with('#'))
        {
            transcript.record(channel, raw);
        }
    }

    /// Reply configured for `!name`, if any.
    pub fn command_reply(&self, name: &str) -> Option<&str> {
        self.commands.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Channels joined on the current session, without `#`.
    pub fn joined_channels(&self) -> Vec<String> {
        self.joined.lock().iter().cloned().collect()
    }

    /// Forget per-session state before a new session starts.
    pub fn reset(&self) {
        self.handshakes.clear();
        self.joined.lock().clear();
    }

    /// Log in and wait for the server to accept.
    pub async fn connect(&self, session: &SessionHandle) -> Result<(), HandshakeError> {
        self.handshakes
            .connect(session, &self.identity.username, &self.identity.token)
            .await
    }

    /// Send one `CAP REQ` per configured capability.
    pub fn request_capabilities(&self, session: &SessionHandle) -> Result<(), SessionError> {
        for cap in &self.capabilities {
            debug!(capability = %cap, "requesting capability");
            session.send_message(&Message::cap_req(cap.as_str()))?;
        }
        Ok(())
    }

    pub async fn join(&self, session: &SessionHandle, channel: &str) -> Result<(), HandshakeError> {
        self.handshakes.join(session, channel).await?;
        self.joined.lock().insert(channel_name(channel));
        Ok(())
    }

    /// Send `PART` and forget the channel. Does not wait for a reply.
    pub fn part(&self, session: &SessionHandle, channel: &str) -> Result<(), SessionError> {
        let name = channel_name(channel);
        session.send_message(&Message::part(format!("#{name}")))?;
        self.handshakes.reset(&HandshakeKey::join(&name));
        if self.joined.lock().remove(&name) {
            info!(channel = %name, "parted");
        }
        Ok(())
    }

    pub fn privmsg(&self, session: &SessionHandle, channel: &str, text: &str) -> Result<(), SessionError> {
        session.send_message(&Message::privmsg(format!("#{}", channel_name(channel)), text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handshake::HandshakeState;
    use crate::handlers::Registry;
    use crate::testing::{read_lines, start_session, start_session_with, test_bot};
    use std::sync::Arc;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn test_stats_snapshot() {
        let stats = ChatStats::default();
        stats.record_message();
        stats.record_message();
        stats.record_ban();
        stats.record_timeout();
        stats.record_clear();
        stats.record_notice();

        assert_eq!(
            stats.snapshot(),
            StatsSnapshot {
                messages: 2,
                bans: 1,
                timeouts: 1,
                clears: 1,
                notices: 1,
            }
        );
    }

    #[test]
    fn test_command_lookup_is_normalized() {
        let bot = test_bot();
        assert_eq!(bot.command_reply("discord"), Some("https://discord.gg/kneiss"));
        assert_eq!(bot.command_reply("Discord"), Some("https://discord.gg/kneiss"));
        assert_eq!(bot.command_reply("uptime"), Some("forever"));
        assert_eq!(bot.command_reply("missing"), None);
    }

    #[test]
    fn test_identity_debug_hides_token() {
        let bot = test_bot();
        let debug = format!("{:?}", bot.identity());
        assert!(debug.contains("kneissbot"));
        assert!(!debug.contains("secret"));
    }

    #[tokio::test]
    async fn test_request_capabilities() {
        let (session, mut server) = start_session();
        let bot = test_bot();

        bot.request_capabilities(session.handle()).unwrap();
        assert_eq!(
            read_lines(&mut server, 3).await,
            vec![
                "CAP REQ :twitch.tv/commands",
                "CAP REQ :twitch.tv/membership",
                "CAP REQ :twitch.tv/tags",
            ]
        );
    }

    #[tokio::test]
    async fn test_part_resets_join_state() {
        let (session, mut server) = start_session();
        let bot = test_bot();
        let key = HandshakeKey::join("kneiss");

        let pending = bot.handshakes().register(key.clone()).unwrap();
        bot.handshakes()
            .complete(&key, crate::handshake::HandshakeOutcome::Complete);
        drop(pending);
        bot.joined.lock().insert("kneiss".into());

        bot.part(session.handle(), "#Kneiss").unwrap();
        assert_eq!(read_lines(&mut server, 1).await, vec!["PART #kneiss"]);
        assert_eq!(bot.handshakes().state(&key), HandshakeState::Idle);
        assert!(bot.joined_channels().is_empty());
    }

    #[tokio::test]
    async fn test_privmsg_formats_channel() {
        let (session, mut server) = start_session();
        let bot = test_bot();

        bot.privmsg(session.handle(), "kneiss", "hello chat").unwrap();
        assert_eq!(
            read_lines(&mut server, 1).await,
            vec!["PRIVMSG #kneiss :hello chat"]
        );
    }

    #[tokio::test]
    async fn test_channel_lines_are_transcribed() {
        let dir = tempfile::tempdir().unwrap();
        let bot = Arc::new(
            Bot::new(
                Identity {
                    username: "kneissbot".into(),
                    token: "secret".into(),
                },
                Vec::new(),
                HashMap::new(),
                Duration::from_secs(5),
            )
            .with_transcript(Transcript::spawn(dir.path())),
        );
        let (_session, mut server) = start_session_with(Arc::new(Registry::with_defaults()), bot.clone());

        server
            .write_all(
                b"@badges= :viewer!viewer@viewer.tmi.twitch.tv PRIVMSG #kneiss :hello\r\n\
                  :viewer!viewer@viewer.tmi.twitch.tv JOIN #kneiss\r\n\
                  PING :tmi.twitch.tv\r\n",
            )
            .await
            .unwrap();
        assert_eq!(read_lines(&mut server, 1).await, vec!["PONG :tmi.twitch.tv"]);
        bot.transcript().unwrap().flush().await;

        let text = std::fs::read_to_string(dir.path().join("kneiss.txt")).unwrap();
        let lines: Vec<_> = text.lines().map(|l| l.split_once(' ').unwrap().1).collect();
        assert_eq!(
            lines,
            vec![
                "@badges= :viewer!viewer@viewer.tmi.twitch.tv PRIVMSG #kneiss :hello",
                ":viewer!viewer@viewer.tmi.twitch.tv JOIN #kneiss",
            ]
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_transcribe_without_transcript_is_noop() {
        let bot = test_bot();
        assert!(bot.transcript().is_none());
        bot.transcribe(&kneiss_proto::parse("PRIVMSG #kneiss :hi"), "PRIVMSG #kneiss :hi");
    }
}
