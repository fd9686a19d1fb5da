//! Transport session: one read loop, one write loop, one outbound queue.
//!
//! The read loop frames and parses inbound bytes and spawns a dispatch task
//! per message. The write loop drains the outbound queue in order. Both stop
//! on a shared cancellation token, so closing never waits on a parked read.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use kneiss_proto::{
    parse, CloseError, ConnectionError, Endpoint, FrameSplitter, Message, Transport, TransportReader,
    TransportWriter,
};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn, Instrument};

use crate::bot::Bot;
use crate::config::ConnectionConfig;
use crate::error::SessionError;
use crate::handlers::{Context, Registry};
use crate::telemetry::{redact, spans};

/// Consecutive transient read errors tolerated before giving up.
const MAX_TRANSIENT_ERRORS: u32 = 16;

/// Queued lines still written after a close was requested.
const DRAIN_LIMIT: usize = 64;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Timing and size limits for one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Longest silence before the session closes with [`CloseReason::IdleTimeout`].
    pub read_timeout: Duration,
    /// How long each loop may take to stop in [`Session::close`].
    pub close_timeout: Duration,
    /// Bound for inbound frames and outbound lines, terminator excluded.
    pub max_line_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&ConnectionConfig::default())
    }
}

impl From<&ConnectionConfig> for SessionConfig {
    fn from(config: &ConnectionConfig) -> Self {
        Self {
            read_timeout: config.read_timeout(),
            close_timeout: config.close_timeout(),
            max_line_len: config.max_line_len,
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The owner asked for it.
    Requested,
    /// End of stream.
    PeerClosed,
    /// The transport failed, or too many transient errors in a row.
    ReadFailed(String),
    /// Nothing arrived within the read timeout.
    IdleTimeout,
    /// The server sent `RECONNECT`.
    ReconnectRequested,
}

impl CloseReason {
    /// Anything the owner did not ask for warrants a new connection.
    pub fn should_reconnect(&self) -> bool {
        !matches!(self, Self::Requested)
    }
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Requested => f.write_str("closed by request"),
            Self::PeerClosed => f.write_str("closed by peer"),
            Self::ReadFailed(e) => write!(f, "read failed: {e}"),
            Self::IdleTimeout => f.write_str("idle timeout"),
            Self::ReconnectRequested => f.write_str("server requested reconnect"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closing,
    Closed(CloseReason),
}

impl SessionState {
    pub fn close_reason(&self) -> Option<&CloseReason> {
        match self {
            Self::Closed(reason) => Some(reason),
            _ => None,
        }
    }
}

/// State shared by the handles and both loops.
struct Shared {
    state: watch::Sender<SessionState>,
    /// First recorded reason wins.
    reason: Mutex<Option<CloseReason>>,
    cancel: CancellationToken,
}

impl Shared {
    fn begin_close(&self, reason: CloseReason) {
        {
            let mut slot = self.reason.lock();
            if slot.is_none() {
                *slot = Some(reason);
            }
        }
        self.state.send_if_modified(|state| {
            if *state == SessionState::Open {
                *state = SessionState::Closing;
                true
            } else {
                false
            }
        });
        self.cancel.cancel();
    }

    fn finish(&self) {
        let reason = self.reason.lock().clone().unwrap_or(CloseReason::Requested);
        self.state.send_replace(SessionState::Closed(reason));
    }
}

/// Cloneable handle for sending on and observing a session.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<String>,
    shared: Arc<Shared>,
}

impl SessionHandle {
    /// Queue a line for the write loop. Never blocks and never drops.
    pub fn send(&self, line: impl Into<String>) -> Result<(), SessionError> {
        self.tx.send(line.into()).map_err(|_| SessionError::Closed)
    }

    pub fn send_message(&self, msg: &Message) -> Result<(), SessionError> {
        self.send(msg.to_string())
    }

    /// Ask both loops to stop. The first reason given is the one reported.
    pub fn shutdown(&self, reason: CloseReason) {
        self.shared.begin_close(reason);
    }

    pub fn state(&self) -> SessionState {
        self.shared.state.borrow().clone()
    }

    /// Wait until the read loop has stopped.
    pub async fn closed(&self) -> CloseReason {
        if let SessionState::Closed(reason) = self.state() {
            return reason;
        }
        let mut rx = self.shared.state.subscribe();
        match rx.wait_for(|state| matches!(state, SessionState::Closed(_))).await {
            Ok(state) => state.close_reason().cloned().unwrap_or(CloseReason::Requested),
            Err(_) => CloseReason::Requested,
        }
    }
}

/// A running session.
pub struct Session {
    handle: SessionHandle,
    reader: JoinHandle<()>,
    writer: JoinHandle<Result<(), CloseError>>,
    close_timeout: Duration,
}

impl Session {
    /// Connect to `endpoint` and start the session loops.
    pub async fn open(
        endpoint: &Endpoint,
        config: SessionConfig,
        registry: Arc<Registry>,
        bot: Arc<Bot>,
    ) -> Result<Self, ConnectionError> {
        let transport = Transport::connect(endpoint).await?;
        info!(endpoint = %endpoint, "connected");

        let span = spans::connection(&endpoint.to_string());
        Ok(span.in_scope(|| Self::start(transport, config, registry, bot)))
    }

    /// Start the session loops on an established transport.
    pub fn start(transport: Transport, config: SessionConfig, registry: Arc<Registry>, bot: Arc<Bot>) -> Self {
        let span = spans::session(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed));
        let (reader, mut writer) = transport.split();
        writer.set_max_line_len(config.max_line_len);

        let (tx, rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(SessionState::Open);
        let shared = Arc::new(Shared {
            state,
            reason: Mutex::new(None),
            cancel: CancellationToken::new(),
        });
        let handle = SessionHandle {
            tx,
            shared: Arc::clone(&shared),
        };

        let read_task = ReadLoop {
            reader,
            splitter: FrameSplitter::with_max_len(config.max_line_len),
            read_timeout: config.read_timeout,
            ctx: Context::new(handle.clone(), bot),
            registry,
            shared: Arc::clone(&shared),
        };
        let reader = tokio::spawn(read_task.run().instrument(span.clone()));
        let writer = tokio::spawn(write_loop(writer, rx, shared.cancel.clone()).instrument(span));

        Self {
            handle,
            reader,
            writer,
            close_timeout: config.close_timeout,
        }
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// Stop both loops, flushing what was already queued.
    ///
    /// Each loop gets `close_timeout` to stop before it is aborted.
    pub async fn close(self) -> Result<(), CloseError> {
        self.handle.shutdown(CloseReason::Requested);

        let mut writer = self.writer;
        let written = match tokio::time::timeout(self.close_timeout, &mut writer).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!(error = %e, "write loop panicked");
                Ok(())
            }
            Err(_) => {
                writer.abort();
                Err(CloseError::Timeout("write loop"))
            }
        };

        let mut reader = self.reader;
        if tokio::time::timeout(self.close_timeout, &mut reader).await.is_err() {
            reader.abort();
            self.handle.shared.finish();
            return written.and(Err(CloseError::Timeout("read loop")));
        }

        written
    }
}

struct ReadLoop {
    reader: TransportReader,
    splitter: FrameSplitter,
    read_timeout: Duration,
    ctx: Context,
    registry: Arc<Registry>,
    shared: Arc<Shared>,
}

impl ReadLoop {
    async fn run(mut self) {
        let reason = self.read_until_closed().await;
        if let Some(reason) = reason {
            info!(reason = %reason, "session closing");
            self.shared.begin_close(reason);
        }
        self.shared.finish();
        debug!("read loop stopped");
    }

    /// Returns `None` when stopped by cancellation.
    async fn read_until_closed(&mut self) -> Option<CloseReason> {
        let cancel = self.shared.cancel.clone();
        let mut transient = 0u32;

        loop {
            let read = tokio::select! {
                _ = cancel.cancelled() => return None,
                read = tokio::time::timeout(self.read_timeout, self.reader.read_chunk()) => read,
            };

            let chunk = match read {
                Err(_) => {
                    warn!(timeout = ?self.read_timeout, "no data within read timeout");
                    return Some(CloseReason::IdleTimeout);
                }
                Ok(Ok(Some(chunk))) => chunk,
                Ok(Ok(None)) => return Some(CloseReason::PeerClosed),
                Ok(Err(e)) if e.is_terminal() => {
                    warn!(error = %e, "read failed");
                    return Some(CloseReason::ReadFailed(e.to_string()));
                }
                Ok(Err(e)) => {
                    transient += 1;
                    if transient > MAX_TRANSIENT_ERRORS {
                        warn!(error = %e, count = transient, "too many read errors");
                        return Some(CloseReason::ReadFailed(e.to_string()));
                    }
                    debug!(error = %e, count = transient, "transient read error");
                    continue;
                }
            };

            transient = 0;
            for line in self.splitter.split(&chunk) {
                trace!(line = %line, "recv");
                let msg = parse(&line);
                self.ctx.bot.transcribe(&msg, &line);
                self.dispatch(msg);
            }
        }
    }

    fn dispatch(&self, msg: Message) {
        if !self.registry.contains(&msg.command) {
            return;
        }
        let registry = Arc::clone(&self.registry);
        let ctx = self.ctx.clone();
        tokio::spawn(
            async move {
                // Errors are logged by the registry
                let _ = registry.dispatch(&ctx, &msg).await;
            }
            .in_current_span(),
        );
    }
}

async fn write_loop(
    mut writer: TransportWriter,
    mut rx: mpsc::UnboundedReceiver<String>,
    cancel: CancellationToken,
) -> Result<(), CloseError> {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            line = rx.recv() => match line {
                Some(line) => write_one(&mut writer, &line).await,
                None => break,
            },
        }
    }

    rx.close();
    let mut drained = 0;
    while drained < DRAIN_LIMIT {
        let Ok(line) = rx.try_recv() else { break };
        write_one(&mut writer, &line).await;
        drained += 1;
    }

    let result = writer.close().await;
    debug!("write loop stopped");
    result
}

async fn write_one(writer: &mut TransportWriter, line: &str) {
    debug!(line = %redact(line), "send");
    if let Err(e) = writer.write_line(line).await {
        warn!(error = %e, line = %redact(line), "write failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{read_lines, start_session, start_session_with, test_bot};
    use kneiss_proto::DEFAULT_MAX_LINE_LEN;
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.read_timeout, Duration::from_secs(360));
        assert_eq!(config.close_timeout, Duration::from_secs(5));
        assert_eq!(config.max_line_len, DEFAULT_MAX_LINE_LEN);
    }

    #[test]
    fn test_close_reason_reconnect_policy() {
        assert!(!CloseReason::Requested.should_reconnect());
        assert!(CloseReason::PeerClosed.should_reconnect());
        assert!(CloseReason::IdleTimeout.should_reconnect());
        assert!(CloseReason::ReconnectRequested.should_reconnect());
        assert!(CloseReason::ReadFailed("reset".into()).should_reconnect());
    }

    #[tokio::test]
    async fn test_ping_is_answered() {
        let (_session, mut server) = start_session();

        server.write_all(b"PING :tmi.twitch.tv\r\n").await.unwrap();
        assert_eq!(read_lines(&mut server, 1).await, vec!["PONG :tmi.twitch.tv"]);
    }

    #[tokio::test]
    async fn test_fragmented_ping_is_answered() {
        let (_session, mut server) = start_session();

        server.write_all(b"PING :tmi.tw").await.unwrap();
        tokio::task::yield_now().await;
        server.write_all(b"itch.tv\r\nPING :second\r\n").await.unwrap();

        let mut lines = read_lines(&mut server, 2).await;
        lines.sort();
        assert_eq!(lines, vec!["PONG :second", "PONG :tmi.twitch.tv"]);
    }

    #[tokio::test]
    async fn test_lines_are_written_in_order() {
        let (session, mut server) = start_session();
        let handle = session.handle();

        for i in 0..50 {
            handle.send(format!("PRIVMSG #kneiss :{i}")).unwrap();
        }
        let lines = read_lines(&mut server, 50).await;
        for (i, line) in lines.iter().enumerate() {
            assert_eq!(line, &format!("PRIVMSG #kneiss :{i}"));
        }
    }

    #[tokio::test]
    async fn test_overlong_outbound_line_is_skipped() {
        let (session, mut server) = start_session();
        let handle = session.handle();

        handle.send("x".repeat(DEFAULT_MAX_LINE_LEN + 1)).unwrap();
        handle.send("PONG :tmi.twitch.tv").unwrap();
        assert_eq!(read_lines(&mut server, 1).await, vec!["PONG :tmi.twitch.tv"]);
    }

    #[tokio::test]
    async fn test_peer_close() {
        let (session, server) = start_session();
        drop(server);

        assert_eq!(session.handle().closed().await, CloseReason::PeerClosed);
        assert_eq!(
            session.handle().state(),
            SessionState::Closed(CloseReason::PeerClosed)
        );
        assert!(session.close().await.is_ok());
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        let (session, _server) = start_session();
        let handle = session.handle().clone();

        session.close().await.unwrap();
        assert_eq!(handle.state(), SessionState::Closed(CloseReason::Requested));
        assert_eq!(handle.send("PING"), Err(SessionError::Closed));
    }

    #[tokio::test]
    async fn test_close_while_parked_on_read() {
        let (session, _server) = start_session();

        let started = tokio::time::Instant::now();
        session.close().await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_close_flushes_queued_lines() {
        let (session, mut server) = start_session();

        session.handle().send("PART #kneiss").unwrap();
        session.close().await.unwrap();

        let mut received = String::new();
        server.read_to_string(&mut received).await.unwrap();
        assert_eq!(received, "PART #kneiss\r\n");
    }

    #[tokio::test]
    async fn test_close_with_busy_producer() {
        let (session, server) = start_session();
        let sink = tokio::spawn(async move {
            let (mut server, mut sink) = (server, tokio::io::sink());
            tokio::io::copy(&mut server, &mut sink).await
        });

        let handle = session.handle().clone();
        let producer = tokio::spawn(async move {
            let mut sent = 0u64;
            while handle.send("PRIVMSG #kneiss :spam").is_ok() {
                sent += 1;
                tokio::task::yield_now().await;
            }
            sent
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let started = std::time::Instant::now();
        session.close().await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(producer.await.unwrap() > 0);
        sink.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_first_shutdown_reason_wins() {
        let (session, _server) = start_session();
        let handle = session.handle();

        handle.shutdown(CloseReason::ReconnectRequested);
        handle.shutdown(CloseReason::Requested);
        assert_eq!(handle.closed().await, CloseReason::ReconnectRequested);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timeout() {
        let (client, _server) = duplex(1024);
        let config = SessionConfig {
            read_timeout: Duration::from_secs(30),
            ..SessionConfig::default()
        };
        let session = Session::start(
            Transport::stream(client),
            config,
            Arc::new(Registry::with_defaults()),
            test_bot(),
        );

        assert_eq!(session.handle().closed().await, CloseReason::IdleTimeout);
    }

    #[tokio::test]
    async fn test_reconnect_command_closes_session() {
        let (session, mut server) = start_session();

        server.write_all(b":tmi.twitch.tv RECONNECT\r\n").await.unwrap();
        assert_eq!(session.handle().closed().await, CloseReason::ReconnectRequested);
    }

    #[tokio::test]
    async fn test_connect_and_join_flow() {
        let bot = test_bot();
        let (session, mut server) = start_session_with(Arc::new(Registry::with_defaults()), bot.clone());
        let handle = session.handle().clone();

        let client = {
            let bot = bot.clone();
            let handle = handle.clone();
            tokio::spawn(async move {
                bot.connect(&handle).await?;
                bot.join(&handle, "kneiss").await
            })
        };

        assert_eq!(
            read_lines(&mut server, 2).await,
            vec!["PASS oauth:secret", "NICK kneissbot"]
        );
        server
            .write_all(
                b":tmi.twitch.tv 001 kneissbot :Welcome, GLHF!\r\n\
                  :tmi.twitch.tv 375 kneissbot :-\r\n\
                  :tmi.twitch.tv 376 kneissbot :>\r\n",
            )
            .await
            .unwrap();

        assert_eq!(read_lines(&mut server, 1).await, vec!["JOIN #kneiss"]);
        server
            .write_all(
                b":kneissbot!kneissbot@kneissbot.tmi.twitch.tv JOIN #kneiss\r\n\
                  :kneissbot.tmi.twitch.tv 353 kneissbot = #kneiss :kneissbot\r\n\
                  :kneissbot.tmi.twitch.tv 366 kneissbot #kneiss :End of /NAMES list\r\n",
            )
            .await
            .unwrap();

        client.await.unwrap().unwrap();
        assert_eq!(bot.joined_channels(), vec!["kneiss"]);
        session.close().await.unwrap();
    }
}
