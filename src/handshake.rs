//! Handshake coordination between callers and the read loop.
//!
//! A caller that needs a specific reply (the end of the MOTD after login, the
//! end of NAMES after a join) registers a single-use waiter keyed by what it
//! waits for, then sends its request. The handler that sees the reply
//! completes the waiter for that key. Waiters for different keys can never
//! observe each other's replies, and completing one never blocks.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use kneiss_proto::Message;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::error::HandshakeError;
use crate::network::SessionHandle;

/// What a waiter is waiting for.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum HandshakeKey {
    /// Login, completed by `376`.
    Connect,
    /// Joining a channel, completed by `366`. Holds the normalized name.
    Join(String),
}

impl HandshakeKey {
    /// Key for joining `channel`, with or without its leading `#`.
    pub fn join(channel: &str) -> Self {
        Self::Join(channel_name(channel))
    }
}

impl fmt::Display for HandshakeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => f.write_str("connect"),
            Self::Join(channel) => write!(f, "join #{channel}"),
        }
    }
}

/// Lowercase channel name without the leading `#`.
pub fn channel_name(channel: &str) -> String {
    channel.trim_start_matches('#').to_ascii_lowercase()
}

/// How the server answered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandshakeOutcome {
    Complete,
    Rejected(String),
}

/// Progress of one handshake key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandshakeState {
    Idle,
    Awaiting,
    Complete,
}

struct Waiter {
    id: u64,
    tx: oneshot::Sender<HandshakeOutcome>,
}

#[derive(Default)]
struct Inner {
    pending: HashMap<HandshakeKey, Waiter>,
    complete: HashSet<HandshakeKey>,
}

/// Keyed handshake waiters for one bot.
pub struct Handshakes {
    inner: Mutex<Inner>,
    next_id: AtomicU64,
    timeout: Duration,
}

impl Handshakes {
    /// Create an empty set of waiters. `timeout` bounds every [`Pending::wait`].
    pub fn new(timeout: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            next_id: AtomicU64::new(1),
            timeout,
        }
    }

    /// Register a waiter for `key`.
    ///
    /// The waiter is removed again when the returned guard drops, whether or
    /// not it was completed.
    pub fn register(&self, key: HandshakeKey) -> Result<Pending<'_>, HandshakeError> {
        let mut inner = self.inner.lock();
        if inner.pending.contains_key(&key) {
            return Err(HandshakeError::AlreadyPending(key));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        inner.complete.remove(&key);
        inner.pending.insert(key.clone(), Waiter { id, tx });

        Ok(Pending {
            owner: self,
            key,
            id,
            rx,
        })
    }

    /// Resolve the waiter for `key`. Returns whether one was waiting.
    pub fn complete(&self, key: &HandshakeKey, outcome: HandshakeOutcome) -> bool {
        let mut inner = self.inner.lock();
        let Some(waiter) = inner.pending.remove(key) else {
            return false;
        };
        if outcome == HandshakeOutcome::Complete {
            inner.complete.insert(key.clone());
        }
        drop(inner);

        waiter.tx.send(outcome).is_ok()
    }

    /// Current progress for `key`. A key that was never registered, or was
    /// rejected or abandoned, is [`HandshakeState::Idle`].
    pub fn state(&self, key: &HandshakeKey) -> HandshakeState {
        let inner = self.inner.lock();
        if inner.pending.contains_key(key) {
            HandshakeState::Awaiting
        } else if inner.complete.contains(key) {
            HandshakeState::Complete
        } else {
            HandshakeState::Idle
        }
    }

    /// Forget a completed handshake, e.g. after leaving a channel.
    pub fn reset(&self, key: &HandshakeKey) {
        self.inner.lock().complete.remove(key);
    }

    /// Drop every waiter and completion. Pending waits fail with
    /// [`HandshakeError::SessionClosed`].
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.pending.clear();
        inner.complete.clear();
    }

    /// Log in with `PASS` and `NICK` and wait for the end of the MOTD.
    pub async fn connect(
        &self,
        session: &SessionHandle,
        nick: &str,
        token: &str,
    ) -> Result<(), HandshakeError> {
        let pending = self.register(HandshakeKey::Connect)?;
        session.send_message(&Message::pass(oauth_password(token)))?;
        session.send_message(&Message::nick_cmd(nick))?;
        pending.wait(session).await?;
        info!(nick = %nick, "logged in");
        Ok(())
    }

    /// Join a channel and wait for the end of its NAMES list.
    pub async fn join(&self, session: &SessionHandle, channel: &str) -> Result<(), HandshakeError> {
        let key = HandshakeKey::join(channel);
        let target = format!("#{}", channel_name(channel));
        let pending = self.register(key)?;
        session.send_message(&Message::join(target.as_str()))?;
        pending.wait(session).await?;
        info!(channel = %target, "joined");
        Ok(())
    }
}

/// `PASS` argument for a token, adding `oauth:` unless already there.
fn oauth_password(token: &str) -> String {
    if token.starts_with("oauth:") {
        token.to_string()
    } else {
        format!("oauth:{token}")
    }
}

/// A registered waiter.
pub struct Pending<'a> {
    owner: &'a Handshakes,
    key: HandshakeKey,
    id: u64,
    rx: oneshot::Receiver<HandshakeOutcome>,
}

impl Pending<'_> {
    /// Wait for the outcome, bounded by the handshake timeout and by the
    /// session staying open.
    pub async fn wait(mut self, session: &SessionHandle) -> Result<(), HandshakeError> {
        let after = self.owner.timeout;
        let outcome = tokio::select! {
            res = tokio::time::timeout(after, &mut self.rx) => match res {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(_)) => return Err(HandshakeError::SessionClosed(self.key.clone())),
                Err(_) => {
                    debug!(key = %self.key, "handshake timed out");
                    return Err(HandshakeError::Timeout { key: self.key.clone(), after });
                }
            },
            _ = session.closed() => return Err(HandshakeError::SessionClosed(self.key.clone())),
        };

        match outcome {
            HandshakeOutcome::Complete => Ok(()),
            HandshakeOutcome::Rejected(reason) => Err(HandshakeError::Rejected {
                key: self.key.clone(),
                reason,
            }),
        }
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        let mut inner = self.owner.inner.lock();
        if inner.pending.get(&self.key).is_some_and(|w| w.id == self.id) {
            inner.pending.remove(&self.key);
        }
    }
}
