//! Reconnect supervisor.
//!
//! Opens a session, logs in, requests capabilities and joins the configured
//! channels, then waits for the session to end or for shutdown. A session
//! that ends for any reason other than a requested close is replaced after an
//! exponential backoff.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context as _};
use kneiss_proto::{ConnectionError, Endpoint};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::session::{CloseReason, Session, SessionConfig};
use crate::bot::Bot;
use crate::config::{Config, ReconnectConfig};
use crate::error::HandshakeError;
use crate::handlers::Registry;

/// How one session ended.
#[derive(Debug)]
enum Outcome {
    /// Shutdown was requested; the session has been closed cleanly.
    Shutdown,
    /// The session ended after it was ready.
    Closed(CloseReason),
    /// The server refused the login; retrying will not help.
    Refused(HandshakeError),
}

/// Exponential backoff between reconnect attempts.
#[derive(Debug)]
struct Backoff {
    initial: Duration,
    max: Duration,
    max_attempts: u32,
    attempt: u32,
}

impl Backoff {
    fn new(config: &ReconnectConfig) -> Self {
        Self {
            initial: Duration::from_secs(config.initial_backoff_secs),
            max: Duration::from_secs(config.max_backoff_secs),
            max_attempts: config.max_attempts,
            attempt: 0,
        }
    }

    /// Delay before the next attempt, or `None` once attempts are used up.
    fn next_delay(&mut self) -> Option<Duration> {
        if self.max_attempts > 0 && self.attempt >= self.max_attempts {
            return None;
        }
        let factor = 1u32.checked_shl(self.attempt).unwrap_or(u32::MAX);
        let delay = self.initial.saturating_mul(factor).min(self.max);
        self.attempt += 1;
        Some(delay)
    }

    fn reset(&mut self) {
        self.attempt = 0;
    }
}

/// Keeps the bot connected.
pub struct Connector {
    endpoint: Endpoint,
    session_config: SessionConfig,
    reconnect: ReconnectConfig,
    channels: Vec<String>,
    registry: Arc<Registry>,
    bot: Arc<Bot>,
}

impl Connector {
    pub fn new(config: &Config, registry: Arc<Registry>, bot: Arc<Bot>) -> Result<Self, ConnectionError> {
        Ok(Self {
            endpoint: config.connection.endpoint()?,
            session_config: SessionConfig::from(&config.connection),
            reconnect: config.reconnect.clone(),
            channels: config.twitch.channels(),
            registry,
            bot,
        })
    }

    /// Run until Ctrl-C, or until reconnecting is disabled or exhausted.
    pub async fn run(&self) -> anyhow::Result<()> {
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl-C received, shutting down");
                token.cancel();
            }
        });
        self.run_until(shutdown).await
    }

    /// Run until `shutdown` is cancelled.
    pub async fn run_until(&self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let mut backoff = Backoff::new(&self.reconnect);

        loop {
            match self.run_once(&shutdown).await {
                Ok(Outcome::Shutdown) => return Ok(()),
                Ok(Outcome::Refused(e)) => {
                    error!(error = %e, "login refused");
                    return Err(e).context("login refused");
                }
                Ok(Outcome::Closed(reason)) => {
                    if !reason.should_reconnect() {
                        return Ok(());
                    }
                    backoff.reset();
                    warn!(reason = %reason, "session ended");
                }
                Err(e) => warn!(error = %format!("{e:#}"), "session failed"),
            }

            if !self.reconnect.enabled {
                bail!("connection lost and reconnect is disabled");
            }
            let Some(delay) = backoff.next_delay() else {
                bail!("giving up after {} reconnect attempts", backoff.attempt);
            };
            info!(delay = ?delay, attempt = backoff.attempt, "reconnecting");
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.cancelled() => return Ok(()),
            }
        }
    }

    async fn run_once(&self, shutdown: &CancellationToken) -> anyhow::Result<Outcome> {
        self.bot.reset();
        let session = Session::open(
            &self.endpoint,
            self.session_config.clone(),
            Arc::clone(&self.registry),
            Arc::clone(&self.bot),
        )
        .await
        .with_context(|| format!("failed to connect to {}", self.endpoint))?;

        self.drive(session, shutdown).await
    }

    /// Log in, join and wait on an open session.
    async fn drive(&self, session: Session, shutdown: &CancellationToken) -> anyhow::Result<Outcome> {
        let handle = session.handle().clone();

        let ready = async {
            self.bot.connect(&handle).await?;
            self.bot.request_capabilities(&handle)?;
            for channel in &self.channels {
                match self.bot.join(&handle, channel).await {
                    Ok(()) => {}
                    Err(e @ HandshakeError::SessionClosed(_)) => return Err(e),
                    Err(e) => warn!(channel = %channel, error = %e, "join failed"),
                }
            }
            Ok::<_, HandshakeError>(())
        };

        tokio::select! {
            res = ready => match res {
                Ok(()) => {}
                Err(e) => {
                    close_quietly(session).await;
                    if e.is_rejection() {
                        return Ok(Outcome::Refused(e));
                    }
                    return Err(e).context("handshake failed");
                }
            },
            _ = shutdown.cancelled() => {
                session.close().await?;
                return Ok(Outcome::Shutdown);
            }
        }

        info!(
            nick = %self.bot.identity().username,
            channels = ?self.bot.joined_channels(),
            "ready"
        );

        tokio::select! {
            reason = handle.closed() => {
                close_quietly(session).await;
                Ok(Outcome::Closed(reason))
            }
            _ = shutdown.cancelled() => {
                for channel in self.bot.joined_channels() {
                    if let Err(e) = self.bot.part(&handle, &channel) {
                        warn!(channel = %channel, error = %e, "part failed");
                    }
                }
                session.close().await?;
                Ok(Outcome::Shutdown)
            }
        }
    }
}

async fn close_quietly(session: Session) {
    if let Err(e) = session.close().await {
        warn!(error = %e, "session close failed");
    }
}
