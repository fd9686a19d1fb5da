//! Command handler registry and dispatch.
//!
//! The `Registry` maps commands to handlers and counts how often each one
//! ran. It is built once at startup and shared by every session.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use kneiss_proto::Message;
use tracing::{Instrument, Level, debug, span};

use super::context::{Context, Handler, HandlerResult};
use crate::handlers::{
    channel::{ClearChatHandler, EndOfNamesHandler},
    connection::{CapHandler, EndOfMotdHandler, PingHandler, ReconnectHandler, WelcomeHandler},
    messaging::{NoticeHandler, PrivmsgHandler},
};

/// Registry of command handlers.
pub struct Registry {
    handlers: HashMap<&'static str, Box<dyn Handler>>,
    command_counts: HashMap<&'static str, AtomicU64>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            command_counts: HashMap::new(),
        }
    }

    /// Create a registry with the bot's handlers registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        // Connection
        registry.register("PING", PingHandler);
        registry.register("001", WelcomeHandler);
        registry.register("376", EndOfMotdHandler);
        registry.register("CAP", CapHandler);
        registry.register("RECONNECT", ReconnectHandler);

        // Channel
        registry.register("366", EndOfNamesHandler);
        registry.register("CLEARCHAT", ClearChatHandler);

        // Messaging
        registry.register("PRIVMSG", PrivmsgHandler);
        registry.register("NOTICE", NoticeHandler);

        registry
    }

    /// Map `command` to `handler`, replacing any earlier mapping.
    pub fn register<H: Handler + 'static>(&mut self, command: &'static str, handler: H) {
        self.handlers.insert(command, Box::new(handler));
        self.command_counts.entry(command).or_default();
    }

    pub fn contains(&self, command: &str) -> bool {
        self.handlers.contains_key(command)
    }

    /// Run the handler for `msg.command`, if there is one.
    ///
    /// Unmapped and empty commands are a no-op.
    pub async fn dispatch(&self, ctx: &Context, msg: &Message) -> HandlerResult {
        let cmd_name = msg.command.as_str();
        let Some(handler) = self.handlers.get(cmd_name) else {
            return Ok(());
        };

        if let Some(counter) = self.command_counts.get(cmd_name) {
            counter.fetch_add(1, Ordering::Relaxed);
        }

        let channel = msg
            .params
            .iter()
            .find(|p| p.starts_with('#'))
            .map(String::as_str);
        let irc_span = span!(
            Level::DEBUG,
            "irc.command",
            command = %cmd_name,
            channel = channel,
            source = msg.nick(),
        );

        let result = handler.handle(ctx, msg).instrument(irc_span).await;
        if let Err(ref e) = result {
            debug!(command = %cmd_name, error = %e, code = e.error_code(), "Command error");
        }
        result
    }

    /// Get command usage statistics, most used first.
    pub fn command_stats(&self) -> Vec<(&'static str, u64)> {
        let mut stats: Vec<_> = self
            .command_counts
            .iter()
            .map(|(cmd, count)| (*cmd, count.load(Ordering::Relaxed)))
            .filter(|(_, count)| *count > 0)
            .collect();
        stats.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        stats
    }
}
