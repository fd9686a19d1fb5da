//! kneissbot - Twitch chat bot
//!
//! An async IRCv3 chat client built on the `kneiss-proto` protocol crate.

mod bot;
mod config;
mod error;
mod handlers;
mod handshake;
mod network;
mod telemetry;
mod transcript;
#[cfg(test)]
mod testing;

use crate::bot::Bot;
use crate::config::{Config, DEFAULT_CONFIG_PATH};
use crate::handlers::Registry;
use crate::network::Connector;
use crate::transcript::Transcript;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(
        username = %config.twitch.username,
        endpoint = %config.connection.endpoint,
        channels = ?config.twitch.channels(),
        "Starting kneissbot"
    );

    let mut bot = Bot::from_config(&config);
    if config.transcript.enabled {
        info!(dir = %config.transcript.dir.display(), "Recording transcripts");
        bot = bot.with_transcript(Transcript::spawn(&config.transcript.dir));
    }
    let bot = Arc::new(bot);
    let registry = Arc::new(Registry::with_defaults());
    let connector = Connector::new(&config, Arc::clone(&registry), Arc::clone(&bot))?;

    let result = connector.run().await;
    if let Some(transcript) = bot.transcript() {
        transcript.flush().await;
    }

    let stats = bot.stats().snapshot();
    info!(
        messages = stats.messages,
        bans = stats.bans,
        timeouts = stats.timeouts,
        clears = stats.clears,
        notices = stats.notices,
        commands = ?registry.command_stats(),
        "kneissbot stopped"
    );
    result
}
