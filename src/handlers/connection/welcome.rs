//! Login replies and capability acknowledgements.

use async_trait::async_trait;
use kneiss_proto::Message;
use tracing::{info, warn};

use super::super::{Context, Handler, HandlerResult};
use crate::handshake::{HandshakeKey, HandshakeOutcome};

/// Handler for RPL_WELCOME (001).
pub struct WelcomeHandler;

#[async_trait]
impl Handler for WelcomeHandler {
    async fn handle(&self, _ctx: &Context, msg: &Message) -> HandlerResult {
        info!(
            nick = msg.param(0).unwrap_or("*"),
            text = msg.trailing().unwrap_or(""),
            "welcome"
        );
        Ok(())
    }
}

/// Handler for RPL_ENDOFMOTD (376). Completes the connect handshake.
pub struct EndOfMotdHandler;

#[async_trait]
impl Handler for EndOfMotdHandler {
    async fn handle(&self, ctx: &Context, _msg: &Message) -> HandlerResult {
        ctx.bot
            .handshakes()
            .complete(&HandshakeKey::Connect, HandshakeOutcome::Complete);
        Ok(())
    }
}

/// Handler for CAP replies.
pub struct CapHandler;

#[async_trait]
impl Handler for CapHandler {
    async fn handle(&self, _ctx: &Context, msg: &Message) -> HandlerResult {
        // CAP * ACK :twitch.tv/tags
        let subcommand = msg.param(1).unwrap_or("");
        let caps = msg.param(2).unwrap_or("");
        match subcommand {
            "ACK" => info!(caps = %caps, "capabilities acknowledged"),
            "NAK" => warn!(caps = %caps, "capabilities refused"),
            other => info!(subcommand = %other, caps = %caps, "CAP reply"),
        }
        Ok(())
    }
}
