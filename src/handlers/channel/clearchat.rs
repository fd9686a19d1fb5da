//! CLEARCHAT handler.
//!
//! Twitch sends `CLEARCHAT #channel :user` for bans and timeouts (the latter
//! carries a `ban-duration` tag) and a bare `CLEARCHAT #channel` when a
//! moderator clears the whole chat.

use async_trait::async_trait;
use kneiss_proto::Message;
use tracing::info;

use super::super::{Context, Handler, HandlerError, HandlerResult};

/// Handler for CLEARCHAT command.
pub struct ClearChatHandler;

#[async_trait]
impl Handler for ClearChatHandler {
    async fn handle(&self, ctx: &Context, msg: &Message) -> HandlerResult {
        let channel = msg.param(0).ok_or(HandlerError::MissingParam("channel"))?;
        let stats = ctx.bot.stats();

        let Some(user) = msg.param(1) else {
            stats.record_clear();
            info!(channel = %channel, "chat cleared");
            return Ok(());
        };

        match msg.tag("ban-duration").filter(|d| !d.is_empty()) {
            Some(duration) => {
                stats.record_timeout();
                info!(channel = %channel, user = %user, duration = %duration, "user timed out");
            }
            None => {
                stats.record_ban();
                info!(channel = %channel, user = %user, "user banned");
            }
        }
        Ok(())
    }
}
