//! NOTICE handler.
//!
//! Twitch reports login and join failures as notices. A notice addressed to
//! `*` while logging in means the credentials were refused; a notice for a
//! channel with a join-failure `msg-id` means the join was refused.

use async_trait::async_trait;
use kneiss_proto::Message;
use tracing::{info, warn};

use super::super::{Context, Handler, HandlerResult};
use crate::handshake::{HandshakeKey, HandshakeOutcome, HandshakeState};

/// `msg-id` values that mean a JOIN was refused.
const JOIN_FAILURES: &[&str] = &[
    "msg_channel_suspended",
    "msg_banned",
    "msg_room_not_found",
    "tos_ban",
];

/// Handler for NOTICE command.
pub struct NoticeHandler;

#[async_trait]
impl Handler for NoticeHandler {
    async fn handle(&self, ctx: &Context, msg: &Message) -> HandlerResult {
        let target = msg.param(0).unwrap_or("");
        let text = msg.trailing().unwrap_or("");
        let msg_id = msg.tag("msg-id");
        let handshakes = ctx.bot.handshakes();
        ctx.bot.stats().record_notice();

        if target == "*" && handshakes.state(&HandshakeKey::Connect) == HandshakeState::Awaiting {
            warn!(text = %text, "login refused");
            handshakes.complete(&HandshakeKey::Connect, HandshakeOutcome::Rejected(text.to_string()));
            return Ok(());
        }

        if target.starts_with('#')
            && let Some(id) = msg_id
            && JOIN_FAILURES.contains(&id)
        {
            warn!(channel = %target, msg_id = %id, text = %text, "join refused");
            handshakes.complete(
                &HandshakeKey::join(target),
                HandshakeOutcome::Rejected(format!("{id}: {text}")),
            );
            return Ok(());
        }

        info!(target = %target, msg_id = msg_id, text = %text, "notice");
        Ok(())
    }
}
