//! PRIVMSG handler: message counting and `!command` replies.

use async_trait::async_trait;
use kneiss_proto::Message;
use tracing::debug;

use super::super::{Context, Handler, HandlerError, HandlerResult};

/// Handler for PRIVMSG command.
pub struct PrivmsgHandler;

#[async_trait]
impl Handler for PrivmsgHandler {
    async fn handle(&self, ctx: &Context, msg: &Message) -> HandlerResult {
        // PRIVMSG <#channel> :<text>
        if msg.params.len() < 2 {
            return Err(HandlerError::MissingParam("text"));
        }
        let channel = msg.params[0].as_str();
        let text = msg.params[1].as_str();
        ctx.bot.stats().record_message();

        if !channel.starts_with('#') {
            return Ok(());
        }
        let Some(command) = parse_command(text) else {
            return Ok(());
        };
        if let Some(reply) = ctx.bot.command_reply(command) {
            debug!(command = %command, user = msg.nick().unwrap_or(""), "chat command");
            ctx.bot.privmsg(&ctx.session, channel, reply)?;
        }
        Ok(())
    }
}

/// The `word` of a message starting with `!word`.
fn parse_command(text: &str) -> Option<&str> {
    let rest = text.strip_prefix('!')?;
    let end = rest
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    (end > 0).then(|| &rest[..end])
}
