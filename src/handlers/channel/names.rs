//! RPL_ENDOFNAMES handler.

use async_trait::async_trait;
use kneiss_proto::Message;

use super::super::{Context, Handler, HandlerError, HandlerResult};
use crate::handshake::{HandshakeKey, HandshakeOutcome};

/// Handler for RPL_ENDOFNAMES (366). Completes the join handshake for the
/// channel it names.
pub struct EndOfNamesHandler;

#[async_trait]
impl Handler for EndOfNamesHandler {
    async fn handle(&self, ctx: &Context, msg: &Message) -> HandlerResult {
        // :server 366 <nick> <#channel> :End of /NAMES list
        let channel = msg.param(1).ok_or(HandlerError::MissingParam("channel"))?;
        ctx.bot
            .handshakes()
            .complete(&HandshakeKey::join(channel), HandshakeOutcome::Complete);
        Ok(())
    }
}
