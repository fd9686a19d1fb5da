//! PING handler.

use async_trait::async_trait;
use kneiss_proto::Message;

use super::super::{Context, Handler, HandlerResult};

/// Server used in the PONG when the PING names none.
const DEFAULT_SERVER: &str = "tmi.twitch.tv";

/// Handler for PING command.
pub struct PingHandler;

#[async_trait]
impl Handler for PingHandler {
    async fn handle(&self, ctx: &Context, msg: &Message) -> HandlerResult {
        // PING :<server>
        let server = msg.param(0).filter(|s| !s.is_empty()).unwrap_or(DEFAULT_SERVER);
        ctx.session.send_message(&Message::pong(server))?;
        Ok(())
    }
}
