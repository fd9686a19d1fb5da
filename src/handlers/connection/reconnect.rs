//! RECONNECT handler.
//!
//! Twitch sends `RECONNECT` before restarting a chat server. The session is
//! shut down with a reason the connector treats as "connect again".

use async_trait::async_trait;
use kneiss_proto::Message;
use tracing::info;

use super::super::{Context, Handler, HandlerResult};
use crate::network::CloseReason;

/// Handler for RECONNECT command.
pub struct ReconnectHandler;

#[async_trait]
impl Handler for ReconnectHandler {
    async fn handle(&self, ctx: &Context, _msg: &Message) -> HandlerResult {
        info!("server requested reconnect");
        ctx.session.shutdown(CloseReason::ReconnectRequested);
        Ok(())
    }
}
