//! Handler context and the handler trait.

use std::sync::Arc;

use async_trait::async_trait;
use kneiss_proto::Message;

use crate::bot::Bot;
use crate::network::SessionHandle;

pub use crate::error::HandlerError;

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;

/// What a handler gets to work with.
///
/// Owned so that each dispatched message can run on its own task.
#[derive(Clone)]
pub struct Context {
    /// Outbound queue and lifecycle of the session the message arrived on.
    pub session: SessionHandle,
    /// Bot state shared across sessions.
    pub bot: Arc<Bot>,
}

impl Context {
    pub fn new(session: SessionHandle, bot: Arc<Bot>) -> Self {
        Self { session, bot }
    }
}

/// Command handler trait.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: &Context, msg: &Message) -> HandlerResult;
}
