//! Chat command handlers.
//!
//! This module contains the Handler trait and command registry for dispatching
//! incoming chat messages to the appropriate handlers. Each inbound message is
//! dispatched on its own task with an owned [`Context`].

mod channel;
mod connection;
mod core;
mod messaging;

pub use self::core::{Context, Handler, HandlerError, HandlerResult, Registry};
