//! Core handler infrastructure: the handler trait, its context and the
//! command registry.

pub mod context;
pub mod registry;

pub use context::{Context, Handler, HandlerError, HandlerResult};
pub use registry::Registry;
