//! Network module.
//!
//! Contains the transport [`Session`] and the reconnecting [`Connector`].

mod connector;
mod session;

pub use connector::Connector;
pub use session::{CloseReason, Session, SessionConfig, SessionHandle};
