//! Connection lifecycle handlers: keepalive, login replies, capabilities and
//! server-requested reconnects.

mod ping;
mod reconnect;
mod welcome;

pub use ping::PingHandler;
pub use reconnect::ReconnectHandler;
pub use welcome::{CapHandler, EndOfMotdHandler, WelcomeHandler};
