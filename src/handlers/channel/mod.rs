//! Channel handlers: join completion and moderation events.

mod clearchat;
mod names;

pub use clearchat::ClearChatHandler;
pub use names::EndOfNamesHandler;
