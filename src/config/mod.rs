//! Configuration loading and management.
//!
//! - [`types`]: config structs and [`Config::load`]
//! - [`defaults`]: serde default functions
//! - [`validation`]: startup checks

mod defaults;
mod types;
mod validation;

pub use defaults::DEFAULT_CONFIG_PATH;
pub use types::{Config, ConnectionConfig, ReconnectConfig};
