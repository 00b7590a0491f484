//! redleaf - Redis data types on an embedded ordered key-value store
//!
//! Configuration, reply formatting and the command session used by the
//! `redleaf` binary.

pub mod config;
pub mod format;
pub mod session;

pub use config::{Config, ConfigError, Engine};
pub use session::Session;
