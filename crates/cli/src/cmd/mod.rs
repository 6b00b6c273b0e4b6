//! CLI command implementations

pub mod config;
pub mod preview;
pub mod watch;
