//! CLI command modules.

pub mod channel;
pub mod watch;
