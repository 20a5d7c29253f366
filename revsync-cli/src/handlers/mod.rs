//! Handlers that talk to the chat service and return displayable results.

pub mod channel;
