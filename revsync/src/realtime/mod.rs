//! Realtime event stream.

mod frames;
mod hub;

pub use frames::RealtimeFrame;
pub use hub::{RealtimeHub, Subscription, DEFAULT_CAPACITY};
