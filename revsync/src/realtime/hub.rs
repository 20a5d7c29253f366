//! In-process fan-out of realtime frames.

use tokio::sync::broadcast::{self, error::RecvError};

use super::RealtimeFrame;

/// Default number of frames buffered per subscriber.
pub const DEFAULT_CAPACITY: usize = 256;

/// Distributes frames from one transport to any number of conversations.
///
/// The transport owner feeds raw text frames in with [`dispatch_raw`] and
/// reports reconnects with [`reconnected`].
///
/// [`dispatch_raw`]: RealtimeHub::dispatch_raw
/// [`reconnected`]: RealtimeHub::reconnected
#[derive(Debug, Clone)]
pub struct RealtimeHub {
    tx: broadcast::Sender<RealtimeFrame>,
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl RealtimeHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Open a new subscription. Only frames dispatched afterwards are seen.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Publish a decoded frame. Returns the number of subscribers reached.
    pub fn dispatch(&self, frame: RealtimeFrame) -> usize {
        self.tx.send(frame).unwrap_or(0)
    }

    /// Decode and publish a text frame. Malformed frames are logged and dropped.
    pub fn dispatch_raw(&self, text: &str) -> bool {
        match RealtimeFrame::parse(text) {
            Ok(RealtimeFrame::Unknown) => {
                log::trace!("Ignoring unhandled frame type");
                false
            }
            Ok(frame) => {
                self.dispatch(frame);
                true
            }
            Err(e) => {
                log::warn!("Dropping malformed realtime frame: {}", e);
                false
            }
        }
    }

    /// Tell subscribers the connection was re-established.
    pub fn reconnected(&self) {
        log::debug!("Realtime transport reconnected");
        self.dispatch(RealtimeFrame::Reconnected);
    }
}

/// A subscriber's end of the hub.
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<RealtimeFrame>,
}

impl Subscription {
    /// Wait for the next frame. `None` once the hub is gone.
    ///
    /// A subscriber that fell behind receives [`RealtimeFrame::Reconnected`]
    /// in place of the frames it missed.
    pub async fn recv(&mut self) -> Option<RealtimeFrame> {
        match self.rx.recv().await {
            Ok(frame) => Some(frame),
            Err(RecvError::Lagged(missed)) => {
                log::warn!("Realtime subscriber lagged, {} frames missed", missed);
                Some(RealtimeFrame::Reconnected)
            }
            Err(RecvError::Closed) => None,
        }
    }
}
