//! Debounced read acknowledgement.

use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;

use crate::{
    models::{ChannelId, MessageId},
    service::ChatService,
};

/// Quiet period before an acknowledgement is sent.
pub const ACK_DELAY: Duration = Duration::from_secs(1);

/// Sends at most one acknowledgement per burst of new messages.
///
/// Each [`schedule`](AckDebouncer::schedule) restarts the timer, so only the
/// last message of a burst is acknowledged. Failures are logged, not retried.
#[derive(Debug)]
pub struct AckDebouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Default for AckDebouncer {
    fn default() -> Self {
        Self::new(ACK_DELAY)
    }
}

impl AckDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// (Re)start the timer for acknowledging `message`.
    pub fn schedule(
        &mut self,
        service: Arc<dyn ChatService>,
        channel: ChannelId,
        message: MessageId,
    ) {
        if self.cancel() {
            log::debug!("Restarting acknowledgement timer for {}", channel);
        }

        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match service.acknowledge(&channel, &message).await {
                Ok(()) => log::debug!("Acknowledged {} up to {}", channel, message),
                Err(e) => log::warn!("Failed to acknowledge {} up to {}: {}", channel, message, e),
            }
        }));
    }

    /// Abort a pending acknowledgement. Returns `true` if one was pending.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for AckDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockService;

    #[tokio::test(start_paused = true)]
    async fn test_burst_sends_one_ack_for_last_message() {
        let service = Arc::new(MockService::new());
        let mut acks = AckDebouncer::default();

        for id in ["M1", "M2", "M3"] {
            acks.schedule(service.clone(), "C1".into(), id.into());
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        assert!(service.acks().is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(
            service.acks(),
            vec![(ChannelId::new("C1"), MessageId::new("M3"))]
        );
        assert!(!acks.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_messages_each_acked() {
        let service = Arc::new(MockService::new());
        let mut acks = AckDebouncer::default();

        acks.schedule(service.clone(), "C1".into(), "M1".into());
        tokio::time::sleep(Duration::from_millis(1500)).await;
        acks.schedule(service.clone(), "C1".into(), "M2".into());
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(service.acks().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_ack() {
        let service = Arc::new(MockService::new());
        let mut acks = AckDebouncer::default();

        acks.schedule(service.clone(), "C1".into(), "M1".into());
        assert!(acks.is_pending());
        assert!(acks.cancel());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(service.acks().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_ack_is_dropped() {
        let service = Arc::new(MockService::new());
        service.fail_acks();
        let mut acks = AckDebouncer::default();

        acks.schedule(service.clone(), "C1".into(), "M1".into());
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(service.acks().len(), 1);
        assert!(!acks.is_pending());
    }
}
