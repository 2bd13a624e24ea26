//! Call State Tracker
//!
//! Last known control-plane state per call id, fed by callback notifications.
//! Scheduled actions can wait on a call reaching `established` instead of
//! sleeping a fixed delay.

use std::time::Duration;

use brivas_graph_sdk::CallState;
use dashmap::DashMap;
use tokio::sync::watch;
use tracing::debug;

/// Result of waiting for a call to become usable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Established,
    Terminated,
    TimedOut,
}

#[derive(Default)]
pub struct CallStateTracker {
    calls: DashMap<String, watch::Sender<CallState>>,
}

impl CallStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn channel(&self, call_id: &str) -> watch::Receiver<CallState> {
        self.calls
            .entry(call_id.to_string())
            .or_insert_with(|| watch::channel(CallState::Unknown).0)
            .subscribe()
    }

    /// Record a state reported by the platform
    pub fn observe(&self, call_id: &str, state: CallState) {
        debug!(call_id = %call_id, state = ?state, "Call state update");
        self.calls
            .entry(call_id.to_string())
            .or_insert_with(|| watch::channel(CallState::Unknown).0)
            .send_replace(state);
    }

    pub fn state(&self, call_id: &str) -> Option<CallState> {
        self.calls.get(call_id).map(|sender| *sender.borrow())
    }

    /// Drop the entry for a call that has ended
    pub fn forget(&self, call_id: &str) {
        self.calls.remove(call_id);
    }

    pub fn tracked(&self) -> usize {
        self.calls.len()
    }

    /// Wait until the call is established or ends, at most `timeout`
    ///
    /// A timed-out wait drops the entry unless another waiter still holds it.
    pub async fn wait_until_established(&self, call_id: &str, timeout: Duration) -> Readiness {
        // Receiver is taken before awaiting; no map guard is held across the wait
        let mut receiver = self.channel(call_id);

        let wait = receiver.wait_for(|state| state.is_established() || state.is_terminal());
        let readiness = match tokio::time::timeout(timeout, wait).await {
            Ok(Ok(state)) if state.is_established() => Readiness::Established,
            Ok(Ok(_)) => Readiness::Terminated,
            // Sender dropped: the call was forgotten after it ended
            Ok(Err(_)) => Readiness::Terminated,
            Err(_) => Readiness::TimedOut,
        };
        drop(receiver);

        if readiness == Readiness::TimedOut {
            self.calls
                .remove_if(call_id, |_, sender| sender.receiver_count() == 0);
        }
        readiness
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_wait_sees_established() {
        let tracker = Arc::new(CallStateTracker::new());
        tracker.observe("c1", CallState::Establishing);

        let waiter = {
            let tracker = Arc::clone(&tracker);
            tokio::spawn(async move {
                tracker
                    .wait_until_established("c1", Duration::from_secs(60))
                    .await
            })
        };

        tokio::time::sleep(Duration::from_secs(2)).await;
        tracker.observe("c1", CallState::Established);

        assert_eq!(waiter.await.unwrap(), Readiness::Established);
        assert_eq!(tracker.state("c1"), Some(CallState::Established));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_already_established() {
        let tracker = CallStateTracker::new();
        tracker.observe("c1", CallState::Established);

        let readiness = tracker
            .wait_until_established("c1", Duration::from_secs(1))
            .await;
        assert_eq!(readiness, Readiness::Established);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_sees_termination() {
        let tracker = Arc::new(CallStateTracker::new());

        let waiter = {
            let tracker = Arc::clone(&tracker);
            tokio::spawn(async move {
                tracker
                    .wait_until_established("c1", Duration::from_secs(60))
                    .await
            })
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        tracker.observe("c1", CallState::Terminated);
        tracker.forget("c1");

        assert_eq!(waiter.await.unwrap(), Readiness::Terminated);
        assert_eq!(tracker.tracked(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out() {
        let tracker = CallStateTracker::new();
        let readiness = tracker
            .wait_until_established("unknown-call", Duration::from_secs(5))
            .await;
        assert_eq!(readiness, Readiness::TimedOut);
        assert_eq!(tracker.tracked(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_wait_keeps_shared_entry() {
        let tracker = Arc::new(CallStateTracker::new());

        let patient = {
            let tracker = Arc::clone(&tracker);
            tokio::spawn(async move {
                tracker
                    .wait_until_established("c1", Duration::from_secs(60))
                    .await
            })
        };
        tokio::task::yield_now().await;

        let hasty = tracker
            .wait_until_established("c1", Duration::from_secs(1))
            .await;
        assert_eq!(hasty, Readiness::TimedOut);
        assert_eq!(tracker.tracked(), 1);

        tokio::time::sleep(Duration::from_secs(4)).await;
        tracker.observe("c1", CallState::Established);
        assert_eq!(patient.await.unwrap(), Readiness::Established);
    }
}
