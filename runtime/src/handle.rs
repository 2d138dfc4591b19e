//! Settlement tracking for one dispatched action.

use crate::StoreError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Waits for an action's effects to settle.
///
/// Returned by [`crate::Store::send`]. Feedback actions inherit the tracker of
/// the action whose effect produced them, so the handle covers the whole
/// cascade (fetch, result action, follow-up delay).
#[derive(Clone)]
pub struct EffectHandle {
    in_flight: watch::Receiver<usize>,
}

impl EffectHandle {
    pub(crate) fn new() -> (Self, Tracker) {
        let (tx, rx) = watch::channel(0);
        (Self { in_flight: rx }, Tracker(Arc::new(tx)))
    }

    pub(crate) fn into_receiver(self) -> watch::Receiver<usize> {
        self.in_flight
    }

    /// A handle with nothing to wait for.
    #[must_use]
    pub fn completed() -> Self {
        Self::new().0
    }

    /// Number of effects still running.
    #[must_use]
    pub fn pending(&self) -> usize {
        *self.in_flight.borrow()
    }

    /// Wait until no effect of the cascade is running.
    pub async fn wait(&mut self) {
        // A closed channel means every tracker is gone, so nothing is running.
        let _ = self.in_flight.wait_for(|count| *count == 0).await;
    }

    /// [`EffectHandle::wait`] bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires first.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending", &self.pending())
            .finish()
    }
}

/// Write side of an [`EffectHandle`], carried into every spawned effect.
#[derive(Clone)]
pub(crate) struct Tracker(Arc<watch::Sender<usize>>);

impl Tracker {
    /// Count one more running effect. The returned guard un-counts it on drop,
    /// including when the effect panics.
    pub(crate) fn start(&self) -> Running {
        self.0.send_modify(|count| *count += 1);
        Running(self.clone())
    }
}

pub(crate) struct Running(Tracker);

impl Drop for Running {
    fn drop(&mut self) {
        (self.0).0.send_modify(|count| *count = count.saturating_sub(1));
    }
}
