//! The Store: state owner and effect executor for one reducer.

use crate::StoreError;
use crate::handle::{EffectHandle, Tracker};
use busdesk_core::{effect::Effect, reducer::Reducer};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, broadcast};

/// Default capacity of the feedback broadcast channel.
const FEEDBACK_CAPACITY: usize = 16;

/// Store-wide bookkeeping shared by every clone.
struct Lifecycle {
    closing: AtomicBool,
    /// Counts every running effect regardless of which send spawned it.
    running: Tracker,
    running_rx: tokio::sync::watch::Receiver<usize>,
}

impl Lifecycle {
    fn new() -> Self {
        let (handle, running) = EffectHandle::new();
        Self {
            closing: AtomicBool::new(false),
            running,
            running_rx: handle.into_receiver(),
        }
    }
}

/// Runtime for one reducer.
///
/// Cloning is cheap and every clone drives the same state. Reducer calls are
/// serialised by the state's write lock; effects run concurrently on tokio.
pub struct Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    state: Arc<RwLock<S>>,
    reducer: R,
    environment: E,
    lifecycle: Arc<Lifecycle>,
    /// Actions produced by effects, published before they are reduced
    feedback: broadcast::Sender<A>,
}

impl<S, A, E, R> Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
    A: Send + Clone + 'static,
    S: Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Store with `initial_state`, ready to accept actions.
    #[must_use]
    pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
        Self::with_broadcast_capacity(initial_state, reducer, environment, FEEDBACK_CAPACITY)
    }

    /// Store whose feedback channel buffers `capacity` actions per observer.
    #[must_use]
    pub fn with_broadcast_capacity(
        initial_state: S,
        reducer: R,
        environment: E,
        capacity: usize,
    ) -> Self {
        let (feedback, _) = broadcast::channel(capacity.max(1));
        Self {
            state: Arc::new(RwLock::new(initial_state)),
            reducer,
            environment,
            lifecycle: Arc::new(Lifecycle::new()),
            feedback,
        }
    }

    /// Reduce `action` and spawn its effects.
    ///
    /// Returns as soon as the reducer ran; the [`EffectHandle`] tells when the
    /// effects have settled.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
    #[tracing::instrument(skip(self, action), name = "store_send")]
    pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
        let (handle, tracker) = EffectHandle::new();
        self.dispatch(action, &tracker).await?;
        Ok(handle)
    }

    /// Send `action` and return the first feedback action matching `predicate`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Timeout`] if no matching action arrives in time
    /// - [`StoreError::ChannelClosed`] if the broadcast channel closes
    /// - [`StoreError::ShutdownInProgress`] if the store is shutting down
    pub async fn send_and_wait_for<F>(
        &self,
        action: A,
        predicate: F,
        timeout: Duration,
    ) -> Result<A, StoreError>
    where
        F: Fn(&A) -> bool,
    {
        // Subscribe first so a fast effect cannot slip past.
        let mut rx = self.feedback.subscribe();
        self.send(action).await?;

        let matching = async {
            loop {
                match rx.recv().await {
                    Ok(action) if predicate(&action) => return Ok(action),
                    Ok(_) => {},
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Action observer lagged");
                    },
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(StoreError::ChannelClosed);
                    },
                }
            }
        };
        tokio::time::timeout(timeout, matching)
            .await
            .map_err(|_| StoreError::Timeout)?
    }

    /// Observe actions produced by effects.
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
        self.feedback.subscribe()
    }

    /// Read the state through `f`.
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        f(&*self.state.read().await)
    }

    /// Refuse new actions, then wait for running effects to finish.
    ///
    /// Feedback from effects still running is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] with the number of effects
    /// still running when the timeout elapses.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        self.lifecycle.closing.store(true, Ordering::Release);
        tracing::debug!("Store shutdown initiated");

        let mut running = self.lifecycle.running_rx.clone();
        let settled = tokio::time::timeout(timeout, running.wait_for(|count| *count == 0))
            .await
            .is_ok();
        if settled {
            tracing::debug!("Store shutdown complete");
            return Ok(());
        }

        let pending = *running.borrow();
        tracing::warn!(pending, "Store shutdown timed out");
        Err(StoreError::ShutdownTimeout(pending))
    }

    async fn dispatch(&self, action: A, tracker: &Tracker) -> Result<(), StoreError> {
        if self.lifecycle.closing.load(Ordering::Acquire) {
            metrics::counter!("store.shutdown.rejected_actions").increment(1);
            return Err(StoreError::ShutdownInProgress);
        }
        metrics::counter!("store.actions.total").increment(1);

        let effects = {
            let mut state = self.state.write().await;
            let started = std::time::Instant::now();
            let effects = self.reducer.reduce(&mut *state, action, &self.environment);
            metrics::histogram!("store.reducer.duration_seconds")
                .record(started.elapsed().as_secs_f64());
            effects
        };
        tracing::trace!(effects = effects.len(), "Reducer returned");

        for effect in effects {
            self.run(effect, tracker);
        }
        Ok(())
    }

    fn run(&self, effect: Effect<A>, tracker: &Tracker) {
        match effect {
            Effect::None => {
                metrics::counter!("store.effects.executed", "type" => "none").increment(1);
            },
            Effect::Future(fut) => {
                metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                self.spawn(tracker, fut);
            },
            Effect::Delay { duration, action } => {
                metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                self.spawn(tracker, async move {
                    tokio::time::sleep(duration).await;
                    Some(*action)
                });
            },
            Effect::Parallel(effects) => {
                metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                for effect in effects {
                    self.run(effect, tracker);
                }
            },
        }
    }

    fn spawn<F>(&self, tracker: &Tracker, fut: F)
    where
        F: Future<Output = Option<A>> + Send + 'static,
    {
        let cascade = tracker.start();
        let store_wide = self.lifecycle.running.start();
        let tracker = tracker.clone();
        let store = self.clone();

        tokio::spawn(async move {
            let _running = (cascade, store_wide);
            let Some(action) = fut.await else {
                return;
            };
            let _ = store.feedback.send(action.clone());
            if let Err(error) = store.dispatch(action, &tracker).await {
                tracing::debug!(%error, "Dropped feedback action");
            }
        });
    }
}

impl<S, A, E, R> Clone for Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Clone,
    E: Clone,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            reducer: self.reducer.clone(),
            environment: self.environment.clone(),
            lifecycle: Arc::clone(&self.lifecycle),
            feedback: self.feedback.clone(),
        }
    }
}
