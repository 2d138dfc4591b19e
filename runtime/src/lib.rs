//! # Busdesk Runtime
//!
//! Executes reducers. A [`Store`] owns one feature's state, runs its reducer
//! under a write lock and spawns the returned effects on tokio. Actions the
//! effects produce are broadcast to observers and fed back into the reducer.
//!
//! Every `send` returns an [`EffectHandle`]. The handle settles once the
//! action's effects, and the effects of the actions they fed back, are done.
//! The HTTP layer uses it to answer a request only after a seat lookup or a
//! sale submission has landed in the state.
//!
//! ## Example
//!
//! ```ignore
//! use busdesk_runtime::Store;
//!
//! let store = Store::new(SaleState::idle(today), SaleReducer, environment);
//!
//! let mut handle = store.send(SaleAction::Open).await?;
//! handle.wait().await;
//!
//! let open = store.state(|s| s.open).await;
//! ```

mod handle;
pub mod store;

pub use handle::EffectHandle;
pub use store::Store;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for effects or a feedback action
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;
