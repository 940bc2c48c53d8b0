//! # Unistore Runtime
//!
//! Runtime implementation for unistore.
//!
//! This crate provides the [`Store`]: a single owner of application state
//! whose only write path is `dispatch → middleware chain → reducer`.
//!
//! ## Core Components
//!
//! - **Store**: holds the current state, runs reductions and notifies listeners
//! - **Middleware**: interceptors around dispatch, composed into an [`Enhancer`]
//! - **Thunks**: deferred actions resolved by [`ThunkMiddleware`], optionally on tokio
//! - **Logging**: [`LoggingMiddleware`] plus `tracing` spans inside the store
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use unistore_core::{action::{Action, Signal}, reducer::from_fn};
//! use unistore_runtime::{apply_middleware, create_store, ThunkMiddleware};
//!
//! #[derive(Clone, Debug)]
//! struct Inc;
//!
//! impl Action for Inc {
//!     fn kind(&self) -> &'static str {
//!         "INC"
//!     }
//! }
//!
//! let counter = from_fn(|state: Option<&u32>, signal: &Signal<Inc>| {
//!     state.copied().unwrap_or(0) + u32::from(signal.action().is_some())
//! });
//!
//! let store = create_store(counter, apply_middleware(vec![Arc::new(ThunkMiddleware::new())]));
//!
//! for _ in 0..3 {
//!     store.dispatch(Inc)?;
//! }
//! assert_eq!(*store.get_state(), 3);
//! # Ok::<(), unistore_runtime::error::StoreError>(())
//! ```

/// Store configuration
pub mod config;

/// Dispatch middleware and enhancers
pub mod middleware;

/// Thunks and the thunk middleware
pub mod thunk;

/// Logging middleware
pub mod logger;

/// Metric names and descriptions
pub mod metrics;

/// The Store
pub mod store;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    ///
    /// The store never recovers from these itself; they propagate to the caller
    /// of `dispatch` or of construction.
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// The builder was asked to build a store without a reducer
        #[error("Store requires a reducer")]
        MissingReducer,

        /// A configuration value was out of range or unparsable
        #[error("Invalid store configuration: {0}")]
        InvalidConfig(String),

        /// A reducer tried to dispatch while it was running
        ///
        /// Reducers must be pure; dispatching from one would deadlock the store.
        #[error("Reducers may not dispatch actions")]
        ReentrantDispatch,

        /// A reducer tried to subscribe while it was running
        #[error("Reducers may not subscribe to the store")]
        SubscribeWhileReducing,

        /// A thunk reached the base dispatch
        ///
        /// Only plain actions can be reduced. Install [`ThunkMiddleware`](crate::ThunkMiddleware)
        /// to resolve thunks.
        #[error("Thunk `{0}` reached the reducer; install the thunk middleware to dispatch thunks")]
        UnhandledThunk(&'static str),

        /// Middleware or listeners kept dispatching from inside a dispatch
        #[error("Nested dispatch exceeded the maximum depth of {0}")]
        DispatchDepthExceeded(usize),

        /// An async thunk was dispatched with no tokio runtime to spawn it on
        #[error("Async thunk `{0}` dispatched outside a tokio runtime")]
        NoRuntime(&'static str),

        /// The task running an async thunk panicked or was cancelled
        #[error("Thunk task failed: {0}")]
        TaskJoinError(#[from] tokio::task::JoinError),

        /// Timeout waiting for an async thunk to settle
        #[error("Timeout waiting for thunk task")]
        Timeout,

        /// A thunk body returned an error
        #[error("Thunk failed: {0}")]
        Thunk(#[from] anyhow::Error),
    }
}

// Re-export for convenience
pub use config::StoreConfig;
pub use error::StoreError;
pub use logger::LoggingMiddleware;
pub use middleware::{Dispatchable, Enhancer, Middleware, Next, apply_middleware};
pub use store::{Dispatched, Store, StoreBuilder, Subscription, create_store};
pub use thunk::{TaskHandle, Thunk, ThunkMiddleware};
