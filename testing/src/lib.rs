//! # Unistore Testing
//!
//! Testing utilities and helpers for unistore reducers and stores.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - A Given/When/Then harness for reducers ([`ReducerTest`])
//! - A middleware that records every dispatch ([`RecordingMiddleware`])
//! - Property-based testing utilities
//!
//! ## Example
//!
//! ```ignore
//! use unistore_testing::{RecordingMiddleware, properties::replay};
//! use unistore_runtime::Store;
//!
//! #[test]
//! fn test_todo_flow() {
//!     let recorder = RecordingMiddleware::new();
//!     let store = Store::builder()
//!         .reducer(TodoReducer)
//!         .middleware(recorder.clone())
//!         .build()
//!         .unwrap();
//!
//!     store.dispatch(TodoAction::Add("milk".into())).unwrap();
//!
//!     assert_eq!(recorder.kinds(), vec!["todos/add"]);
//!     assert_eq!(*store.get_state(), replay(&TodoReducer, None, [TodoAction::Add("milk".into())]));
//! }
//! ```

use chrono::{DateTime, Utc};
use unistore_core::environment::Clock;


pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::{Arc, Mutex, PoisonError};
    use unistore_core::action::Action;
    use unistore_runtime::{Dispatchable, Dispatched, Middleware, Next, Store, StoreError};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use unistore_testing::mocks::FixedClock;
    /// use unistore_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2);
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Middleware that records the kind of everything dispatched through it
    ///
    /// Clones share the same log, so keep one clone in the test and hand the
    /// other to the store. Dispatches are always forwarded.
    ///
    /// # Example
    ///
    /// ```
    /// use unistore_core::{action::{Action, Signal}, reducer::from_fn};
    /// use unistore_runtime::Store;
    /// use unistore_testing::RecordingMiddleware;
    ///
    /// #[derive(Clone, Debug)]
    /// struct Ping;
    ///
    /// impl Action for Ping {
    ///     fn kind(&self) -> &'static str { "PING" }
    /// }
    ///
    /// let recorder = RecordingMiddleware::new();
    /// let store: Store<u32, Ping> = Store::builder()
    ///     .reducer(from_fn(|s: Option<&u32>, _: &Signal<Ping>| s.copied().unwrap_or(0) + 1))
    ///     .middleware(recorder.clone())
    ///     .build()
    ///     .unwrap();
    ///
    /// store.dispatch(Ping).unwrap();
    /// assert_eq!(recorder.kinds(), vec!["PING"]);
    /// ```
    #[derive(Debug, Clone, Default)]
    pub struct RecordingMiddleware {
        kinds: Arc<Mutex<Vec<&'static str>>>,
    }

    impl RecordingMiddleware {
        /// Create a recorder with an empty log
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Kinds recorded so far, in dispatch order
        #[must_use]
        pub fn kinds(&self) -> Vec<&'static str> {
            self.kinds
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// Number of recorded dispatches
        #[must_use]
        pub fn len(&self) -> usize {
            self.kinds.lock().unwrap_or_else(PoisonError::into_inner).len()
        }

        /// Whether nothing has been recorded
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        /// Forget everything recorded so far
        pub fn clear(&self) {
            self.kinds
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clear();
        }
    }

    impl<S, A> Middleware<S, A> for RecordingMiddleware
    where
        S: Send + Sync + 'static,
        A: Action + Send + 'static,
    {
        fn handle(
            &self,
            _store: &Store<S, A>,
            dispatchable: Dispatchable<S, A>,
            next: Next<'_, S, A>,
        ) -> Result<Dispatched, StoreError> {
            self.kinds
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(dispatchable.kind());
            next.run(dispatchable)
        }
    }
}

/// Test helpers and utilities.
pub mod helpers {
    use tracing_subscriber::EnvFilter;

    /// Install a test-friendly `tracing` subscriber
    ///
    /// Honours `RUST_LOG` and falls back to `debug`. Safe to call from every
    /// test; only the first call installs anything.
    pub fn init_test_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::collection::vec;
    use proptest::strategy::Strategy;
    use std::fmt::Debug;
    use unistore_core::action::Signal;
    use unistore_core::reducer::Reducer;

    /// Fold a reducer over a sequence of actions, starting from its init call
    ///
    /// This is what a store must end up holding after dispatching the same
    /// actions in order with no middleware interfering.
    pub fn replay<R, I>(reducer: &R, preloaded: Option<&R::State>, actions: I) -> R::State
    where
        R: Reducer,
        I: IntoIterator<Item = R::Action>,
    {
        let initial = reducer.reduce(preloaded, &Signal::Init);
        actions.into_iter().fold(initial, |state, action| {
            reducer.reduce(Some(&state), &Signal::Action(action))
        })
    }

    /// Strategy producing action sequences of up to `max_len` actions
    pub fn action_sequence<S>(action: S, max_len: usize) -> impl Strategy<Value = Vec<S::Value>>
    where
        S: Strategy,
        S::Value: Debug,
    {
        vec(action, 0..=max_len)
    }
}

// Re-export commonly used items
pub use helpers::init_test_tracing;
pub use mocks::{FixedClock, RecordingMiddleware, test_clock};
