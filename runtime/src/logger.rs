//! Logging middleware.
//!
//! Emits one `debug` event per dispatch with the action kind and outcome,
//! and the state before/after at `trace` level. Install it outermost so it
//! also sees the actions a thunk dispatches.

use crate::error::StoreError;
use crate::middleware::{Dispatchable, Middleware, Next};
use crate::store::{Dispatched, Store};
use std::fmt::Debug;
use std::time::Instant;
use unistore_core::action::Action;

/// Middleware that logs every dispatch through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMiddleware {
    log_state: bool,
}

impl LoggingMiddleware {
    /// Log action kinds and outcomes only
    #[must_use]
    pub const fn new() -> Self {
        Self { log_state: false }
    }

    /// Also log state before and after each dispatch (trace level)
    #[must_use]
    pub const fn with_state(mut self) -> Self {
        self.log_state = true;
        self
    }
}

impl<S, A> Middleware<S, A> for LoggingMiddleware
where
    S: Debug + Send + Sync + 'static,
    A: Action + Debug + Send + 'static,
{
    fn handle(
        &self,
        store: &Store<S, A>,
        dispatchable: Dispatchable<S, A>,
        next: Next<'_, S, A>,
    ) -> Result<Dispatched, StoreError> {
        let kind = dispatchable.kind();
        if let Some(action) = dispatchable.as_action() {
            tracing::debug!(kind, ?action, "Dispatching action");
        } else {
            tracing::debug!(kind, "Dispatching thunk");
        }

        if self.log_state {
            tracing::trace!(state = ?store.get_state(), "State before dispatch");
        }

        let start = Instant::now();
        let result = next.run(dispatchable);
        let elapsed_us = start.elapsed().as_micros();

        match &result {
            Ok(outcome) => {
                tracing::debug!(kind, outcome = outcome.label(), elapsed_us, "Dispatch finished");
                if self.log_state {
                    tracing::trace!(state = ?store.get_state(), "State after dispatch");
                }
            },
            Err(error) => {
                tracing::warn!(kind, error = %error, elapsed_us, "Dispatch failed");
            },
        }

        result
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code can use unwrap

    use super::*;
    use crate::middleware::apply_middleware;
    use crate::store::create_store;
    use crate::thunk::{Thunk, ThunkMiddleware};
    use std::sync::{Arc, Mutex};
    use unistore_core::action::Signal;
    use unistore_core::reducer::from_fn;

    #[derive(Debug, Clone)]
    struct Bump;

    impl Action for Bump {
        fn kind(&self) -> &'static str {
            "BUMP"
        }
    }

    fn store() -> Store<u8, Bump> {
        create_store(
            from_fn(|state: Option<&u8>, signal: &Signal<Bump>| {
                state.copied().unwrap_or(0) + u8::from(signal.action().is_some())
            }),
            apply_middleware(vec![
                Arc::new(LoggingMiddleware::new().with_state()),
                Arc::new(ThunkMiddleware::new()),
            ]),
        )
    }

    #[test]
    fn test_logging_is_transparent() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .try_init();

        let store = store();
        let outcome = store.dispatch(Bump).unwrap();

        assert!(matches!(outcome, Dispatched::Reduced));
        assert_eq!(*store.get_state(), 1);
    }

    #[test]
    fn test_logging_passes_errors_through() {
        let store = create_store(
            from_fn(|state: Option<&u8>, _signal: &Signal<Bump>| state.copied().unwrap_or(0)),
            apply_middleware(vec![Arc::new(LoggingMiddleware::new())]),
        );

        let result = store.dispatch_thunk(Thunk::new("orphan", |_| Ok(())));
        assert!(matches!(result, Err(StoreError::UnhandledThunk("orphan"))));
    }

    /// Shared buffer the fmt subscriber writes into
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn lines_with(&self, message: &str) -> Vec<String> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .filter(|line| line.contains(message))
                .map(str::to_string)
                .collect()
        }
    }

    #[test]
    fn test_logging_sees_thunk_dispatches() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let store = store();
        let thunk = Thunk::new("bump_twice", |store: &Store<u8, Bump>| {
            store.dispatch(Bump)?;
            store.dispatch(Bump)?;
            Ok(())
        });

        let outcome = tracing::subscriber::with_default(subscriber, || {
            store.dispatch_thunk(thunk).unwrap()
        });

        assert!(matches!(outcome, Dispatched::Handled));
        assert_eq!(*store.get_state(), 2);

        let thunks = captured.lines_with("Dispatching thunk");
        assert_eq!(thunks.len(), 1);
        assert!(thunks[0].contains("bump_twice"));

        let actions = captured.lines_with("Dispatching action");
        assert_eq!(actions.len(), 2);
        assert!(actions.iter().all(|line| line.contains("BUMP")));

        assert_eq!(captured.lines_with("Dispatch finished").len(), 3);
    }

    #[test]
    fn test_logging_without_middleware_is_silent() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let store = create_store(
            from_fn(|state: Option<&u8>, signal: &Signal<Bump>| {
                state.copied().unwrap_or(0) + u8::from(signal.action().is_some())
            }),
            apply_middleware(vec![Arc::new(ThunkMiddleware::new())]),
        );

        let outcome = tracing::subscriber::with_default(subscriber, || {
            store
                .dispatch_thunk(Thunk::new("bump", |store: &Store<u8, Bump>| {
                    store.dispatch(Bump)?;
                    Ok(())
                }))
                .unwrap()
        });

        assert!(matches!(outcome, Dispatched::Handled));
        assert_eq!(*store.get_state(), 1);
        assert!(captured.lines_with("Dispatching").is_empty());
    }
}
