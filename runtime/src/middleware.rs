//! Dispatch middleware.
//!
//! A middleware sits between [`Store::dispatch`] and the reducer. It receives
//! every [`Dispatchable`] along with a [`Next`] continuation and decides what
//! to do with it:
//!
//! - forward it unchanged (`next.run(dispatchable)`),
//! - forward something else (a transformed action),
//! - swallow it (return without calling `next`),
//! - dispatch more work through the store, which re-enters the chain from the top.
//!
//! Middleware is composed into an [`Enhancer`] with [`apply_middleware`]
//! before the store is built. The first middleware in the list is the
//! outermost one: it sees every dispatch first.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use unistore_core::{action::{Action, Signal}, reducer::from_fn};
//! use unistore_runtime::{
//!     apply_middleware, create_store, Dispatchable, Dispatched, Middleware, Next, Store, StoreError,
//! };
//!
//! #[derive(Clone, Debug)]
//! struct Ping;
//!
//! impl Action for Ping {
//!     fn kind(&self) -> &'static str {
//!         "PING"
//!     }
//! }
//!
//! #[derive(Default)]
//! struct CountingMiddleware {
//!     seen: AtomicUsize,
//! }
//!
//! impl Middleware<u32, Ping> for CountingMiddleware {
//!     fn handle(
//!         &self,
//!         _store: &Store<u32, Ping>,
//!         dispatchable: Dispatchable<u32, Ping>,
//!         next: Next<'_, u32, Ping>,
//!     ) -> Result<Dispatched, StoreError> {
//!         self.seen.fetch_add(1, Ordering::SeqCst);
//!         next.run(dispatchable)
//!     }
//! }
//!
//! let counting = Arc::new(CountingMiddleware::default());
//! let reducer = from_fn(|state: Option<&u32>, _signal: &Signal<Ping>| state.copied().unwrap_or(0) + 1);
//! let store = create_store(reducer, apply_middleware(vec![counting.clone()]));
//!
//! store.dispatch(Ping)?;
//! assert_eq!(counting.seen.load(Ordering::SeqCst), 1);
//! # Ok::<(), StoreError>(())
//! ```

use crate::error::StoreError;
use crate::store::{Dispatched, Store};
use crate::thunk::Thunk;
use std::sync::Arc;
use unistore_core::action::Action;

/// Something that can be dispatched: a plain action or a thunk
pub enum Dispatchable<S, A> {
    /// A plain action, reducible by the base dispatch
    Action(A),

    /// A deferred action, resolved by [`ThunkMiddleware`](crate::ThunkMiddleware)
    Thunk(Thunk<S, A>),
}

impl<S, A: Action> Dispatchable<S, A> {
    /// The action's kind, or the thunk's name
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Action(action) => action.kind(),
            Self::Thunk(thunk) => thunk.name(),
        }
    }
}

impl<S, A> Dispatchable<S, A> {
    /// The plain action, if this is one
    #[must_use]
    pub const fn as_action(&self) -> Option<&A> {
        match self {
            Self::Action(action) => Some(action),
            Self::Thunk(_) => None,
        }
    }
}

impl<S, A> From<Thunk<S, A>> for Dispatchable<S, A> {
    fn from(thunk: Thunk<S, A>) -> Self {
        Self::Thunk(thunk)
    }
}

impl<S, A: std::fmt::Debug> std::fmt::Debug for Dispatchable<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Action(action) => f.debug_tuple("Dispatchable::Action").field(action).finish(),
            Self::Thunk(thunk) => f.debug_tuple("Dispatchable::Thunk").field(thunk).finish(),
        }
    }
}

/// A dispatch interceptor
///
/// Closures with the same shape as [`handle`](Middleware::handle) implement
/// this trait too.
pub trait Middleware<S, A>: Send + Sync {
    /// Handle one dispatch
    ///
    /// # Arguments
    ///
    /// - `store`: The store being dispatched to (read state or dispatch more work)
    /// - `dispatchable`: The action or thunk being dispatched
    /// - `next`: Continuation into the rest of the chain
    ///
    /// # Errors
    ///
    /// Whatever the middleware or the rest of the chain reports; the store
    /// passes it straight back to the caller of `dispatch`.
    fn handle(
        &self,
        store: &Store<S, A>,
        dispatchable: Dispatchable<S, A>,
        next: Next<'_, S, A>,
    ) -> Result<Dispatched, StoreError>;
}

impl<S, A, F> Middleware<S, A> for F
where
    F: Fn(&Store<S, A>, Dispatchable<S, A>, Next<'_, S, A>) -> Result<Dispatched, StoreError>
        + Send
        + Sync,
{
    fn handle(
        &self,
        store: &Store<S, A>,
        dispatchable: Dispatchable<S, A>,
        next: Next<'_, S, A>,
    ) -> Result<Dispatched, StoreError> {
        self(store, dispatchable, next)
    }
}

/// Shared middleware as stored in a chain
pub type SharedMiddleware<S, A> = Arc<dyn Middleware<S, A>>;

/// Continuation into the remainder of a middleware chain
///
/// Consumed by [`run`](Next::run); a middleware that drops it without
/// running it swallows the dispatch.
pub struct Next<'a, S, A> {
    chain: &'a [SharedMiddleware<S, A>],
    store: &'a Store<S, A>,
}

impl<'a, S, A> Next<'a, S, A>
where
    S: Send + Sync + 'static,
    A: Action + Send + 'static,
{
    pub(crate) const fn new(chain: &'a [SharedMiddleware<S, A>], store: &'a Store<S, A>) -> Self {
        Self { chain, store }
    }

    /// Forward to the next middleware, or to the base dispatch at the end of the chain
    ///
    /// # Errors
    ///
    /// Returns whatever the remaining middleware or the base dispatch returns.
    /// The base dispatch fails with [`StoreError::UnhandledThunk`] for thunks.
    pub fn run(self, dispatchable: Dispatchable<S, A>) -> Result<Dispatched, StoreError> {
        match self.chain.split_first() {
            Some((middleware, rest)) => {
                middleware.handle(self.store, dispatchable, Next::new(rest, self.store))
            },
            None => self.store.base_dispatch(dispatchable),
        }
    }

    /// Number of middleware left before the base dispatch
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.chain.len()
    }
}

/// A composed middleware chain, handed to store construction
pub struct Enhancer<S, A> {
    chain: Vec<SharedMiddleware<S, A>>,
}

impl<S, A> Enhancer<S, A> {
    /// An enhancer with no middleware: dispatch goes straight to the reducer
    #[must_use]
    pub const fn identity() -> Self {
        Self { chain: Vec::new() }
    }

    /// Append one middleware (innermost so far)
    #[must_use]
    pub fn with<M>(mut self, middleware: M) -> Self
    where
        M: Middleware<S, A> + 'static,
    {
        self.chain.push(Arc::new(middleware));
        self
    }

    /// Compose two enhancers; `self` wraps `inner`
    #[must_use]
    pub fn then(mut self, inner: Self) -> Self {
        self.chain.extend(inner.chain);
        self
    }

    /// Number of middleware in the chain
    #[must_use]
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Whether this enhancer adds no middleware
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.chain.is_empty()
    }

    pub(crate) fn into_chain(self) -> Vec<SharedMiddleware<S, A>> {
        self.chain
    }
}

impl<S, A> Default for Enhancer<S, A> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<S, A> std::fmt::Debug for Enhancer<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enhancer")
            .field("middleware", &self.chain.len())
            .finish()
    }
}

/// Compose middleware into an [`Enhancer`]
///
/// The first element is the outermost middleware.
#[must_use]
pub fn apply_middleware<S, A>(middleware: Vec<SharedMiddleware<S, A>>) -> Enhancer<S, A> {
    Enhancer { chain: middleware }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code can use unwrap

    use super::*;
    use crate::store::create_store;
    use std::sync::Mutex;
    use unistore_core::action::Signal;
    use unistore_core::reducer::from_fn;

    #[derive(Debug, Clone, PartialEq)]
    enum TestAction {
        Add(i32),
        Double,
    }

    impl Action for TestAction {
        fn kind(&self) -> &'static str {
            match self {
                Self::Add(_) => "ADD",
                Self::Double => "DOUBLE",
            }
        }
    }

    fn adder() -> impl unistore_core::reducer::Reducer<State = i32, Action = TestAction> + Send + Sync
    {
        from_fn(|state: Option<&i32>, signal: &Signal<TestAction>| {
            let value = state.copied().unwrap_or(0);
            match signal.action() {
                Some(TestAction::Add(n)) => value + n,
                Some(TestAction::Double) => value * 2,
                None => value,
            }
        })
    }

    struct Tagger {
        tag: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Middleware<i32, TestAction> for Tagger {
        fn handle(
            &self,
            _store: &Store<i32, TestAction>,
            dispatchable: Dispatchable<i32, TestAction>,
            next: Next<'_, i32, TestAction>,
        ) -> Result<Dispatched, StoreError> {
            self.log.lock().unwrap().push(self.tag);
            next.run(dispatchable)
        }
    }

    #[test]
    fn test_chain_runs_outermost_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let enhancer = apply_middleware::<i32, TestAction>(vec![
            Arc::new(Tagger { tag: "outer", log: Arc::clone(&log) }),
            Arc::new(Tagger { tag: "inner", log: Arc::clone(&log) }),
        ]);
        let store = create_store(adder(), enhancer);

        store.dispatch(TestAction::Add(1)).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["outer", "inner"]);
        assert_eq!(*store.get_state(), 1);
    }

    #[test]
    fn test_middleware_can_swallow() {
        let swallow = |_store: &Store<i32, TestAction>,
                       dispatchable: Dispatchable<i32, TestAction>,
                       next: Next<'_, i32, TestAction>| {
            if matches!(dispatchable.as_action(), Some(TestAction::Double)) {
                return Ok(Dispatched::Handled);
            }
            next.run(dispatchable)
        };
        let store = create_store(adder(), Enhancer::identity().with(swallow));

        store.dispatch(TestAction::Add(3)).unwrap();
        let outcome = store.dispatch(TestAction::Double).unwrap();

        assert!(matches!(outcome, Dispatched::Handled));
        assert_eq!(*store.get_state(), 3);
    }

    #[test]
    fn test_middleware_can_transform() {
        let doubler = |_store: &Store<i32, TestAction>,
                       dispatchable: Dispatchable<i32, TestAction>,
                       next: Next<'_, i32, TestAction>| {
            match dispatchable {
                Dispatchable::Action(TestAction::Add(n)) => {
                    next.run(Dispatchable::Action(TestAction::Add(n * 10)))
                },
                other => next.run(other),
            }
        };
        let store = create_store(adder(), Enhancer::identity().with(doubler));

        store.dispatch(TestAction::Add(2)).unwrap();
        assert_eq!(*store.get_state(), 20);
    }

    #[test]
    fn test_enhancers_compose_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let outer = Enhancer::identity().with(Tagger { tag: "a", log: Arc::clone(&log) });
        let inner = Enhancer::identity()
            .with(Tagger { tag: "b", log: Arc::clone(&log) })
            .with(Tagger { tag: "c", log: Arc::clone(&log) });

        let enhancer = outer.then(inner);
        assert_eq!(enhancer.len(), 3);

        let store = create_store(adder(), enhancer);
        store.dispatch(TestAction::Add(1)).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_identity_enhancer() {
        let enhancer: Enhancer<i32, TestAction> = Enhancer::default();
        assert!(enhancer.is_identity());
        assert_eq!(format!("{enhancer:?}"), "Enhancer { middleware: 0 }");
    }
}
