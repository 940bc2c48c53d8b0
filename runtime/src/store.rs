//! The Store: single owner of application state.
//!
//! The store manages:
//! 1. State (an `Arc<S>` replaced wholesale on every transition)
//! 2. Reducer (the only code that computes new state)
//! 3. Middleware chain (wrapped around dispatch at construction)
//! 4. Listeners (notified synchronously, in subscription order, after each transition)
//!
//! Cloning a [`Store`] clones the handle; every clone shares the same state.
//!
//! Every transition gets a version number under the reduction lock. The watch
//! channel is updated under that lock too, and notification passes run one at
//! a time (re-entrant on the notifying thread), so listeners only ever see
//! states in reduction order. A listener that already saw a newer state skips
//! an older one.

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::metrics::{DISPATCH_REJECTED, DISPATCH_TOTAL, LISTENERS_NOTIFIED, REDUCER_DURATION};
use crate::middleware::{Dispatchable, Enhancer, Middleware, Next, SharedMiddleware};
use crate::thunk::{TaskHandle, Thunk};
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{
    Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
    Weak,
};
use std::thread::{self, ThreadId};
use std::time::Instant;
use tokio::sync::watch;
use unistore_core::action::{Action, Signal};
use unistore_core::reducer::Reducer;

type SharedReducer<S, A> = Arc<dyn Reducer<State = S, Action = A> + Send + Sync>;
type Listener<S> = Arc<dyn Fn(&S) + Send + Sync>;

thread_local! {
    static DISPATCH_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Outcome of a dispatch
#[derive(Debug)]
pub enum Dispatched {
    /// A plain action reached the reducer and the state was replaced
    Reduced,

    /// A middleware consumed the dispatch (sync thunk ran, action swallowed)
    Handled,

    /// An async thunk was spawned; await the handle to know when it settles
    Pending(TaskHandle),
}

impl Dispatched {
    /// Whether an async thunk is still attached to this outcome
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Short label for logs
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Reduced => "reduced",
            Self::Handled => "handled",
            Self::Pending(_) => "pending",
        }
    }

    /// Wait until any spawned work has finished
    ///
    /// Returns immediately for synchronous outcomes.
    ///
    /// # Errors
    ///
    /// Returns the async thunk's error, or [`StoreError::TaskJoinError`] if its
    /// task panicked.
    pub async fn settled(self) -> Result<(), StoreError> {
        match self {
            Self::Pending(handle) => handle.wait().await,
            Self::Reduced | Self::Handled => Ok(()),
        }
    }
}

struct ListenerEntry<S> {
    id: u64,
    callback: Listener<S>,
    /// Version of the last state handed to this listener
    delivered: Arc<AtomicU64>,
}

struct Listeners<S> {
    next_id: u64,
    entries: Vec<ListenerEntry<S>>,
}

struct Inner<S, A> {
    config: StoreConfig,
    reducer: RwLock<SharedReducer<S, A>>,
    state: RwLock<Arc<S>>,
    /// Serialises reductions and counts them: one completes before the next begins
    reduce_lock: Mutex<u64>,
    /// Thread currently running the reducer, for re-entrancy detection
    reducing_on: Mutex<Option<ThreadId>>,
    listeners: Arc<Mutex<Listeners<S>>>,
    notify_gate: NotifyGate,
    middleware: Vec<SharedMiddleware<S, A>>,
    changes: watch::Sender<Arc<S>>,
}

/// The Store - single owner of current state
///
/// # Type Parameters
///
/// - `S`: State type
/// - `A`: Action type
///
/// # Example
///
/// ```
/// use unistore_core::{action::{Action, Signal}, reducer::from_fn};
/// use unistore_runtime::{create_store, Enhancer};
///
/// #[derive(Clone, Debug)]
/// enum Counter { Inc }
///
/// impl Action for Counter {
///     fn kind(&self) -> &'static str { "INC" }
/// }
///
/// let store = create_store(
///     from_fn(|state: Option<&i64>, signal: &Signal<Counter>| {
///         state.copied().unwrap_or(0) + i64::from(signal.action().is_some())
///     }),
///     Enhancer::identity(),
/// );
///
/// let _subscription = store.subscribe(|count| println!("count is now {count}"))?;
/// store.dispatch(Counter::Inc)?;
/// assert_eq!(store.state(|count| *count), 1);
/// # Ok::<(), unistore_runtime::StoreError>(())
/// ```
pub struct Store<S, A> {
    inner: Arc<Inner<S, A>>,
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A> std::fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.inner.config.name)
            .field("middleware", &self.inner.middleware.len())
            .field("listeners", &lock(&self.inner.listeners).entries.len())
            .finish_non_exhaustive()
    }
}

/// Build a store from a reducer and an enhancer
///
/// The reducer is invoked once with [`Signal::Init`] and no state to compute
/// the initial state. Reducer panics propagate to the caller.
///
/// Use [`StoreBuilder`] for preloaded state or a custom [`StoreConfig`].
#[must_use]
pub fn create_store<S, A, R>(reducer: R, enhancer: Enhancer<S, A>) -> Store<S, A>
where
    R: Reducer<State = S, Action = A> + Send + Sync + 'static,
    S: Send + Sync + 'static,
    A: Action + Send + 'static,
{
    Store::from_parts(Arc::new(reducer), None, enhancer, StoreConfig::default())
}

impl<S, A> Store<S, A>
where
    S: Send + Sync + 'static,
    A: Action + Send + 'static,
{
    /// Start building a store
    #[must_use]
    pub fn builder() -> StoreBuilder<S, A> {
        StoreBuilder::new()
    }

    fn from_parts(
        reducer: SharedReducer<S, A>,
        preloaded_state: Option<S>,
        enhancer: Enhancer<S, A>,
        config: StoreConfig,
    ) -> Self {
        let initial = {
            let span = tracing::debug_span!("store_init", store = %config.name);
            let _enter = span.enter();
            let initial = reducer.reduce(preloaded_state.as_ref(), &Signal::Init);
            tracing::debug!(preloaded = preloaded_state.is_some(), "Initial state computed");
            Arc::new(initial)
        };

        let (changes, _) = watch::channel(Arc::clone(&initial));

        Self {
            inner: Arc::new(Inner {
                config,
                reducer: RwLock::new(reducer),
                state: RwLock::new(initial),
                reduce_lock: Mutex::new(0),
                reducing_on: Mutex::new(None),
                listeners: Arc::new(Mutex::new(Listeners {
                    next_id: 0,
                    entries: Vec::new(),
                })),
                notify_gate: NotifyGate::new(),
                middleware: enhancer.into_chain(),
                changes,
            }),
        }
    }

    /// Dispatch a plain action
    ///
    /// Runs the action through the middleware chain and the reducer, replaces
    /// the state, then notifies listeners synchronously in subscription order.
    ///
    /// # Errors
    ///
    /// - [`StoreError::ReentrantDispatch`] if called from inside the reducer
    /// - [`StoreError::DispatchDepthExceeded`] if nested dispatches go too deep
    /// - Any error returned by a middleware
    pub fn dispatch(&self, action: A) -> Result<Dispatched, StoreError> {
        self.dispatch_any(Dispatchable::Action(action))
    }

    /// Dispatch a thunk
    ///
    /// # Errors
    ///
    /// Same as [`dispatch`](Self::dispatch), plus [`StoreError::UnhandledThunk`]
    /// when no thunk middleware is installed.
    pub fn dispatch_thunk(&self, thunk: Thunk<S, A>) -> Result<Dispatched, StoreError> {
        self.dispatch_any(Dispatchable::Thunk(thunk))
    }

    /// Dispatch an action or a thunk
    ///
    /// # Errors
    ///
    /// See [`dispatch`](Self::dispatch) and [`dispatch_thunk`](Self::dispatch_thunk).
    #[tracing::instrument(
        skip(self, dispatchable),
        fields(store = %self.inner.config.name, kind = dispatchable.kind()),
        name = "store_dispatch"
    )]
    pub fn dispatch_any(&self, dispatchable: Dispatchable<S, A>) -> Result<Dispatched, StoreError> {
        if let Err(error) = self.ensure_not_reducing(StoreError::ReentrantDispatch) {
            tracing::warn!("Rejected dispatch from inside the reducer");
            metrics::counter!(DISPATCH_REJECTED, "reason" => "reentrant").increment(1);
            return Err(error);
        }

        let _depth = match DepthGuard::enter(self.inner.config.max_dispatch_depth) {
            Ok(guard) => guard,
            Err(error) => {
                tracing::warn!(
                    max_depth = self.inner.config.max_dispatch_depth,
                    "Rejected dispatch: nesting too deep"
                );
                metrics::counter!(DISPATCH_REJECTED, "reason" => "depth").increment(1);
                return Err(error);
            },
        };

        metrics::counter!(DISPATCH_TOTAL, "store" => self.inner.config.name.clone()).increment(1);

        Next::new(&self.inner.middleware, self).run(dispatchable)
    }

    /// End of the middleware chain: reduce plain actions, reject thunks
    pub(crate) fn base_dispatch(
        &self,
        dispatchable: Dispatchable<S, A>,
    ) -> Result<Dispatched, StoreError> {
        match dispatchable {
            Dispatchable::Action(action) => {
                self.apply(&Signal::Action(action), None)?;
                Ok(Dispatched::Reduced)
            },
            Dispatchable::Thunk(thunk) => {
                tracing::warn!(thunk = thunk.name(), "Thunk reached the reducer");
                metrics::counter!(DISPATCH_REJECTED, "reason" => "unhandled_thunk").increment(1);
                Err(StoreError::UnhandledThunk(thunk.name()))
            },
        }
    }

    /// Run one transition and publish it
    ///
    /// `replacement` is swapped in under the reduction lock, so no action is
    /// reduced by the new reducer before it has seen `signal`.
    fn apply(
        &self,
        signal: &Signal<A>,
        replacement: Option<SharedReducer<S, A>>,
    ) -> Result<Arc<S>, StoreError> {
        self.ensure_not_reducing(StoreError::ReentrantDispatch)?;

        let (next, version) = {
            let mut transitions = lock(&self.inner.reduce_lock);
            let _reducing = ReducingGuard::enter(&self.inner.reducing_on);

            if let Some(reducer) = replacement {
                *write(&self.inner.reducer) = reducer;
            }

            let reducer = Arc::clone(&*read(&self.inner.reducer));
            let current = Arc::clone(&*read(&self.inner.state));

            let start = Instant::now();
            let next = Arc::new(reducer.reduce(Some(&current), signal));
            let elapsed = start.elapsed();

            metrics::histogram!(REDUCER_DURATION).record(elapsed.as_secs_f64());
            if elapsed > self.inner.config.slow_reducer_threshold {
                tracing::warn!(
                    kind = signal.kind(),
                    elapsed_ms = elapsed.as_millis(),
                    threshold_ms = self.inner.config.slow_reducer_threshold.as_millis(),
                    "Slow reducer"
                );
            }

            *transitions += 1;
            *write(&self.inner.state) = Arc::clone(&next);
            self.inner.changes.send_replace(Arc::clone(&next));
            tracing::trace!(kind = signal.kind(), version = *transitions, "State replaced");
            (next, *transitions)
        };

        self.notify(&next, version);

        Ok(next)
    }

    fn notify(&self, state: &S, version: u64) {
        let _gate = self.inner.notify_gate.enter();

        // Snapshot: listeners added or removed during notification apply next time
        let snapshot: Vec<(Listener<S>, Arc<AtomicU64>)> = lock(&self.inner.listeners)
            .entries
            .iter()
            .map(|entry| (Arc::clone(&entry.callback), Arc::clone(&entry.delivered)))
            .collect();

        let mut notified: u64 = 0;
        for (listener, delivered) in &snapshot {
            // A nested pass on this thread already delivered something newer
            if delivered.load(Ordering::Acquire) >= version {
                continue;
            }
            delivered.store(version, Ordering::Release);
            listener(state);
            notified += 1;
        }

        metrics::counter!(LISTENERS_NOTIFIED).increment(notified);
    }

    fn ensure_not_reducing(&self, error: StoreError) -> Result<(), StoreError> {
        let current = thread::current().id();
        if *lock(&self.inner.reducing_on) == Some(current) {
            return Err(error);
        }
        Ok(())
    }

    /// Current state snapshot
    ///
    /// The returned `Arc` stays valid (and unchanged) after later dispatches.
    #[must_use]
    pub fn get_state(&self) -> Arc<S> {
        Arc::clone(&*read(&self.inner.state))
    }

    /// Read current state via a closure
    ///
    /// ```ignore
    /// let todo_count = store.state(|s| s.todos.len());
    /// ```
    pub fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        f(&self.get_state())
    }

    /// Register a change listener
    ///
    /// The listener is called with the new state after every transition,
    /// including transitions that leave the state equal. Listeners run on the
    /// dispatching thread; a dispatch from another thread waits until the
    /// current notification pass is over, so a listener must not block on
    /// a dispatch made by another thread. Dropping the returned
    /// [`Subscription`] does not remove the listener; call
    /// [`Subscription::unsubscribe`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SubscribeWhileReducing`] if called from inside the reducer.
    pub fn subscribe<F>(&self, listener: F) -> Result<Subscription<S>, StoreError>
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        self.ensure_not_reducing(StoreError::SubscribeWhileReducing)?;

        let mut listeners = lock(&self.inner.listeners);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push(ListenerEntry {
            id,
            callback: Arc::new(listener),
            delivered: Arc::new(AtomicU64::new(0)),
        });
        tracing::trace!(id, "Listener subscribed");

        Ok(Subscription {
            id,
            listeners: Arc::downgrade(&self.inner.listeners),
        })
    }

    /// Number of registered listeners
    #[must_use]
    pub fn listener_count(&self) -> usize {
        lock(&self.inner.listeners).entries.len()
    }

    /// Async observation of state changes
    ///
    /// The receiver always holds the latest state; intermediate states may be
    /// skipped by slow receivers.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Arc<S>> {
        self.inner.changes.subscribe()
    }

    /// Swap the reducer
    ///
    /// The new reducer receives [`Signal::Replace`] with the current state;
    /// listeners are notified as for any other transition. The middleware
    /// chain is not involved.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ReentrantDispatch`] if called from inside the reducer.
    pub fn replace_reducer<R>(&self, reducer: R) -> Result<(), StoreError>
    where
        R: Reducer<State = S, Action = A> + Send + Sync + 'static,
    {
        self.apply(&Signal::Replace, Some(Arc::new(reducer)))?;
        tracing::info!(store = %self.inner.config.name, "Reducer replaced");
        Ok(())
    }

    /// Configuration this store was built with
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }
}

/// Handle returned by [`Store::subscribe`]
pub struct Subscription<S> {
    id: u64,
    listeners: Weak<Mutex<Listeners<S>>>,
}

impl<S> Subscription<S> {
    /// Identifier of the listener within its store
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Remove the listener
    ///
    /// Returns `false` if the store is gone or the listener was already removed.
    /// A notification already in progress still reaches the listener.
    pub fn unsubscribe(self) -> bool {
        let Some(listeners) = self.listeners.upgrade() else {
            return false;
        };

        let mut listeners = lock(&listeners);
        let before = listeners.entries.len();
        listeners.entries.retain(|entry| entry.id != self.id);
        let removed = listeners.entries.len() != before;
        tracing::trace!(id = self.id, removed, "Listener unsubscribed");
        removed
    }
}

impl<S> std::fmt::Debug for Subscription<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Builder for stores that need preloaded state or custom configuration
///
/// # Example
///
/// ```
/// use unistore_core::{action::{Action, Signal}, reducer::from_fn};
/// use unistore_runtime::{Store, StoreConfig, StoreError};
///
/// #[derive(Clone, Debug)]
/// struct Noop;
///
/// impl Action for Noop {
///     fn kind(&self) -> &'static str { "NOOP" }
/// }
///
/// let store: Store<u8, Noop> = Store::builder()
///     .reducer(from_fn(|state: Option<&u8>, _: &Signal<Noop>| state.copied().unwrap_or(0)))
///     .preloaded_state(7)
///     .config(StoreConfig::default().with_name("bytes"))
///     .build()?;
///
/// assert_eq!(*store.get_state(), 7);
///
/// let missing = Store::<u8, Noop>::builder().build();
/// assert!(matches!(missing, Err(StoreError::MissingReducer)));
/// # Ok::<(), StoreError>(())
/// ```
pub struct StoreBuilder<S, A> {
    reducer: Option<SharedReducer<S, A>>,
    preloaded_state: Option<S>,
    enhancer: Enhancer<S, A>,
    config: StoreConfig,
}

impl<S, A> StoreBuilder<S, A>
where
    S: Send + Sync + 'static,
    A: Action + Send + 'static,
{
    /// Empty builder with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            reducer: None,
            preloaded_state: None,
            enhancer: Enhancer::identity(),
            config: StoreConfig::default(),
        }
    }

    /// Set the reducer
    #[must_use]
    pub fn reducer<R>(mut self, reducer: R) -> Self
    where
        R: Reducer<State = S, Action = A> + Send + Sync + 'static,
    {
        self.reducer = Some(Arc::new(reducer));
        self
    }

    /// State passed to the reducer's init call instead of `None`
    #[must_use]
    pub fn preloaded_state(mut self, state: S) -> Self {
        self.preloaded_state = Some(state);
        self
    }

    /// Add an enhancer; enhancers added earlier wrap those added later
    #[must_use]
    pub fn enhancer(mut self, enhancer: Enhancer<S, A>) -> Self {
        self.enhancer = self.enhancer.then(enhancer);
        self
    }

    /// Add a single middleware innermost of those added so far
    #[must_use]
    pub fn middleware<M>(mut self, middleware: M) -> Self
    where
        M: Middleware<S, A> + 'static,
    {
        self.enhancer = self.enhancer.with(middleware);
        self
    }

    /// Set the configuration
    #[must_use]
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the store, computing its initial state
    ///
    /// # Errors
    ///
    /// - [`StoreError::MissingReducer`] if no reducer was set
    /// - [`StoreError::InvalidConfig`] if the configuration fails validation
    pub fn build(self) -> Result<Store<S, A>, StoreError> {
        let reducer = self.reducer.ok_or(StoreError::MissingReducer)?;
        self.config.validate()?;

        Ok(Store::from_parts(
            reducer,
            self.preloaded_state,
            self.enhancer,
            self.config,
        ))
    }
}

impl<S, A> Default for StoreBuilder<S, A>
where
    S: Send + Sync + 'static,
    A: Action + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Marks the current thread as running the reducer until dropped
struct ReducingGuard<'a>(&'a Mutex<Option<ThreadId>>);

impl<'a> ReducingGuard<'a> {
    fn enter(slot: &'a Mutex<Option<ThreadId>>) -> Self {
        *lock(slot) = Some(thread::current().id());
        Self(slot)
    }
}

impl Drop for ReducingGuard<'_> {
    fn drop(&mut self) {
        *lock(self.0) = None;
    }
}

/// Lets one thread at a time run a notification pass
///
/// Re-entrant: a listener that dispatches runs the nested pass on the same
/// thread without waiting.
struct NotifyGate {
    owner: Mutex<Option<(ThreadId, usize)>>,
    released: Condvar,
}

impl NotifyGate {
    const fn new() -> Self {
        Self {
            owner: Mutex::new(None),
            released: Condvar::new(),
        }
    }

    fn enter(&self) -> NotifyGuard<'_> {
        let current = thread::current().id();
        let mut owner = lock(&self.owner);
        loop {
            match *owner {
                None => {
                    *owner = Some((current, 1));
                    break;
                },
                Some((thread, depth)) if thread == current => {
                    *owner = Some((thread, depth + 1));
                    break;
                },
                Some(_) => {},
            }
            owner = self
                .released
                .wait(owner)
                .unwrap_or_else(PoisonError::into_inner);
        }
        NotifyGuard(self)
    }
}

struct NotifyGuard<'a>(&'a NotifyGate);

impl Drop for NotifyGuard<'_> {
    fn drop(&mut self) {
        let mut owner = lock(&self.0.owner);
        match *owner {
            Some((thread, depth)) if depth > 1 => *owner = Some((thread, depth - 1)),
            _ => {
                *owner = None;
                self.0.released.notify_all();
            },
        }
    }
}

/// Counts nested dispatches on the current thread
struct DepthGuard;

impl DepthGuard {
    fn enter(max_depth: usize) -> Result<Self, StoreError> {
        DISPATCH_DEPTH.with(|depth| {
            let current = depth.get();
            if current >= max_depth {
                return Err(StoreError::DispatchDepthExceeded(max_depth));
            }
            depth.set(current + 1);
            Ok(Self)
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DISPATCH_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

// State is always swapped as a whole `Arc`, so a poisoned lock never holds a
// half-written value.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
