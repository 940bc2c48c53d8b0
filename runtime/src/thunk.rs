//! Thunks: deferred actions.
//!
//! A thunk is a named function that receives the store instead of being
//! reduced. It can read state and dispatch any number of plain actions, now
//! or later. Two shapes exist:
//!
//! - [`Thunk::new`]: runs inline during dispatch
//! - [`Thunk::future`]: returns a future that [`ThunkMiddleware`] spawns on the
//!   current tokio runtime; the dispatch returns [`Dispatched::Pending`]
//!
//! Without [`ThunkMiddleware`] in the chain, dispatching a thunk fails with
//! [`StoreError::UnhandledThunk`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use unistore_core::{action::{Action, Signal}, reducer::from_fn};
//! use unistore_runtime::{apply_middleware, create_store, Store, Thunk, ThunkMiddleware};
//!
//! #[derive(Clone, Debug)]
//! enum Msg {
//!     Loaded(u32),
//! }
//!
//! impl Action for Msg {
//!     fn kind(&self) -> &'static str { "LOADED" }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), unistore_runtime::StoreError> {
//! let store = create_store(
//!     from_fn(|state: Option<&u32>, signal: &Signal<Msg>| match signal.action() {
//!         Some(Msg::Loaded(value)) => *value,
//!         None => state.copied().unwrap_or(0),
//!     }),
//!     apply_middleware(vec![Arc::new(ThunkMiddleware::new())]),
//! );
//!
//! let load = Thunk::future("load", |store: Store<u32, Msg>| async move {
//!     tokio::task::yield_now().await;
//!     store.dispatch(Msg::Loaded(42))?;
//!     Ok(())
//! });
//!
//! store.dispatch_thunk(load)?.settled().await?;
//! assert_eq!(*store.get_state(), 42);
//! # Ok(())
//! # }
//! ```

use crate::error::StoreError;
use crate::metrics::THUNKS_SPAWNED;
use crate::middleware::{Dispatchable, Middleware, Next};
use crate::store::{Dispatched, Store};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use unistore_core::action::Action;

type SyncBody<S, A> = Box<dyn FnOnce(&Store<S, A>) -> Result<(), StoreError> + Send>;
type AsyncBody<S, A> =
    Box<dyn FnOnce(Store<S, A>) -> BoxFuture<'static, Result<(), StoreError>> + Send>;

enum Body<S, A> {
    Sync(SyncBody<S, A>),
    Async(AsyncBody<S, A>),
}

/// A deferred action
pub struct Thunk<S, A> {
    name: &'static str,
    body: Body<S, A>,
}

impl<S, A> Thunk<S, A> {
    /// A thunk that runs inline when dispatched
    pub fn new<F>(name: &'static str, f: F) -> Self
    where
        F: FnOnce(&Store<S, A>) -> Result<(), StoreError> + Send + 'static,
    {
        Self {
            name,
            body: Body::Sync(Box::new(f)),
        }
    }

    /// A thunk whose work continues asynchronously
    ///
    /// `f` is called during dispatch with a clone of the store; the future it
    /// returns is spawned on the current tokio runtime.
    pub fn future<F, Fut>(name: &'static str, f: F) -> Self
    where
        F: FnOnce(Store<S, A>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), StoreError>> + Send + 'static,
    {
        Self {
            name,
            body: Body::Async(Box::new(move |store| f(store).boxed())),
        }
    }

    /// Name used in logs and errors
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this thunk spawns a task
    #[must_use]
    pub const fn is_async(&self) -> bool {
        matches!(self.body, Body::Async(_))
    }
}

impl<S, A> Thunk<S, A>
where
    S: Send + Sync + 'static,
    A: Action + Send + 'static,
{
    fn run(self, store: &Store<S, A>) -> Result<Dispatched, StoreError> {
        let name = self.name;

        match self.body {
            Body::Sync(f) => {
                tracing::debug!(thunk = name, "Running thunk");
                f(store)?;
                Ok(Dispatched::Handled)
            },
            Body::Async(f) => {
                let runtime = tokio::runtime::Handle::try_current()
                    .map_err(|_| StoreError::NoRuntime(name))?;

                tracing::debug!(thunk = name, "Spawning async thunk");
                metrics::counter!(THUNKS_SPAWNED).increment(1);

                let future = f(store.clone());
                let task = runtime.spawn(async move {
                    let result = future.await;
                    match &result {
                        Ok(()) => tracing::debug!(thunk = name, "Async thunk completed"),
                        Err(error) => {
                            tracing::error!(thunk = name, error = %error, "Async thunk failed");
                        },
                    }
                    result
                });

                Ok(Dispatched::Pending(TaskHandle { name, task }))
            },
        }
    }
}

impl<S, A> std::fmt::Debug for Thunk<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Thunk")
            .field("name", &self.name)
            .field("async", &self.is_async())
            .finish()
    }
}

/// Handle to a spawned async thunk
#[derive(Debug)]
pub struct TaskHandle {
    name: &'static str,
    task: JoinHandle<Result<(), StoreError>>,
}

impl TaskHandle {
    /// Name of the thunk running in this task
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the task has finished
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the thunk to settle
    ///
    /// # Errors
    ///
    /// Returns the thunk's own error, or [`StoreError::TaskJoinError`] if the
    /// task panicked.
    pub async fn wait(self) -> Result<(), StoreError> {
        self.task.await?
    }

    /// Wait for the thunk to settle, giving up after `timeout`
    ///
    /// The task keeps running after a timeout.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires first, otherwise
    /// the same errors as [`wait`](Self::wait).
    pub async fn wait_with_timeout(self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)?
    }
}

/// Middleware resolving [`Thunk`]s
///
/// Plain actions pass through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThunkMiddleware;

impl ThunkMiddleware {
    /// Create the middleware
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl<S, A> Middleware<S, A> for ThunkMiddleware
where
    S: Send + Sync + 'static,
    A: Action + Send + 'static,
{
    fn handle(
        &self,
        store: &Store<S, A>,
        dispatchable: Dispatchable<S, A>,
        next: Next<'_, S, A>,
    ) -> Result<Dispatched, StoreError> {
        match dispatchable {
            Dispatchable::Thunk(thunk) => thunk.run(store),
            action @ Dispatchable::Action(_) => next.run(action),
        }
    }
}
