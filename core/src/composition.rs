//! Reducer composition utilities
//!
//! This module provides utilities for composing reducers in various ways:
//! - **`combine_reducers`**: Run multiple reducers on the same state/signal
//! - **`scope_reducer`**: Focus a reducer on a subset of state
//! - **`combine_slices`**: Build a state from independent scoped reducers
//!
//! # Examples
//!
//! ## Combining Reducers
//!
//! ```
//! use unistore_core::action::Signal;
//! use unistore_core::composition::combine_reducers;
//! use unistore_core::reducer::{from_fn, Reducer};
//!
//! #[derive(Clone, Debug, Default, PartialEq)]
//! struct Totals {
//!     count: u32,
//!     sum: i64,
//! }
//!
//! let counting = from_fn(|state: Option<&Totals>, signal: &Signal<i64>| {
//!     let mut next = state.cloned().unwrap_or_default();
//!     if signal.action().is_some() {
//!         next.count += 1;
//!     }
//!     next
//! });
//!
//! let summing = from_fn(|state: Option<&Totals>, signal: &Signal<i64>| {
//!     let mut next = state.cloned().unwrap_or_default();
//!     if let Some(amount) = signal.action() {
//!         next.sum += amount;
//!     }
//!     next
//! });
//!
//! let combined = combine_reducers(vec![Box::new(counting), Box::new(summing)]);
//! let state = combined.reduce(None, &Signal::Action(5));
//! assert_eq!(state, Totals { count: 1, sum: 5 });
//! ```

use crate::action::Signal;
use crate::reducer::Reducer;

/// Boxed reducer accepted by [`combine_reducers`]
pub type BoxedReducer<S, A> = Box<dyn Reducer<State = S, Action = A> + Send + Sync>;

/// Combines multiple reducers that operate on the same state and action types.
///
/// Reducers run in order. The first one receives the store's state (which is
/// `None` during a fresh init); every later one receives the state produced
/// by its predecessor. With an empty list the combined reducer is the
/// identity, falling back to `S::default()` when there is no state yet.
#[must_use]
pub fn combine_reducers<S, A>(reducers: Vec<BoxedReducer<S, A>>) -> CombinedReducer<S, A>
where
    S: Clone + Default + 'static,
    A: 'static,
{
    CombinedReducer { reducers }
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`].
pub struct CombinedReducer<S, A> {
    reducers: Vec<BoxedReducer<S, A>>,
}

impl<S, A> CombinedReducer<S, A> {
    /// Number of reducers in the chain
    #[must_use]
    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    /// Whether the chain is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }
}

impl<S, A> std::fmt::Debug for CombinedReducer<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombinedReducer")
            .field("reducers", &self.reducers.len())
            .finish()
    }
}

impl<S, A> Reducer for CombinedReducer<S, A>
where
    S: Clone + Default,
{
    type State = S;
    type Action = A;

    fn reduce(&self, state: Option<&Self::State>, signal: &Signal<Self::Action>) -> Self::State {
        let mut reducers = self.reducers.iter();

        let Some(first) = reducers.next() else {
            return state.cloned().unwrap_or_default();
        };

        let mut next = first.reduce(state, signal);
        for reducer in reducers {
            next = reducer.reduce(Some(&next), signal);
        }
        next
    }
}

/// Scopes a reducer to operate on a subset of a larger state.
///
/// The child reducer sees `None` exactly when the parent has no state yet;
/// the parent then starts from `S::default()` and writes the child's result
/// into it. To assemble a state from several scoped reducers use
/// [`combine_slices`]: inside [`combine_reducers`] every reducer after the
/// first sees its predecessor's output, never `None`.
///
/// # Examples
///
/// ```
/// use unistore_core::action::Signal;
/// use unistore_core::composition::scope_reducer;
/// use unistore_core::reducer::{from_fn, Reducer};
///
/// #[derive(Clone, Debug, Default)]
/// struct AppState {
///     counter: i32,
///     title: String,
/// }
///
/// let counter = from_fn(|state: Option<&i32>, signal: &Signal<i32>| {
///     state.copied().unwrap_or(0) + signal.action().copied().unwrap_or(0)
/// });
///
/// let scoped = scope_reducer(
///     counter,
///     |app: &AppState| &app.counter,
///     |app: &mut AppState, counter: i32| app.counter = counter,
/// );
///
/// let state = scoped.reduce(None, &Signal::Init);
/// let state = scoped.reduce(Some(&state), &Signal::Action(4));
/// assert_eq!(state.counter, 4);
/// ```
pub fn scope_reducer<S, SubS, A, R>(
    reducer: R,
    get_state: fn(&S) -> &SubS,
    set_state: fn(&mut S, SubS),
) -> ScopedReducer<S, SubS, A, R>
where
    S: Clone + Default + 'static,
    SubS: 'static,
    A: 'static,
    R: Reducer<State = SubS, Action = A>,
{
    ScopedReducer {
        reducer,
        get_state,
        set_state,
        _phantom: std::marker::PhantomData,
    }
}

/// A scoped reducer that operates on a subset of state.
///
/// Created by [`scope_reducer`].
pub struct ScopedReducer<S, SubS, A, R>
where
    R: Reducer<State = SubS, Action = A>,
{
    reducer: R,
    get_state: fn(&S) -> &SubS,
    set_state: fn(&mut S, SubS),
    _phantom: std::marker::PhantomData<fn() -> A>,
}

impl<S, SubS, A, R> Reducer for ScopedReducer<S, SubS, A, R>
where
    S: Clone + Default,
    R: Reducer<State = SubS, Action = A>,
{
    type State = S;
    type Action = A;

    fn reduce(&self, state: Option<&Self::State>, signal: &Signal<Self::Action>) -> Self::State {
        let mut next = state.cloned().unwrap_or_default();
        self.reduce_into(state, &mut next, signal);
        next
    }
}

/// A reducer that owns one part of a larger state.
///
/// `reduce_into` reads its part from `parent` (the state before this
/// transition) and writes its result into `next`.
pub trait SliceReducer {
    /// The parent state
    type State;

    /// The action type
    type Action;

    /// Reduce this slice of `parent` and store it in `next`
    fn reduce_into(
        &self,
        parent: Option<&Self::State>,
        next: &mut Self::State,
        signal: &Signal<Self::Action>,
    );
}

impl<S, SubS, A, R> SliceReducer for ScopedReducer<S, SubS, A, R>
where
    R: Reducer<State = SubS, Action = A>,
{
    type State = S;
    type Action = A;

    fn reduce_into(&self, parent: Option<&S>, next: &mut S, signal: &Signal<A>) {
        let sub_state = self.reducer.reduce(parent.map(self.get_state), signal);
        (self.set_state)(next, sub_state);
    }
}

/// Boxed slice reducer accepted by [`combine_slices`]
pub type BoxedSlice<S, A> = Box<dyn SliceReducer<State = S, Action = A> + Send + Sync>;

/// Combines slice reducers that each own a different part of the state.
///
/// Every slice reads the incoming state, so on a fresh init each one sees
/// `None` and computes its own initial value. Parts no slice owns keep their
/// incoming value (or `S::default()`).
///
/// # Examples
///
/// ```
/// use unistore_core::action::Signal;
/// use unistore_core::composition::{combine_slices, scope_reducer};
/// use unistore_core::reducer::{from_fn, Reducer};
///
/// #[derive(Clone, Debug, Default, PartialEq)]
/// struct Limits {
///     retries: u8,
///     timeout_secs: u8,
/// }
///
/// let retries = from_fn(|state: Option<&u8>, _: &Signal<()>| state.copied().unwrap_or(3));
/// let timeout = from_fn(|state: Option<&u8>, _: &Signal<()>| state.copied().unwrap_or(30));
///
/// let limits = combine_slices(vec![
///     Box::new(scope_reducer(
///         retries,
///         |l: &Limits| &l.retries,
///         |l: &mut Limits, v: u8| l.retries = v,
///     )),
///     Box::new(scope_reducer(
///         timeout,
///         |l: &Limits| &l.timeout_secs,
///         |l: &mut Limits, v: u8| l.timeout_secs = v,
///     )),
/// ]);
///
/// assert_eq!(
///     limits.reduce(None, &Signal::Init),
///     Limits { retries: 3, timeout_secs: 30 }
/// );
/// ```
#[must_use]
pub fn combine_slices<S, A>(slices: Vec<BoxedSlice<S, A>>) -> CombinedSlices<S, A>
where
    S: Clone + Default + 'static,
    A: 'static,
{
    CombinedSlices { slices }
}

/// A reducer assembled from slice reducers.
///
/// Created by [`combine_slices`].
pub struct CombinedSlices<S, A> {
    slices: Vec<BoxedSlice<S, A>>,
}

impl<S, A> CombinedSlices<S, A> {
    /// Number of slices
    #[must_use]
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// Whether there are no slices
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

impl<S, A> std::fmt::Debug for CombinedSlices<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombinedSlices")
            .field("slices", &self.slices.len())
            .finish()
    }
}

impl<S, A> Reducer for CombinedSlices<S, A>
where
    S: Clone + Default,
{
    type State = S;
    type Action = A;

    fn reduce(&self, state: Option<&Self::State>, signal: &Signal<Self::Action>) -> Self::State {
        let mut next = state.cloned().unwrap_or_default();
        for slice in &self.slices {
            slice.reduce_into(state, &mut next, signal);
        }
        next
    }
}
