//! # Unistore Core
//!
//! Core traits and types for unistore, a unidirectional state container.
//!
//! This crate has no runtime. It defines the vocabulary the store is built
//! from:
//!
//! - **State**: an application-defined value, replaced wholesale on every transition
//! - **Action**: a tagged description of what happened (discriminator + payload)
//! - **Signal**: what a reducer actually receives (init sentinel, replace sentinel or an action)
//! - **Reducer**: pure function `(Option<&State>, &Signal<Action>) → State`
//! - **Environment**: injected dependencies such as a [`environment::Clock`]
//!
//! ## Example
//!
//! ```
//! use unistore_core::{action::{Action, Signal}, reducer::Reducer};
//!
//! #[derive(Clone, Debug)]
//! enum CounterAction {
//!     Increment,
//!     Add(i64),
//! }
//!
//! impl Action for CounterAction {
//!     fn kind(&self) -> &'static str {
//!         match self {
//!             Self::Increment => "INC",
//!             Self::Add(_) => "ADD",
//!         }
//!     }
//! }
//!
//! struct CounterReducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = i64;
//!     type Action = CounterAction;
//!
//!     fn reduce(&self, state: Option<&i64>, signal: &Signal<CounterAction>) -> i64 {
//!         let count = state.copied().unwrap_or(0);
//!         match signal.action() {
//!             Some(CounterAction::Increment) => count + 1,
//!             Some(CounterAction::Add(n)) => count + n,
//!             None => count,
//!         }
//!     }
//! }
//!
//! let initial = CounterReducer.reduce(None, &Signal::Init);
//! assert_eq!(initial, 0);
//! assert_eq!(CounterReducer.reduce(Some(&initial), &Signal::Action(CounterAction::Add(5))), 5);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};

/// Reducer composition utilities
pub mod composition;

/// Action module - tagged descriptions of state changes
///
/// Actions are application enums. The only thing the store needs from them is
/// a discriminator ([`Action::kind`]) for logging and metrics; the variant
/// fields carry the payload.
pub mod action {
    use serde::{Deserialize, Serialize};

    /// Kind reported for the sentinel the store sends once at construction.
    pub const INIT_KIND: &str = "@@unistore/INIT";

    /// Kind reported for the sentinel sent after a reducer is replaced.
    pub const REPLACE_KIND: &str = "@@unistore/REPLACE";

    /// A tagged value describing "what happened"
    ///
    /// # Example
    ///
    /// ```
    /// use unistore_core::action::Action;
    ///
    /// #[derive(Clone, Debug)]
    /// enum TodoAction {
    ///     Added { text: String },
    ///     Cleared,
    /// }
    ///
    /// impl Action for TodoAction {
    ///     fn kind(&self) -> &'static str {
    ///         match self {
    ///             Self::Added { .. } => "todo/added",
    ///             Self::Cleared => "todo/cleared",
    ///         }
    ///     }
    /// }
    ///
    /// assert_eq!(TodoAction::Cleared.kind(), "todo/cleared");
    /// ```
    pub trait Action {
        /// The discriminator of this action
        fn kind(&self) -> &'static str;
    }

    /// Input to a reducer
    ///
    /// Reducers never see bare actions: the store wraps them so it can also
    /// send its own sentinels. A reducer that follows the default-case
    /// convention returns its input state unchanged for any signal it does
    /// not recognise, including both sentinels.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub enum Signal<A> {
        /// Sent once when a store is created, to obtain the initial state
        Init,

        /// Sent after the store swaps in a new reducer
        Replace,

        /// An action dispatched by the application
        Action(A),
    }

    impl<A> Signal<A> {
        /// The application action, if this signal carries one
        #[must_use]
        pub const fn action(&self) -> Option<&A> {
            match self {
                Self::Action(action) => Some(action),
                Self::Init | Self::Replace => None,
            }
        }

        /// Consume the signal, returning the application action if present
        #[must_use]
        pub fn into_action(self) -> Option<A> {
            match self {
                Self::Action(action) => Some(action),
                Self::Init | Self::Replace => None,
            }
        }

        /// Whether this is the store's construction sentinel
        #[must_use]
        pub const fn is_init(&self) -> bool {
            matches!(self, Self::Init)
        }
    }

    impl<A: Action> Signal<A> {
        /// Discriminator of the signal (sentinel kinds or the action's own)
        #[must_use]
        pub fn kind(&self) -> &'static str {
            match self {
                Self::Init => INIT_KIND,
                Self::Replace => REPLACE_KIND,
                Self::Action(action) => action.kind(),
            }
        }
    }

    impl<A> From<A> for Signal<A>
    where
        A: Action,
    {
        fn from(action: A) -> Self {
            Self::Action(action)
        }
    }
}

/// Reducer module - the core trait for state transitions
///
/// Reducers are pure functions: `(Option<State>, Signal) → State`.
///
/// `None` stands for "no state yet" and is only passed for the init
/// signal of a store that was not given preloaded state. Reducers supply
/// their default there.
pub mod reducer {
    use super::action::Signal;
    use std::marker::PhantomData;

    /// The Reducer trait - core abstraction for state transitions
    ///
    /// Given the same state and signal a reducer must always return an equal
    /// state. It owns no mutable state itself.
    ///
    /// # Example
    ///
    /// ```
    /// use unistore_core::{action::Signal, reducer::Reducer};
    ///
    /// struct Doubler;
    ///
    /// impl Reducer for Doubler {
    ///     type State = u32;
    ///     type Action = ();
    ///
    ///     fn reduce(&self, state: Option<&u32>, signal: &Signal<()>) -> u32 {
    ///         let value = state.copied().unwrap_or(1);
    ///         if signal.action().is_some() { value * 2 } else { value }
    ///     }
    /// }
    ///
    /// assert_eq!(Doubler.reduce(Some(&4), &Signal::Action(())), 8);
    /// ```
    pub trait Reducer {
        /// The state type this reducer produces
        type State;

        /// The action type this reducer processes
        type Action;

        /// Compute the next state
        ///
        /// # Arguments
        ///
        /// - `state`: Current state, `None` only before the first transition
        /// - `signal`: The sentinel or action being processed
        ///
        /// # Returns
        ///
        /// The replacement state
        fn reduce(&self, state: Option<&Self::State>, signal: &Signal<Self::Action>)
        -> Self::State;
    }

    impl<R: Reducer + ?Sized> Reducer for Box<R> {
        type State = R::State;
        type Action = R::Action;

        fn reduce(&self, state: Option<&Self::State>, signal: &Signal<Self::Action>) -> Self::State {
            (**self).reduce(state, signal)
        }
    }

    impl<R: Reducer + ?Sized> Reducer for std::sync::Arc<R> {
        type State = R::State;
        type Action = R::Action;

        fn reduce(&self, state: Option<&Self::State>, signal: &Signal<Self::Action>) -> Self::State {
            (**self).reduce(state, signal)
        }
    }

    /// A reducer backed by a closure
    ///
    /// Created by [`from_fn`].
    pub struct FnReducer<S, A, F> {
        f: F,
        _phantom: PhantomData<fn(Option<&S>, &Signal<A>) -> S>,
    }

    impl<S, A, F> Clone for FnReducer<S, A, F>
    where
        F: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                f: self.f.clone(),
                _phantom: PhantomData,
            }
        }
    }

    impl<S, A, F> std::fmt::Debug for FnReducer<S, A, F> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("FnReducer").finish_non_exhaustive()
        }
    }

    impl<S, A, F> Reducer for FnReducer<S, A, F>
    where
        F: Fn(Option<&S>, &Signal<A>) -> S,
    {
        type State = S;
        type Action = A;

        fn reduce(&self, state: Option<&S>, signal: &Signal<A>) -> S {
            (self.f)(state, signal)
        }
    }

    /// Adapt a closure into a [`Reducer`]
    ///
    /// # Example
    ///
    /// ```
    /// use unistore_core::{action::Signal, reducer::{from_fn, Reducer}};
    ///
    /// let adder = from_fn(|state: Option<&i32>, signal: &Signal<i32>| {
    ///     let total = state.copied().unwrap_or(0);
    ///     match signal.action() {
    ///         Some(amount) => total + amount,
    ///         None => total,
    ///     }
    /// });
    ///
    /// assert_eq!(adder.reduce(None, &Signal::Init), 0);
    /// assert_eq!(adder.reduce(Some(&2), &Signal::Action(3)), 5);
    /// ```
    pub const fn from_fn<S, A, F>(f: F) -> FnReducer<S, A, F>
    where
        F: Fn(Option<&S>, &Signal<A>) -> S,
    {
        FnReducer {
            f,
            _phantom: PhantomData,
        }
    }
}

/// Environment module - Dependency injection traits
///
/// Reducers stay pure: anything non-deterministic (time, IDs, I/O) is read
/// by a thunk from its environment and passed into an action payload.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use unistore_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let earlier = clock.now();
    /// assert!(clock.now() >= earlier);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
