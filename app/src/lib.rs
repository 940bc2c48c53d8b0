//! # Unistore App
//!
//! The application store: state, actions, the root reducer, thunks, and the
//! process-wide [`STORE`] built from
//! `create_store(root_reducer(), apply_middleware([thunk]))`.
//!
//! ## Example
//!
//! ```
//! use unistore_app::{AppAction, STORE};
//!
//! STORE.dispatch(AppAction::Increment)?;
//! assert!(STORE.state(|s| s.counter.count) >= 1);
//! # Ok::<(), unistore_runtime::StoreError>(())
//! ```

pub mod actions;
pub mod reducer;
pub mod state;
pub mod store;
pub mod thunks;

pub use actions::AppAction;
pub use reducer::root_reducer;
pub use state::{AppState, CounterState, Todo, TodosState};
pub use store::{
    AppStore, AppThunk, STORE, config_from_lookup, configure_store, load_state_file,
    store_with_config,
};
