//! Application actions.

use crate::state::Todo;
use chrono::{DateTime, Utc};
use unistore_core::action::Action;

/// Everything that can happen to [`AppState`](crate::state::AppState)
///
/// Payloads carry every non-deterministic input (timestamps, loaded data)
/// so the reducers stay pure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Increment the counter by 1
    Increment,
    /// Decrement the counter by 1
    Decrement,
    /// Reset the counter to 0
    Reset,
    /// Append a todo
    TodoAdded {
        /// Title of the new todo
        title: String,
        /// Creation time, read from a clock by the dispatching thunk
        created_at: DateTime<Utc>,
    },
    /// Flip a todo's done flag
    TodoToggled(u64),
    /// Remove a todo
    TodoRemoved(u64),
    /// A load started
    TodosRequested,
    /// A load finished; replaces the list
    TodosLoaded(Vec<Todo>),
    /// A load failed
    TodosFailed(String),
}

impl Action for AppAction {
    fn kind(&self) -> &'static str {
        match self {
            Self::Increment => "counter/increment",
            Self::Decrement => "counter/decrement",
            Self::Reset => "counter/reset",
            Self::TodoAdded { .. } => "todos/added",
            Self::TodoToggled(_) => "todos/toggled",
            Self::TodoRemoved(_) => "todos/removed",
            Self::TodosRequested => "todos/requested",
            Self::TodosLoaded(_) => "todos/loaded",
            Self::TodosFailed(_) => "todos/failed",
        }
    }
}
