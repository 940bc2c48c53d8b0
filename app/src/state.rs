//! Application state.
//!
//! Every field has a default so a preload file only needs the slices it
//! wants to override.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Root state held by the application store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppState {
    /// Counter slice
    pub counter: CounterState,
    /// Todo list slice
    pub todos: TodosState,
}

/// Counter slice
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterState {
    /// Current count value
    pub count: i64,
}

/// Todo list slice
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TodosState {
    /// Todos in insertion order
    pub items: Vec<Todo>,
    /// A load thunk is in flight
    pub loading: bool,
    /// Message from the last failed load
    pub error: Option<String>,
}

impl TodosState {
    /// Identifier the next added todo receives
    ///
    /// One past the highest id in use. When that would overflow, the lowest
    /// unused id from 1 up; `None` only if every id is taken.
    #[must_use]
    pub fn next_id(&self) -> Option<u64> {
        let Some(highest) = self.items.iter().map(|todo| todo.id).max() else {
            return Some(1);
        };

        highest.checked_add(1).or_else(|| {
            let used: HashSet<u64> = self.items.iter().map(|todo| todo.id).collect();
            (1..=u64::MAX).find(|id| !used.contains(id))
        })
    }

    /// Number of todos not yet done
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.items.iter().filter(|todo| !todo.done).count()
    }

    /// Look up a todo by id
    #[must_use]
    pub fn get(&self, id: u64) -> Option<&Todo> {
        self.items.iter().find(|todo| todo.id == id)
    }
}

/// A single todo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Unique within a list
    pub id: u64,
    /// What needs doing
    pub title: String,
    /// Whether it has been done
    #[serde(default)]
    pub done: bool,
    /// When it was added, taken from the adding thunk's clock
    pub created_at: DateTime<Utc>,
}
