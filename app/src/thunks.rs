//! Thunks: the only place the application touches time and I/O.
//!
//! Each function returns an [`AppThunk`] ready for
//! [`Store::dispatch_thunk`](unistore_runtime::Store::dispatch_thunk). The
//! store's thunk middleware runs the sync ones inline and spawns the async
//! ones on the current tokio runtime.

use crate::actions::AppAction;
use crate::state::Todo;
use crate::store::{AppStore, AppThunk};
use anyhow::Context;
use futures::future::BoxFuture;
use std::path::PathBuf;
use std::sync::Arc;
use unistore_core::environment::Clock;
use unistore_runtime::StoreError;

/// Environment variable naming a JSON file of todos for [`load_todos`]
pub const ENV_TODOS_FILE: &str = "UNISTORE_TODOS_FILE";

/// Where [`load_todos`] gets its data from
pub trait TodoSource: Send + Sync {
    /// Fetch the full todo list
    fn fetch(&self) -> BoxFuture<'static, anyhow::Result<Vec<Todo>>>;
}

/// A fixed in-memory list
#[derive(Debug, Clone, Default)]
pub struct StaticTodoSource {
    todos: Vec<Todo>,
}

impl StaticTodoSource {
    /// Serve `todos` on every fetch
    #[must_use]
    pub const fn new(todos: Vec<Todo>) -> Self {
        Self { todos }
    }
}

impl TodoSource for StaticTodoSource {
    fn fetch(&self) -> BoxFuture<'static, anyhow::Result<Vec<Todo>>> {
        let todos = self.todos.clone();
        Box::pin(async move { Ok(todos) })
    }
}

/// A JSON array of todos on disk
#[derive(Debug, Clone)]
pub struct JsonFileTodoSource {
    path: PathBuf,
}

impl JsonFileTodoSource {
    /// Read todos from `path` on every fetch
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TodoSource for JsonFileTodoSource {
    fn fetch(&self) -> BoxFuture<'static, anyhow::Result<Vec<Todo>>> {
        let path = self.path.clone();
        Box::pin(async move {
            let raw = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read todos from {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse todos from {}", path.display()))
        })
    }
}

/// Increment the counter only when it is currently odd
#[must_use]
pub fn increment_if_odd() -> AppThunk {
    AppThunk::new("counter/increment_if_odd", |store: &AppStore| {
        if store.state(|s| s.counter.count % 2 != 0) {
            store.dispatch(AppAction::Increment)?;
        }
        Ok(())
    })
}

/// Add a todo stamped with `clock`'s current time
///
/// Blank titles are rejected without dispatching anything.
#[must_use]
pub fn add_todo(clock: Arc<dyn Clock>, title: impl Into<String>) -> AppThunk {
    let title = title.into();
    AppThunk::new("todos/add", move |store: &AppStore| {
        let title = title.trim();
        if title.is_empty() {
            return Err(StoreError::Thunk(anyhow::anyhow!("todo title must not be blank")));
        }

        store.dispatch(AppAction::TodoAdded {
            title: title.to_string(),
            created_at: clock.now(),
        })?;
        Ok(())
    })
}

/// Load the todo list from `source`
///
/// Dispatches `TodosRequested`, then `TodosLoaded` or `TodosFailed`. A
/// failed fetch is also returned from the thunk so callers awaiting the
/// handle see it.
#[must_use]
pub fn load_todos(source: Arc<dyn TodoSource>) -> AppThunk {
    AppThunk::future("todos/load", move |store: AppStore| async move {
        store.dispatch(AppAction::TodosRequested)?;

        match source.fetch().await {
            Ok(todos) => {
                tracing::debug!(count = todos.len(), "Todos fetched");
                store.dispatch(AppAction::TodosLoaded(todos))?;
                Ok(())
            },
            Err(error) => {
                store.dispatch(AppAction::TodosFailed(format!("{error:#}")))?;
                Err(StoreError::Thunk(error))
            },
        }
    })
}
