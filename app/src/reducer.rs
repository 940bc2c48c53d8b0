//! Root reducer: one slice reducer per field of [`AppState`], scoped and
//! combined.

use crate::actions::AppAction;
use crate::state::{AppState, CounterState, Todo, TodosState};
use unistore_core::action::Signal;
use unistore_core::composition::{CombinedSlices, combine_slices, scope_reducer};
use unistore_core::reducer::from_fn;

/// Reducer type held by the application store
pub type RootReducer = CombinedSlices<AppState, AppAction>;

/// Build the root reducer
#[must_use]
pub fn root_reducer() -> RootReducer {
    combine_slices(vec![
        Box::new(scope_reducer(from_fn(counter), counter_slice, set_counter)),
        Box::new(scope_reducer(from_fn(todos), todos_slice, set_todos)),
    ])
}

/// Counter slice reducer
#[must_use]
pub fn counter(state: Option<&CounterState>, signal: &Signal<AppAction>) -> CounterState {
    let count = state.map_or(0, |s| s.count);
    let count = match signal.action() {
        Some(AppAction::Increment) => count.saturating_add(1),
        Some(AppAction::Decrement) => count.saturating_sub(1),
        Some(AppAction::Reset) => 0,
        _ => count,
    };
    CounterState { count }
}

/// Todo list slice reducer
#[must_use]
pub fn todos(state: Option<&TodosState>, signal: &Signal<AppAction>) -> TodosState {
    let Some(action) = signal.action() else {
        return state.cloned().unwrap_or_default();
    };

    let mut next = state.cloned().unwrap_or_default();
    match action {
        AppAction::TodoAdded { title, created_at } => match next.next_id() {
            Some(id) => next.items.push(Todo {
                id,
                title: title.clone(),
                done: false,
                created_at: *created_at,
            }),
            None => tracing::warn!(%title, "No free todo id left; add ignored"),
        },
        AppAction::TodoToggled(id) => {
            if let Some(todo) = next.items.iter_mut().find(|todo| todo.id == *id) {
                todo.done = !todo.done;
            }
        },
        AppAction::TodoRemoved(id) => next.items.retain(|todo| todo.id != *id),
        AppAction::TodosRequested => {
            next.loading = true;
            next.error = None;
        },
        AppAction::TodosLoaded(items) => {
            next.loading = false;
            next.items.clone_from(items);
        },
        AppAction::TodosFailed(error) => {
            next.loading = false;
            next.error = Some(error.clone());
        },
        AppAction::Increment | AppAction::Decrement | AppAction::Reset => {},
    }
    next
}

const fn counter_slice(state: &AppState) -> &CounterState {
    &state.counter
}

fn set_counter(state: &mut AppState, counter: CounterState) {
    state.counter = counter;
}

const fn todos_slice(state: &AppState) -> &TodosState {
    &state.todos
}

fn set_todos(state: &mut AppState, todos: TodosState) {
    state.todos = todos;
}
