//! Application binary
//!
//! Runs a short session against the application store and prints each
//! transition.

use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use unistore_app::thunks::{
    ENV_TODOS_FILE, JsonFileTodoSource, StaticTodoSource, TodoSource, add_todo, increment_if_odd,
    load_todos,
};
use unistore_app::{AppAction, AppStore, STORE, configure_store, load_state_file, store::ENV_STATE_FILE};
use unistore_core::environment::SystemClock;
use unistore_runtime::StoreConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "unistore_app=debug,unistore_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    unistore_runtime::metrics::describe_metrics();

    let store: AppStore = match std::env::var_os(ENV_STATE_FILE) {
        Some(path) => {
            let preloaded = load_state_file(&path).await?;
            let config = StoreConfig::from_env().context("Invalid store configuration")?;
            configure_store(Some(preloaded), config)?
        },
        // STORE reads the same UNISTORE_* variables, warning on invalid ones
        None => STORE.clone(),
    };
    tracing::info!(store = %store.config().name, "Store ready");

    println!("=== unistore session ===\n");
    println!("Initial count: {}", store.state(|s| s.counter.count));

    let subscription = store.subscribe(|state| {
        println!(
            "  -> count = {}, todos = {} ({} remaining)",
            state.counter.count,
            state.todos.items.len(),
            state.todos.remaining()
        );
    })?;

    for action in [AppAction::Increment, AppAction::Increment, AppAction::Decrement] {
        println!("\n>>> Dispatching: {action:?}");
        store.dispatch(action)?;
    }

    println!("\n>>> Dispatching thunk: increment_if_odd");
    store.dispatch_thunk(increment_if_odd())?;

    println!("\n>>> Dispatching thunk: add_todo");
    store.dispatch_thunk(add_todo(Arc::new(SystemClock), "Write the release notes"))?;

    let source: Arc<dyn TodoSource> = match std::env::var_os(ENV_TODOS_FILE) {
        Some(path) => Arc::new(JsonFileTodoSource::new(path)),
        None => Arc::new(StaticTodoSource::new(store.state(|s| s.todos.items.clone()))),
    };

    println!("\n>>> Dispatching async thunk: load_todos");
    if let Err(error) = store.dispatch_thunk(load_todos(source))?.settled().await {
        println!("Loading todos failed: {error}");
    }

    subscription.unsubscribe();

    let state = store.get_state();
    println!("\nFinal state:\n{}", serde_json::to_string_pretty(&*state)?);

    Ok(())
}
