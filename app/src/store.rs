//! Store assembly.
//!
//! [`STORE`] is the process-wide store: the root reducer wrapped in the
//! thunk middleware, configured from the environment. [`configure_store`]
//! builds the same store with a preloaded state, custom configuration and
//! dispatch logging.

use crate::actions::AppAction;
use crate::reducer::root_reducer;
use crate::state::AppState;
use anyhow::Context;
use std::path::Path;
use std::sync::{Arc, LazyLock};
use unistore_runtime::{
    LoggingMiddleware, Store, StoreConfig, StoreError, Thunk, ThunkMiddleware, apply_middleware,
    create_store,
};

/// Store type used across the application
pub type AppStore = Store<AppState, AppAction>;

/// Thunk type accepted by [`AppStore`]
pub type AppThunk = Thunk<AppState, AppAction>;

/// Environment variable naming a JSON file with the state to preload
pub const ENV_STATE_FILE: &str = "UNISTORE_STATE_FILE";

/// The application store
///
/// Reads `UNISTORE_*` configuration on first use; see [`config_from_lookup`].
pub static STORE: LazyLock<AppStore> =
    LazyLock::new(|| store_with_config(config_from_lookup(|key| std::env::var(key).ok())));

/// Store configuration from a key lookup, falling back to the defaults
///
/// An invalid value is logged and the whole configuration is replaced by
/// [`StoreConfig::default`].
pub fn config_from_lookup<F>(lookup: F) -> StoreConfig
where
    F: Fn(&str) -> Option<String>,
{
    StoreConfig::from_lookup(lookup).unwrap_or_else(|error| {
        tracing::warn!(%error, "Ignoring store configuration from the environment");
        StoreConfig::default()
    })
}

/// The root reducer wrapped in the thunk middleware, with `config`
///
/// Falls back to the default configuration if `config` does not validate.
#[must_use]
pub fn store_with_config(config: StoreConfig) -> AppStore {
    Store::builder()
        .reducer(root_reducer())
        .enhancer(apply_middleware(vec![Arc::new(ThunkMiddleware::new())]))
        .config(config)
        .build()
        .unwrap_or_else(|error| {
            tracing::warn!(%error, "Falling back to the default store configuration");
            create_store(
                root_reducer(),
                apply_middleware(vec![Arc::new(ThunkMiddleware::new())]),
            )
        })
}

/// Build a dedicated application store
///
/// # Errors
///
/// Returns [`StoreError::InvalidConfig`] if `config` fails validation.
pub fn configure_store(
    preloaded_state: Option<AppState>,
    config: StoreConfig,
) -> Result<AppStore, StoreError> {
    let builder = Store::builder()
        .reducer(root_reducer())
        .enhancer(apply_middleware(vec![
            Arc::new(LoggingMiddleware::new()),
            Arc::new(ThunkMiddleware::new()),
        ]))
        .config(config);

    let builder = match preloaded_state {
        Some(state) => builder.preloaded_state(state),
        None => builder,
    };
    builder.build()
}

/// Read a preloaded [`AppState`] from a JSON file
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not parse.
pub async fn load_state_file(path: impl AsRef<Path>) -> anyhow::Result<AppState> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read state file {}", path.display()))?;
    let state = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse state file {}", path.display()))?;
    tracing::info!(path = %path.display(), "Loaded preloaded state");
    Ok(state)
}
