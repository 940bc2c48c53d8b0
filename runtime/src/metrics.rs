//! Metric names recorded by the store.
//!
//! The store records through the [`metrics`] facade only; installing a
//! recorder/exporter is up to the application. Call [`describe_metrics`] once
//! after installing one so the descriptions show up.

use metrics::{Unit, describe_counter, describe_histogram};

// Re-export metrics macros for use in other modules
pub use metrics::{counter, histogram};

/// Dispatches entering the middleware chain
pub const DISPATCH_TOTAL: &str = "unistore.dispatch.total";

/// Dispatches rejected before reaching the reducer (re-entrancy, depth, unhandled thunks)
pub const DISPATCH_REJECTED: &str = "unistore.dispatch.rejected";

/// Reducer execution time
pub const REDUCER_DURATION: &str = "unistore.reducer.duration_seconds";

/// Listener invocations after a state replacement
pub const LISTENERS_NOTIFIED: &str = "unistore.listeners.notified";

/// Async thunks spawned by the thunk middleware
pub const THUNKS_SPAWNED: &str = "unistore.thunks.spawned";

/// Register descriptions for every store metric.
pub fn describe_metrics() {
    describe_counter!(
        DISPATCH_TOTAL,
        "Total number of dispatches entering the middleware chain"
    );
    describe_counter!(
        DISPATCH_REJECTED,
        "Dispatches rejected before reaching the reducer"
    );
    describe_histogram!(
        REDUCER_DURATION,
        Unit::Seconds,
        "Time spent inside the reducer per transition"
    );
    describe_counter!(
        LISTENERS_NOTIFIED,
        "Listener invocations after state replacement"
    );
    describe_counter!(THUNKS_SPAWNED, "Async thunks spawned on the tokio runtime");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_without_recorder_is_noop() {
        // No recorder installed: the facade silently drops descriptions
        describe_metrics();
        counter!(DISPATCH_TOTAL).increment(1);
    }

    #[test]
    fn test_metric_names_are_namespaced() {
        for name in [
            DISPATCH_TOTAL,
            DISPATCH_REJECTED,
            REDUCER_DURATION,
            LISTENERS_NOTIFIED,
            THUNKS_SPAWNED,
        ] {
            assert!(name.starts_with("unistore."), "{name}");
        }
    }
}
