//! Integration tests for the assembled application store

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use unistore_app::thunks::{StaticTodoSource, add_todo, load_todos};
use unistore_app::{
    AppAction, AppState, STORE, Todo, config_from_lookup, configure_store, root_reducer,
};
use unistore_core::environment::Clock;
use unistore_runtime::{Store, StoreConfig, ThunkMiddleware};
use unistore_testing::properties::{action_sequence, replay};
use unistore_testing::{RecordingMiddleware, ReducerTest, assertions, test_clock};

// ============================================================================
// Singleton
// ============================================================================

// The only test touching STORE: it is shared by every test in this binary.
#[test]
fn test_singleton_is_shared_across_threads() {
    let before = STORE.state(|s| s.counter.count);

    std::thread::spawn(|| {
        STORE.dispatch(AppAction::Increment).unwrap();
    })
    .join()
    .expect("dispatching thread panicked");

    assert_eq!(STORE.state(|s| s.counter.count), before + 1);
    let expected = config_from_lookup(|key| std::env::var(key).ok());
    assert_eq!(*STORE.config(), expected);
}

// ============================================================================
// Reducer
// ============================================================================

#[test]
fn test_root_reducer_initial_state() {
    assertions::assert_initial_state(&root_reducer(), &AppState::default());
}

#[test]
fn test_counter_scenario() {
    ReducerTest::new(root_reducer())
        .when_action(AppAction::Increment)
        .when_action(AppAction::Increment)
        .when_action(AppAction::Increment)
        .then_state(|state| assert_eq!(state.counter.count, 3))
        .then_state(|state| assert!(state.todos.items.is_empty()))
        .run();
}

#[test]
fn test_unknown_todo_is_ignored() {
    let state = ReducerTest::new(root_reducer())
        .when_action(AppAction::TodoAdded {
            title: "milk".to_string(),
            created_at: test_clock().now(),
        })
        .run();

    assertions::assert_state_unchanged(&root_reducer(), &state, AppAction::TodoToggled(99));
    assertions::assert_state_unchanged(&root_reducer(), &state, AppAction::TodoRemoved(99));
}

#[test]
fn test_preloaded_max_id_keeps_ids_unique() {
    let preloaded: AppState = serde_json::from_str(&format!(
        r#"{{ "todos": {{ "items": [
            {{ "id": {}, "title": "imported", "created_at": "2025-01-01T00:00:00Z" }}
        ] }} }}"#,
        u64::MAX
    ))
    .unwrap();
    let store = configure_store(Some(preloaded), StoreConfig::default()).unwrap();

    for title in ["milk", "eggs"] {
        store
            .dispatch(AppAction::TodoAdded {
                title: title.to_string(),
                created_at: test_clock().now(),
            })
            .unwrap();
    }

    let ids: Vec<u64> = store.state(|s| s.todos.items.iter().map(|todo| todo.id).collect());
    assert_eq!(ids, vec![u64::MAX, 1, 2]);
}

fn app_action() -> impl Strategy<Value = AppAction> {
    prop_oneof![
        Just(AppAction::Increment),
        Just(AppAction::Decrement),
        Just(AppAction::Reset),
        "[a-z]{1,8}".prop_map(|title| AppAction::TodoAdded {
            title,
            created_at: test_clock().now(),
        }),
        (1_u64..6).prop_map(AppAction::TodoToggled),
        (1_u64..6).prop_map(AppAction::TodoRemoved),
    ]
}

proptest! {
    #[test]
    fn prop_store_matches_replay(actions in action_sequence(app_action(), 32)) {
        let store = configure_store(None, StoreConfig::default()).unwrap();
        for action in actions.clone() {
            store.dispatch(action).unwrap();
        }

        prop_assert_eq!(&*store.get_state(), &replay(&root_reducer(), None, actions));
    }

    #[test]
    fn prop_todo_ids_stay_unique(actions in action_sequence(app_action(), 32)) {
        let state = replay(&root_reducer(), None, actions);
        let ids: HashSet<u64> = state.todos.items.iter().map(|todo| todo.id).collect();
        prop_assert_eq!(ids.len(), state.todos.items.len());
    }
}

// ============================================================================
// Thunks through the assembled store
// ============================================================================

#[test]
fn test_thunks_dispatch_plain_actions() {
    let recorder = RecordingMiddleware::new();
    let store: Store<AppState, AppAction> = Store::builder()
        .reducer(root_reducer())
        .middleware(recorder.clone())
        .middleware(ThunkMiddleware::new())
        .build()
        .unwrap();

    store
        .dispatch_thunk(add_todo(Arc::new(test_clock()), "milk"))
        .unwrap();

    assertions::assert_kinds(&recorder.kinds(), &["todos/add", "todos/added"]);
    assert_eq!(store.state(|s| s.todos.items[0].created_at), test_clock().now());
}

#[test]
fn test_load_todos_replaces_list() {
    let store = configure_store(None, StoreConfig::default()).unwrap();
    store
        .dispatch_thunk(add_todo(Arc::new(test_clock()), "stale"))
        .unwrap();

    let fresh = vec![Todo {
        id: 10,
        title: "fresh".to_string(),
        done: true,
        created_at: test_clock().now(),
    }];

    tokio_test::block_on(async {
        store
            .dispatch_thunk(load_todos(Arc::new(StaticTodoSource::new(fresh.clone()))))
            .unwrap()
            .settled()
            .await
            .unwrap();
    });

    let todos = store.state(|s| s.todos.clone());
    assert_eq!(todos.items, fresh);
    assert_eq!(todos.next_id(), Some(11));
    assert_eq!(todos.remaining(), 0);
}
