//! Dispatch Performance Benchmarks
//!
//! These benchmarks track the cost of the store's write path:
//! - Reducer execution in isolation
//! - Dispatch through an empty and a populated middleware chain
//! - Listener fan-out after a transition
//! - Async thunk round trip on a current-thread runtime
//!
//! Run with: `cargo bench`

#![allow(missing_docs)] // Benchmarks don't need extensive docs
#![allow(clippy::expect_used)] // Benchmarks can use expect for setup
#![allow(clippy::unwrap_used)] // Benchmarks can use unwrap for setup

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::sync::Arc;
use unistore_core::action::{Action, Signal};
use unistore_core::reducer::Reducer;
use unistore_runtime::{
    Enhancer, LoggingMiddleware, Store, Thunk, ThunkMiddleware, apply_middleware, create_store,
};

// Test state
#[derive(Clone, Debug)]
struct BenchState {
    counter: i64,
    data: Vec<u8>, // For testing state size impact
}

impl Default for BenchState {
    fn default() -> Self {
        Self {
            counter: 0,
            data: vec![0; 1024], // 1KB of data
        }
    }
}

// Test actions
#[derive(Clone, Debug)]
enum BenchAction {
    Increment,
    SetValue(i64),
    NoOp,
}

impl Action for BenchAction {
    fn kind(&self) -> &'static str {
        match self {
            Self::Increment => "INCREMENT",
            Self::SetValue(_) => "SET_VALUE",
            Self::NoOp => "NOOP",
        }
    }
}

// Test reducer
#[derive(Clone)]
struct BenchReducer;

impl Reducer for BenchReducer {
    type State = BenchState;
    type Action = BenchAction;

    fn reduce(&self, state: Option<&BenchState>, signal: &Signal<BenchAction>) -> BenchState {
        let mut next = state.cloned().unwrap_or_default();
        match signal.action() {
            Some(BenchAction::Increment) => next.counter += 1,
            Some(BenchAction::SetValue(v)) => next.counter = *v,
            Some(BenchAction::NoOp) | None => {},
        }
        next
    }
}

/// Benchmark reducer execution in isolation (no Store overhead)
fn benchmark_reducer_execution(c: &mut Criterion) {
    let mut group = c.benchmark_group("reducer");
    group.throughput(Throughput::Elements(1));

    let reducer = BenchReducer;
    let state = BenchState::default();

    group.bench_function("increment", |b| {
        b.iter(|| reducer.reduce(Some(&state), &Signal::Action(black_box(BenchAction::Increment))));
    });

    group.bench_function("set_value", |b| {
        b.iter(|| reducer.reduce(Some(&state), &Signal::Action(black_box(BenchAction::SetValue(42)))));
    });

    group.finish();
}

/// Benchmark dispatch throughput (actions/sec) per middleware configuration
fn benchmark_dispatch_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_throughput");
    group.throughput(Throughput::Elements(1));

    group.bench_function("no_middleware", |b| {
        let store = create_store(BenchReducer, Enhancer::identity());
        b.iter(|| store.dispatch(black_box(BenchAction::Increment)).unwrap());
    });

    group.bench_function("thunk_middleware", |b| {
        let store = create_store(
            BenchReducer,
            apply_middleware(vec![Arc::new(ThunkMiddleware::new())]),
        );
        b.iter(|| store.dispatch(black_box(BenchAction::Increment)).unwrap());
    });

    group.bench_function("logging_and_thunk_middleware", |b| {
        let store = create_store(
            BenchReducer,
            apply_middleware(vec![
                Arc::new(LoggingMiddleware::new()),
                Arc::new(ThunkMiddleware::new()),
            ]),
        );
        b.iter(|| store.dispatch(black_box(BenchAction::Increment)).unwrap());
    });

    group.bench_function("dispatch_and_read_state", |b| {
        let store = create_store(BenchReducer, Enhancer::identity());
        b.iter(|| {
            store.dispatch(black_box(BenchAction::Increment)).unwrap();
            store.state(|s| s.counter)
        });
    });

    group.finish();
}

/// Benchmark listener notification cost
fn benchmark_listener_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("listener_fanout");

    for listeners in [1_usize, 10, 100] {
        group.throughput(Throughput::Elements(listeners as u64));
        group.bench_function(format!("{listeners}_listeners"), |b| {
            let store = create_store(BenchReducer, Enhancer::identity());
            let subscriptions: Vec<_> = (0..listeners)
                .map(|_| {
                    store
                        .subscribe(|state: &BenchState| {
                            black_box(state.data.len());
                        })
                        .unwrap()
                })
                .collect();

            b.iter(|| store.dispatch(black_box(BenchAction::NoOp)).unwrap());
            drop(subscriptions);
        });
    }

    group.finish();
}

/// Benchmark the async thunk round trip: spawn, dispatch inside, await
fn benchmark_async_thunk(c: &mut Criterion) {
    let mut group = c.benchmark_group("async_thunk");
    group.throughput(Throughput::Elements(1));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build runtime");

    let store: Store<BenchState, BenchAction> = create_store(
        BenchReducer,
        apply_middleware(vec![Arc::new(ThunkMiddleware::new())]),
    );

    group.bench_function("spawn_and_settle", |b| {
        b.to_async(&runtime).iter(|| async {
            let thunk = Thunk::future("bench", |store: Store<BenchState, BenchAction>| async move {
                store.dispatch(BenchAction::Increment)?;
                Ok(())
            });
            store.dispatch_thunk(thunk).unwrap().settled().await.unwrap();
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_reducer_execution,
    benchmark_dispatch_throughput,
    benchmark_listener_fanout,
    benchmark_async_thunk,
);
criterion_main!(benches);
