//! Benchmarks for propagation ticks.
//!
//! Target: a tick over a fan-out of 64 children < 100μs

use arbor_state::{Action, StateStore, Value};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn bench_wide_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick/wide");

    for size in [4usize, 16, 64] {
        let store = StateStore::new();
        let parent = store.resolve("parent").unwrap();
        let keys: Vec<String> = (0..size).map(|i| format!("child{i}")).collect();
        let mut seed = Value::Null;
        for key in &keys {
            seed = seed.with_key(key.clone(), Value::Int(0));
        }
        parent.set_initial(seed).unwrap();
        for key in &keys {
            store.resolve(&format!("parent.{key}")).unwrap();
        }

        let set = Action::new();
        let hook_keys = keys.clone();
        parent.hook_reducers(&[&set]).next(move |current, payload| {
            let mut next = current.clone();
            for key in &hook_keys {
                next = next.with_key(key.clone(), payload.clone());
            }
            next
        });
        store.connect().unwrap();

        let mut n = 0i64;
        group.bench_with_input(BenchmarkId::new("fanout", size), &size, |b, _| {
            b.iter(|| {
                n += 1;
                set.emit(black_box(n)).unwrap();
            })
        });
    }

    group.finish();
}

fn bench_deep_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick/deep");

    for depth in [2usize, 8, 32] {
        let store = StateStore::new();
        let path: Vec<String> = (0..depth).map(|i| format!("n{i}")).collect();
        let leaf = store.resolve(&path.join(".")).unwrap();
        leaf.set_initial(0i64).unwrap();

        let set = Action::new();
        leaf.hook_reducers(&[&set])
            .next(|_, payload| payload.clone());
        store.connect().unwrap();

        let mut n = 0i64;
        group.bench_with_input(BenchmarkId::new("leaf_write", depth), &depth, |b, _| {
            b.iter(|| {
                n += 1;
                set.emit(black_box(n)).unwrap();
            })
        });
    }

    group.finish();
}

fn bench_notification(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick/notify");

    for subscribers in [1usize, 16, 128] {
        let store = StateStore::new();
        let counter = store.resolve("counter").unwrap();
        counter.set_initial(0i64).unwrap();

        let bump = Action::new();
        counter
            .hook_reducers(&[&bump])
            .next(|current, _| Value::Int(current.as_i64().unwrap_or(0) + 1));
        for _ in 0..subscribers {
            counter.subscribe(|value| {
                black_box(value);
            });
        }
        store.connect().unwrap();

        group.bench_with_input(
            BenchmarkId::new("subscribers", subscribers),
            &subscribers,
            |b, _| {
                b.iter(|| {
                    bump.emit(()).unwrap();
                })
            },
        );
    }

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    let store = StateStore::new();
    store.resolve("a.b.c.d").unwrap();

    group.bench_function("existing_path", |b| {
        b.iter(|| store.resolve(black_box("a.b.c.d")).unwrap())
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_wide_tick,
    bench_deep_tick,
    bench_notification,
    bench_resolve
);
criterion_main!(benches);
