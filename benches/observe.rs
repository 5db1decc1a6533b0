//! Benchmarks for deep-observe
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use deep_observe::{array, attach, object, wrap, Array, ChangeNotifier, Object, Value};

fn wide_object(fields: usize) -> Object {
    (0..fields)
        .map(|i| (format!("f{i}"), Value::from(object! { "id" => i, "tags" => array!["a"] })))
        .collect()
}

// =============================================================================
// WRAP BENCHMARKS
// =============================================================================

fn bench_wrap_wide(c: &mut Criterion) {
    let mut group = c.benchmark_group("wrap_wide");
    for fields in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(fields), &fields, |b, &fields| {
            b.iter_batched(
                || wide_object(fields),
                |object| black_box(wrap(object, ChangeNotifier::noop())),
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_wrap_deep(c: &mut Criterion) {
    c.bench_function("wrap_deep_100", |b| {
        b.iter_batched(
            || {
                let root = Object::new();
                let mut cursor = root.clone();
                for _ in 0..100 {
                    let next = Object::new();
                    let _ = cursor.set("next", next.clone());
                    cursor = next;
                }
                root
            },
            |root| black_box(wrap(root, ChangeNotifier::noop())),
            criterion::BatchSize::SmallInput,
        )
    });
}

// =============================================================================
// WRITE BENCHMARKS
// =============================================================================

fn bench_set_primitive(c: &mut Criterion) {
    let state = wrap(object! { "count" => 0 }, ChangeNotifier::noop());
    let node = state.as_node().cloned().expect("objects wrap to nodes");
    c.bench_function("set_primitive", |b| {
        b.iter(|| node.set("count", black_box(42)))
    });
}

fn bench_set_nullish(c: &mut Criterion) {
    let state = wrap(object! { "count" => 0 }, ChangeNotifier::noop());
    let node = state.as_node().cloned().expect("objects wrap to nodes");
    c.bench_function("set_nullish", |b| {
        b.iter(|| node.set("count", black_box(Value::Null)))
    });
}

fn bench_push(c: &mut Criterion) {
    c.bench_function("push_1000", |b| {
        b.iter_batched(
            || wrap(Array::new(), ChangeNotifier::noop()),
            |list| {
                if let Some(node) = list.as_node() {
                    for i in 0..1000 {
                        let _ = node.push(i);
                    }
                }
                list
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_sort(c: &mut Criterion) {
    c.bench_function("sort_1000", |b| {
        b.iter_batched(
            || wrap((0..1000).rev().collect::<Array>(), ChangeNotifier::noop()),
            |list| {
                if let Some(node) = list.as_node() {
                    let _ = node.sort();
                }
                list
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

// =============================================================================
// LIFECYCLE BENCHMARKS
// =============================================================================

fn bench_attach_detach(c: &mut Criterion) {
    c.bench_function("attach_detach", |b| {
        b.iter_batched(
            || wide_object(10),
            |host| {
                if let Ok(root) = attach(host, ChangeNotifier::noop()) {
                    root.detach();
                }
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(wrap_benches, bench_wrap_wide, bench_wrap_deep);
criterion_group!(write_benches, bench_set_primitive, bench_set_nullish, bench_push, bench_sort);
criterion_group!(lifecycle_benches, bench_attach_detach);

criterion_main!(wrap_benches, write_benches, lifecycle_benches);
