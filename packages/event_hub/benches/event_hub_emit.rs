//! Benchmarking the registration and dispatch of events.

#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use event_hub::{DispatchMode, EventHub, Listener};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

fn entrypoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_hub_emit");

    // No listeners registered - only name validation and lookup.
    let empty = EventHub::<u64>::new();
    group.bench_function("emit_no_listeners", |b| {
        b.iter(|| empty.emit(black_box("tick"), black_box(1)).unwrap());
    });

    // One listener on an unrestricted hub.
    let one = EventHub::<u64>::new();
    one.on(
        "tick",
        Listener::new(|value: &u64| {
            black_box(value);
        }),
    )
    .unwrap();
    group.bench_function("emit_1_listener", |b| {
        b.iter(|| one.emit(black_box("tick"), black_box(1)).unwrap());
    });

    // Ten listeners, so the snapshot cost shows.
    let ten = EventHub::<u64>::new();
    for _ in 0..10 {
        ten.on(
            "tick",
            Listener::new(|value: &u64| {
                black_box(value);
            }),
        )
        .unwrap();
    }
    group.bench_function("emit_10_listeners", |b| {
        b.iter(|| ten.emit(black_box("tick"), black_box(1)).unwrap());
    });

    // Allow-list lookup on top of the dispatch.
    let restricted = EventHub::<u64>::with_allowed_events(["tick", "tock", "stop"]).unwrap();
    restricted
        .on(
            "tick",
            Listener::new(|value: &u64| {
                black_box(value);
            }),
        )
        .unwrap();
    group.bench_function("emit_1_listener_allow_list", |b| {
        b.iter(|| restricted.emit(black_box("tick"), black_box(1)).unwrap());
    });

    // Queue and drain one deferred dispatch.
    let deferred = EventHub::<u64>::builder()
        .dispatch_mode(DispatchMode::Deferred)
        .build()
        .unwrap();
    deferred
        .on(
            "tick",
            Listener::new(|value: &u64| {
                black_box(value);
            }),
        )
        .unwrap();
    group.bench_function("emit_deferred_and_drain", |b| {
        b.iter(|| {
            deferred.emit(black_box("tick"), black_box(1)).unwrap();
            deferred.run_deferred().unwrap()
        });
    });

    // Full one-shot cycle: register, fire, deregister.
    let once = EventHub::<u64>::new();
    group.bench_function("once_register_and_fire", |b| {
        b.iter(|| {
            once.once(
                "tick",
                Listener::new(|value: &u64| {
                    black_box(value);
                }),
            )
            .unwrap();
            once.emit(black_box("tick"), black_box(1)).unwrap()
        });
    });

    // Full race cycle through the callback form.
    let race = EventHub::<u64>::new();
    group.bench_function("callback_once_settle", |b| {
        b.iter(|| {
            race.callback_once("ok", "err", |outcome| {
                black_box(outcome);
            })
            .unwrap();
            race.emit(black_box("ok"), black_box(1)).unwrap()
        });
    });

    group.finish();
}
