// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cached description reads versus rendering from scratch.

use std::sync::Arc;
use std::thread;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use errata_error::{Domain, ErrataError, Section, declare_kinds};
use errata_template::{Arguments, Engine, NullSink, Value};

const SVC: Domain = Domain::from_static("svc", "Service");
const CACHE: Section = Section::from_static("cache", "Cache");

declare_kinds! {
    domain: SVC, section: CACHE;

    MISS = "Miss" {
        title: "Cache miss",
        friendly: "No entry for {{quote key}} in {{#join tiers}}{{this}}{{/join}}.",
        technical: "miss {{pre key}} tiers={{tiers}}",
    }
}

fn error() -> ErrataError {
    ErrataError::new(&MISS)
        .with_engine(Arc::new(Engine::builder().sink(NullSink).build()))
        .with_argument("key", "user:42")
        .with_argument("tiers", vec!["l1", "l2", "remote"])
}

fn bench_cached_read(c: &mut Criterion) {
    let err = error();
    err.description().friendly();
    c.bench_function("description_cached_read", |b| {
        b.iter(|| black_box(err.description().friendly().len()));
    });
}

fn bench_uncached_render(c: &mut Criterion) {
    let engine = Engine::builder().sink(NullSink).build();
    let mut args = Arguments::new();
    args.insert("key".into(), Value::from("user:42"));
    args.insert("tiers".into(), Value::from(vec!["l1", "l2", "remote"]));
    let source = MISS.friendly();
    c.bench_function("description_render_every_time", |b| {
        b.iter(|| black_box(engine.render_or_raw(source, &args)));
    });
}

fn bench_shared_clones(c: &mut Criterion) {
    c.bench_function("description_clones_across_threads", |b| {
        b.iter_batched(
            error,
            |err| {
                thread::scope(|s| {
                    for _ in 0..4 {
                        let err = err.clone();
                        s.spawn(move || black_box(err.description().friendly().len()));
                    }
                });
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_cached_read,
    bench_uncached_render,
    bench_shared_clones
);
criterion_main!(benches);
