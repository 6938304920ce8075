//! Benchmarks for occurrence calculation and dispatch.
//!
//! Benchmarks cover:
//! - `compute_next` per repeat policy
//! - `upcoming` calendar expansion
//! - A dispatcher tick over a populated registry

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use prometheus_reminders::core::{
    compute_next, upcoming, EntryDraft, InMemoryNotifier, NotifierConfig, ReminderDispatcher,
    RepeatPolicy, ScheduleRegistry, TimeOfDay,
};
use prometheus_reminders::util::ManualClock;

fn anchor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
}

fn reference() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 15).unwrap().and_hms_opt(13, 37, 0).unwrap()
}

fn times() -> Vec<TimeOfDay> {
    ["08:00", "13:00", "20:00"].iter().map(|t| t.parse().unwrap()).collect()
}

fn bench_compute_next(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_next");
    let times = times();
    for policy in [RepeatPolicy::Once, RepeatPolicy::Daily, RepeatPolicy::Weekly, RepeatPolicy::Monthly] {
        group.bench_with_input(BenchmarkId::from_parameter(policy), &policy, |b, &policy| {
            b.iter(|| compute_next(black_box(&times), policy, anchor(), black_box(reference())));
        });
    }
    group.finish();
}

fn bench_upcoming(c: &mut Criterion) {
    let mut group = c.benchmark_group("upcoming");
    let times = times();
    for limit in [10_usize, 100, 1000] {
        group.throughput(Throughput::Elements(limit as u64));
        group.bench_with_input(BenchmarkId::from_parameter(limit), &limit, |b, &limit| {
            b.iter(|| upcoming(&times, RepeatPolicy::Monthly, anchor(), reference(), black_box(limit)));
        });
    }
    group.finish();
}

fn bench_dispatcher_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatcher_tick");
    for size in [10_u64, 100, 1000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_batched(
                || {
                    let start = reference() - Duration::days(1);
                    let registry = Arc::new(ScheduleRegistry::new(Arc::new(ManualClock::new(start))));
                    for i in 0..size {
                        registry
                            .add(EntryDraft::new(format!("entry-{i}"), times(), RepeatPolicy::Daily, anchor()))
                            .unwrap();
                    }
                    let dispatcher = ReminderDispatcher::new(
                        registry,
                        Box::new(InMemoryNotifier::new()),
                        NotifierConfig::default(),
                    );
                    dispatcher.init().unwrap();
                    dispatcher
                },
                |dispatcher| black_box(dispatcher.tick(reference()).unwrap()),
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compute_next, bench_upcoming, bench_dispatcher_tick);
criterion_main!(benches);
