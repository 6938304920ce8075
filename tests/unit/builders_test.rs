//! Tests for builder modules

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use prometheus_reminders::builders::{build_engine, build_engine_with_notifier};
use prometheus_reminders::config::{EngineConfig, NotifierBackendConfig, StoreBackendConfig};
use prometheus_reminders::core::{DispatcherState, EntryDraft, InMemoryNotifier, RepeatPolicy};
use prometheus_reminders::util::{ClockSource, ManualClock};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

fn at(h: u32, m: u32) -> NaiveDateTime {
    day().and_hms_opt(h, m, 0).unwrap()
}

fn temp_dir() -> std::path::PathBuf {
    std::env::temp_dir().join(format!("reminders-builder-{}", uuid::Uuid::new_v4()))
}

#[test]
fn test_build_engine_defaults() {
    let engine = build_engine(EngineConfig::default(), Arc::new(ManualClock::new(at(7, 0)))).unwrap();
    assert!(engine.registry.is_empty());
    assert_eq!(engine.dispatcher.state(), DispatcherState::Created);
    assert!(engine.audit.is_some());
    assert!(engine.notifier.is_none());
    engine.init().unwrap();
    assert_eq!(engine.dispatcher.state(), DispatcherState::Ready);
}

#[test]
fn test_build_engine_rejects_invalid_config() {
    let cfg = EngineConfig {
        tick_interval_secs: 0,
        ..EngineConfig::default()
    };
    assert!(build_engine(cfg, Arc::new(ManualClock::new(at(7, 0)))).is_err());
}

#[test]
fn test_build_engine_without_audit() {
    let cfg = EngineConfig {
        audit_capacity: 0,
        notifier: NotifierBackendConfig::InMemory,
        ..EngineConfig::default()
    };
    let engine = build_engine(cfg, Arc::new(ManualClock::new(at(7, 0)))).unwrap();
    assert!(engine.audit.is_none());
    assert!(engine.audit_events().is_empty());
    assert!(engine.notifier.is_some());
}

#[test]
fn test_build_engine_with_custom_notifier() {
    let notifier = InMemoryNotifier::new();
    let engine = build_engine_with_notifier(
        EngineConfig::default(),
        Arc::new(ManualClock::new(at(7, 0))),
        Box::new(notifier.clone()),
    )
    .unwrap();
    engine.init().unwrap();
    assert!(notifier.is_initialized());
}

#[test]
fn test_file_store_reload_fires_missed_occurrence() {
    let dir = temp_dir();
    let cfg = EngineConfig {
        store: StoreBackendConfig::File {
            dir: dir.to_string_lossy().into_owned(),
            name: "schedule".into(),
        },
        notifier: NotifierBackendConfig::InMemory,
        ..EngineConfig::default()
    };

    let clock = Arc::new(ManualClock::new(at(7, 0)));
    let first = build_engine(cfg.clone(), clock.clone()).unwrap();
    let entry = first
        .registry
        .add(EntryDraft::new(
            "Levothyroxine",
            vec!["08:00".parse().unwrap()],
            RepeatPolicy::Daily,
            day(),
        ))
        .unwrap();
    drop(first);

    // Process was down across the 08:00 occurrence.
    clock.set(at(9, 30));
    let second = build_engine(cfg, clock.clone()).unwrap();
    assert_eq!(second.registry.len(), 1);
    second.init().unwrap();
    let fired = second.dispatcher.tick(clock.now()).unwrap();
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].entry_id, entry.id);
    assert_eq!(fired[0].occurrence, at(8, 0));
    assert_eq!(
        second.registry.get(entry.id).unwrap().next_occurrence,
        Some(day().succ_opt().unwrap().and_hms_opt(8, 0, 0).unwrap())
    );
    assert_eq!(second.notifier.as_ref().unwrap().delivered().len(), 1);

    std::fs::remove_dir_all(dir).ok();
}
