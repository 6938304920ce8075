//! Tests for runtime API models

use std::sync::Arc;

use chrono::NaiveDate;
use prometheus_reminders::core::{RepeatPolicy, ScheduleRegistry, SchedulerError};
use prometheus_reminders::runtime::{health, list_entries, submit_entry, EntrySubmission, TimeUntil};
use prometheus_reminders::util::ManualClock;

fn registry() -> ScheduleRegistry {
    let now = NaiveDate::from_ymd_opt(2025, 3, 10)
        .unwrap()
        .and_hms_opt(7, 0, 0)
        .unwrap();
    ScheduleRegistry::new(Arc::new(ManualClock::new(now)))
}

fn submission(label: &str, times: &[&str], repeat: &str, start: &str) -> EntrySubmission {
    EntrySubmission {
        label: label.into(),
        times: times.iter().map(ToString::to_string).collect(),
        repeat: repeat.into(),
        start_date: start.into(),
        ..EntrySubmission::default()
    }
}

#[test]
fn test_submit_entry_returns_view() {
    let registry = registry();
    let view = submit_entry(&registry, submission("Aspirin", &["08:00"], "daily", "2025-03-10")).unwrap();
    assert!(view.active);
    assert_eq!(view.times, vec!["08:00".to_string()]);
    assert_eq!(view.repeat, RepeatPolicy::Daily.as_str());
    assert_eq!(view.time_until, Some(TimeUntil::HoursMinutes { hours: 1, minutes: 0 }));
}

#[test]
fn test_submit_entry_rejects_invalid_form() {
    let registry = registry();
    let err = submit_entry(&registry, submission("Aspirin", &[], "daily", "2025-03-10")).unwrap_err();
    assert!(matches!(err, SchedulerError::Validation(_)));
    assert!(registry.is_empty());
}

#[test]
fn test_list_entries_orders_active_first() {
    let registry = registry();
    // Already in the past: stored inactive.
    submit_entry(&registry, submission("Old", &["06:00"], "once", "2025-03-10")).unwrap();
    submit_entry(&registry, submission("Evening", &["20:00"], "daily", "2025-03-10")).unwrap();
    submit_entry(&registry, submission("Morning", &["09:15"], "daily", "2025-03-10")).unwrap();

    let labels: Vec<String> = list_entries(&registry).into_iter().map(|v| v.label).collect();
    assert_eq!(labels, vec!["Morning", "Evening", "Old"]);
    let old = list_entries(&registry).pop().unwrap();
    assert!(!old.active);
    assert_eq!(old.time_until, None);
}

#[test]
fn test_health_ok() {
    assert!(health().ok);
}
