//! Tests for error types

use prometheus_reminders::core::{EntryId, SchedulerError};

#[test]
fn test_validation_error() {
    let err = SchedulerError::Validation("hour 25 out of range".to_string());
    assert_eq!(format!("{}", err), "validation error: hour 25 out of range");
}

#[test]
fn test_not_found_error() {
    let err = SchedulerError::NotFound(EntryId(7));
    assert_eq!(format!("{}", err), "entry not found: 7");
}

#[test]
fn test_calculator_invariant_error() {
    let err = SchedulerError::CalculatorInvariant("next not after reference".to_string());
    assert_eq!(format!("{}", err), "calculator invariant violated: next not after reference");
}

#[test]
fn test_backend_error() {
    let err = SchedulerError::Backend("disk full".to_string());
    assert_eq!(format!("{}", err), "backend error: disk full");
}

#[test]
fn test_errors_convert_into_anyhow() {
    fn fails() -> prometheus_reminders::core::AppResult<()> {
        Err(SchedulerError::Lifecycle("tick called in state Created".into()))?;
        Ok(())
    }
    let err = fails().unwrap_err();
    assert!(err.to_string().starts_with("lifecycle error:"));
    assert!(err.downcast_ref::<SchedulerError>().is_some());
}
