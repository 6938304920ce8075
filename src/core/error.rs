//! Error types for scheduler operations.

use thiserror::Error;

use crate::core::EntryId;

/// Errors produced by scheduler components.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Malformed schedule input (empty times, unknown policy, bad time string).
    #[error("validation error: {0}")]
    Validation(String),
    /// Operation on an id the registry does not hold.
    #[error("entry not found: {0}")]
    NotFound(EntryId),
    /// The calculator produced an occurrence that is not strictly after its reference.
    #[error("calculator invariant violated: {0}")]
    CalculatorInvariant(String),
    /// Notification collaborator failure.
    #[error("notifier error: {0}")]
    Notifier(String),
    /// Persistence backend failure with context.
    #[error("backend error: {0}")]
    Backend(String),
    /// Dispatcher used outside its ready state.
    #[error("lifecycle error: {0}")]
    Lifecycle(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
