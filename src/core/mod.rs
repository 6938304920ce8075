//! Core scheduling abstractions: occurrence math, entries, registry, dispatcher.

pub mod audit;
pub mod dispatcher;
pub mod entry;
pub mod error;
pub mod notify;
pub mod occurrence;
pub mod registry;

pub use audit::{build_audit_event, AuditEvent, AuditSink, InMemoryAuditSink};
pub use dispatcher::{Delivery, DispatcherState, FiredEvent, ReminderDispatcher};
pub use entry::{EntryDraft, EntryId, EntryPatch, ReminderKind, ScheduleEntry, SoundKind};
pub use error::{AppResult, SchedulerError};
pub use notify::{
    InMemoryNotifier, LogNotifier, Notification, NotificationHandle, NotificationTrigger,
    NotifierConfig,
};
pub use occurrence::{compute_next, normalize_times, upcoming, NextOccurrence, RepeatPolicy, TimeOfDay};
pub use registry::{
    AdherenceStats, DoseRecord, EntrySnapshot, FireOutcome, ScheduleRegistry, ScheduleStore,
};
