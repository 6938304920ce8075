//! Reminder dispatcher: turns due entries into notifications.
//!
//! Per entry the dispatcher runs `Scheduled -> Fired -> Scheduled` for
//! recurring policies and `Scheduled -> Fired -> Terminal` for one-time
//! entries. A tick first applies the registry transition and only then calls
//! the trigger, so a notification goes out only for an occurrence that was
//! actually consumed: delivery is at most once per computed occurrence, and
//! a failed trigger never rolls the schedule back.
//!
//! A late tick (process suspended, device off) fires each overdue entry once
//! and jumps straight to the next occurrence after `as_of`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::audit::{build_audit_event, AuditSink};
use crate::core::entry::EntryId;
use crate::core::notify::{Notification, NotificationHandle, NotificationTrigger, NotifierConfig};
use crate::core::registry::{AppliedFire, FireOutcome, ScheduleRegistry};
use crate::core::SchedulerError;
use crate::util::clock::Timestamp;

/// Dispatcher lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatcherState {
    /// Constructed, notifier not yet initialized.
    Created,
    /// `init` succeeded; ticks are accepted.
    Ready,
    /// `teardown` ran; no further ticks.
    ShutDown,
}

/// What happened to the notification side effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Delivery {
    /// The trigger accepted the notification.
    Delivered(NotificationHandle),
    /// The trigger failed; the schedule still advanced.
    Failed(String),
}

/// Fired-entry event handed back to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiredEvent {
    /// Entry that fired.
    pub entry_id: EntryId,
    /// Entry label at fire time.
    pub label: String,
    /// Occurrence that was due.
    pub occurrence: Timestamp,
    /// Evaluation time of the tick.
    pub fired_at: Timestamp,
    /// Schedule transition.
    pub outcome: FireOutcome,
    /// Notification result.
    pub delivery: Delivery,
}

/// Polls the registry for due entries and fires them.
pub struct ReminderDispatcher {
    registry: Arc<ScheduleRegistry>,
    notifier: Mutex<Box<dyn NotificationTrigger>>,
    config: NotifierConfig,
    state: Mutex<DispatcherState>,
    tick_lock: Mutex<()>,
    handles: Mutex<HashMap<EntryId, NotificationHandle>>,
    audit: Option<Arc<Mutex<dyn AuditSink>>>,
}

impl ReminderDispatcher {
    /// Create a dispatcher. Call [`init`](Self::init) before ticking.
    pub fn new(
        registry: Arc<ScheduleRegistry>,
        notifier: Box<dyn NotificationTrigger>,
        config: NotifierConfig,
    ) -> Self {
        Self {
            registry,
            notifier: Mutex::new(notifier),
            config,
            state: Mutex::new(DispatcherState::Created),
            tick_lock: Mutex::new(()),
            handles: Mutex::new(HashMap::new()),
            audit: None,
        }
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<Mutex<dyn AuditSink>>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Registry this dispatcher drives.
    pub const fn registry(&self) -> &Arc<ScheduleRegistry> {
        &self.registry
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DispatcherState {
        *self.state.lock()
    }

    /// Initialize the notifier. Allowed once, from `Created`.
    pub fn init(&self) -> Result<(), SchedulerError> {
        let mut state = self.state.lock();
        if *state != DispatcherState::Created {
            return Err(SchedulerError::Lifecycle(format!(
                "init called in state {:?}",
                *state
            )));
        }
        let mut notifier = self.notifier.lock();
        notifier.init(&self.config)?;
        *state = DispatcherState::Ready;
        tracing::info!(notifier = notifier.name(), channel = %self.config.channel, "dispatcher ready");
        Ok(())
    }

    /// Cancel outstanding notifications and stop accepting ticks. Idempotent.
    pub fn teardown(&self) -> Result<(), SchedulerError> {
        let _serial = self.tick_lock.lock();
        let mut state = self.state.lock();
        if *state == DispatcherState::ShutDown {
            return Ok(());
        }
        if *state == DispatcherState::Ready {
            if let Err(e) = self.notifier.lock().teardown() {
                tracing::warn!(error = %e, "notifier teardown failed");
            }
        }
        self.handles.lock().clear();
        *state = DispatcherState::ShutDown;
        tracing::info!("dispatcher shut down");
        Ok(())
    }

    /// Fire every entry due at or before `as_of`.
    ///
    /// Concurrent calls are serialized. Calling twice with the same `as_of`
    /// fires nothing the second time because every fired entry has either
    /// advanced past `as_of` or gone inactive.
    pub fn tick(&self, as_of: Timestamp) -> Result<Vec<FiredEvent>, SchedulerError> {
        let _serial = self.tick_lock.lock();
        let state = self.state();
        if state != DispatcherState::Ready {
            return Err(SchedulerError::Lifecycle(format!("tick called in state {state:?}")));
        }

        let due = self.registry.due_entries(as_of);
        let mut fired = Vec::with_capacity(due.len());
        for entry in due {
            if let Some(event) = self.fire(entry.id, as_of) {
                fired.push(event);
            }
        }
        if !fired.is_empty() {
            tracing::debug!(count = fired.len(), %as_of, "tick fired reminders");
        }
        Ok(fired)
    }

    /// Remove an entry and cancel its last notification, if any.
    /// Returns whether the entry existed.
    pub fn remove_entry(&self, id: EntryId) -> bool {
        if !self.registry.remove(id) {
            return false;
        }
        let handle = self.handles.lock().remove(&id);
        if let Some(handle) = handle {
            let cancelled = self.notifier.lock().cancel(&handle);
            match cancelled {
                Ok(()) => self.record(id, "cancel", self.registry.clock().now(), Some(handle.0)),
                Err(e) => tracing::warn!(entry_id = %id, error = %e, "failed to cancel notification"),
            }
        }
        true
    }

    fn fire(&self, id: EntryId, as_of: Timestamp) -> Option<FiredEvent> {
        let Some(AppliedFire {
            occurrence,
            outcome,
            entry,
        }) = self.registry.apply_fire(id, as_of)
        else {
            tracing::debug!(entry_id = %id, "entry changed before it could fire; skipped");
            return None;
        };

        let notification = Notification::for_entry(&entry, occurrence);
        let triggered = self.notifier.lock().trigger(&notification);
        let delivery = match triggered {
            Ok(handle) => {
                self.handles.lock().insert(entry.id, handle.clone());
                self.record(entry.id, "fire", as_of, Some(handle.0.clone()));
                Delivery::Delivered(handle)
            }
            Err(e) => {
                tracing::warn!(entry_id = %entry.id, error = %e, "notification trigger failed; schedule still advanced");
                self.record(entry.id, "delivery_failed", as_of, Some(e.to_string()));
                Delivery::Failed(e.to_string())
            }
        };

        match &outcome {
            FireOutcome::Rescheduled(next) => {
                self.record(entry.id, "reschedule", as_of, Some(next.to_string()));
            }
            FireOutcome::Completed => self.record(entry.id, "complete", as_of, None),
            FireOutcome::Deactivated(reason) => {
                self.record(entry.id, "deactivate", as_of, Some(reason.clone()));
            }
        }
        tracing::info!(entry_id = %entry.id, %occurrence, ?outcome, "reminder fired");

        Some(FiredEvent {
            entry_id: entry.id,
            label: entry.label,
            occurrence,
            fired_at: as_of,
            outcome,
            delivery,
        })
    }

    fn record(&self, id: EntryId, action: &str, at: Timestamp, payload: Option<String>) {
        if let Some(audit) = &self.audit {
            audit.lock().record(build_audit_event(id, action, at, payload));
        }
    }
}
