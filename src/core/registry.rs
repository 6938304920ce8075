//! Schedule registry: the in-memory, optionally persisted set of entries.
//!
//! All state sits behind one `parking_lot::Mutex` per registry, so each
//! operation (including a fire transition) is applied atomically. When a
//! [`ScheduleStore`] is attached, every mutation is followed by a snapshot
//! save; save failures are logged and never undo the mutation.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::entry::{EntryDraft, EntryId, EntryPatch, ScheduleEntry};
use crate::core::occurrence::{compute_next, NextOccurrence, RepeatPolicy};
use crate::core::SchedulerError;
use crate::util::clock::{ClockSource, Timestamp};

/// Abstraction for persistence backends.
pub trait ScheduleStore: Send {
    /// Load every persisted entry.
    fn load(&self) -> Result<Vec<ScheduleEntry>, SchedulerError>;
    /// Replace the persisted set with `entries`.
    fn save(&mut self, entries: &[ScheduleEntry]) -> Result<(), SchedulerError>;
}

/// Read-only snapshot returned by [`ScheduleRegistry::all`].
///
/// Iteration is lazy and can be restarted any number of times; later
/// registry mutations are not visible through an existing snapshot.
#[derive(Debug, Clone)]
pub struct EntrySnapshot {
    entries: Arc<[ScheduleEntry]>,
}

impl EntrySnapshot {
    /// Iterate in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, ScheduleEntry> {
        self.entries.iter()
    }

    /// Number of entries captured.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a EntrySnapshot {
    type Item = &'a ScheduleEntry;
    type IntoIter = std::slice::Iter<'a, ScheduleEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// How a fire changed an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FireOutcome {
    /// Recurring entry advanced to a new occurrence.
    Rescheduled(Timestamp),
    /// One-time entry reached its terminal state.
    Completed,
    /// Entry was deactivated because no valid next occurrence exists.
    Deactivated(String),
}

/// Transition applied by a fire, with the entry as it stands afterwards.
#[derive(Debug, Clone)]
pub(crate) struct AppliedFire {
    pub(crate) occurrence: Timestamp,
    pub(crate) outcome: FireOutcome,
    pub(crate) entry: ScheduleEntry,
}

/// Result of a "dose taken" confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoseRecord {
    /// Entry the dose belongs to.
    pub entry_id: EntryId,
    /// Remaining quantity after the decrement, if tracked.
    pub quantity_remaining: Option<u32>,
    /// Whether the remaining quantity is at or below the threshold.
    pub low_stock: bool,
    /// Total confirmations for the entry.
    pub doses_taken: u32,
}

/// Aggregate adherence figures across the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdherenceStats {
    /// All entries, active or not.
    pub total_entries: usize,
    /// Entries still scheduled.
    pub active_entries: usize,
    /// Fires across all entries.
    pub total_fired: u64,
    /// Dose confirmations across all entries.
    pub total_taken: u64,
    /// `total_taken / total_fired` as a percentage, 0 when nothing fired.
    pub completion_rate: f64,
}

struct RegistryState {
    entries: Vec<ScheduleEntry>,
    next_id: u64,
}

impl RegistryState {
    fn find_mut(&mut self, id: EntryId) -> Option<&mut ScheduleEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    fn contains(&self, id: EntryId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    fn reserve_id(&mut self, id: EntryId) {
        self.next_id = self.next_id.max(id.0.saturating_add(1));
    }
}

/// Collection of schedule entries keyed by [`EntryId`].
pub struct ScheduleRegistry {
    state: Mutex<RegistryState>,
    clock: Arc<dyn ClockSource>,
    store: Option<Mutex<Box<dyn ScheduleStore>>>,
}

impl ScheduleRegistry {
    /// Create an empty registry reading "now" from `clock`.
    pub fn new(clock: Arc<dyn ClockSource>) -> Self {
        Self {
            state: Mutex::new(RegistryState {
                entries: Vec::new(),
                next_id: 1,
            }),
            clock,
            store: None,
        }
    }

    /// Attach a persistence backend.
    #[must_use]
    pub fn with_store(mut self, store: Box<dyn ScheduleStore>) -> Self {
        self.store = Some(Mutex::new(store));
        self
    }

    /// Clock the registry stamps entries with.
    pub fn clock(&self) -> &Arc<dyn ClockSource> {
        &self.clock
    }

    /// Populate the registry from the attached store.
    ///
    /// Persisted `next_occurrence` values are kept as-is, so anything that
    /// came due while the process was down is picked up by the next tick.
    /// Records that break entry invariants or repeat an id are skipped.
    /// Returns the number of entries loaded.
    pub fn load_from_store(&self) -> Result<usize, SchedulerError> {
        let Some(store) = &self.store else {
            return Ok(0);
        };
        let loaded = store.lock().load()?;
        let mut state = self.state.lock();
        let mut count = 0;
        for entry in loaded {
            if let Err(e) = entry.validate() {
                tracing::warn!(entry_id = %entry.id, error = %e, "skipping invalid persisted entry");
                continue;
            }
            if state.contains(entry.id) {
                tracing::warn!(entry_id = %entry.id, "skipping duplicate persisted entry");
                continue;
            }
            state.reserve_id(entry.id);
            state.entries.push(entry);
            count += 1;
        }
        tracing::info!(count, "loaded schedule entries from store");
        Ok(count)
    }

    /// Validate, stamp and store a new entry.
    pub fn add(&self, draft: EntryDraft) -> Result<ScheduleEntry, SchedulerError> {
        let now = self.clock.now();
        let mut state = self.state.lock();

        let id = match draft.id {
            Some(id) if state.contains(id) => {
                return Err(SchedulerError::Validation(format!("duplicate entry id {id}")));
            }
            Some(id) => id,
            None => {
                let id = EntryId(state.next_id);
                if state.contains(id) {
                    return Err(SchedulerError::Validation("id space exhausted".into()));
                }
                id
            }
        };

        let mut entry = draft.into_entry(id, now)?;
        stamp(&mut entry, now)?;
        state.reserve_id(id);
        state.entries.push(entry.clone());
        self.persist(&state.entries);

        tracing::info!(
            entry_id = %id,
            policy = %entry.repeat_policy,
            next = ?entry.next_occurrence,
            "schedule entry added"
        );
        Ok(entry)
    }

    /// Merge `patch` into an entry, recomputing its occurrence if timing changed.
    pub fn update(&self, id: EntryId, patch: EntryPatch) -> Result<ScheduleEntry, SchedulerError> {
        let now = self.clock.now();
        let mut state = self.state.lock();
        let entry = state.find_mut(id).ok_or(SchedulerError::NotFound(id))?;

        let temporal = patch.is_temporal();
        let mut updated = entry.clone();
        patch.apply(&mut updated)?;
        let retired = updated.repeat_policy == RepeatPolicy::Once && updated.last_fired.is_some();
        if temporal && retired {
            // a fired one-time entry stays terminal
            updated.active = false;
            tracing::warn!(entry_id = %id, "one-time entry already fired; timing change kept inactive");
        } else if temporal {
            stamp(&mut updated, now)?;
        }
        *entry = updated.clone();
        self.persist(&state.entries);

        tracing::info!(entry_id = %id, temporal, next = ?updated.next_occurrence, "schedule entry updated");
        Ok(updated)
    }

    /// Delete an entry. Returns whether anything was removed.
    pub fn remove(&self, id: EntryId) -> bool {
        let mut state = self.state.lock();
        let before = state.entries.len();
        state.entries.retain(|e| e.id != id);
        let removed = state.entries.len() != before;
        if removed {
            self.persist(&state.entries);
            tracing::info!(entry_id = %id, "schedule entry removed");
        }
        removed
    }

    /// Clone of a single entry.
    pub fn get(&self, id: EntryId) -> Result<ScheduleEntry, SchedulerError> {
        self.state
            .lock()
            .entries
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(SchedulerError::NotFound(id))
    }

    /// Active entries due at or before `as_of`, earliest first, ties by id.
    pub fn due_entries(&self, as_of: Timestamp) -> Vec<ScheduleEntry> {
        let mut due: Vec<ScheduleEntry> = self
            .state
            .lock()
            .entries
            .iter()
            .filter(|e| e.is_due(as_of))
            .cloned()
            .collect();
        due.sort_by_key(|e| (e.next_occurrence, e.id));
        due
    }

    /// Snapshot of every entry in insertion order.
    pub fn all(&self) -> EntrySnapshot {
        let state = self.state.lock();
        EntrySnapshot {
            entries: state.entries.clone().into(),
        }
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Record a "dose taken" confirmation. Scheduling state is untouched.
    pub fn record_dose(&self, id: EntryId) -> Result<DoseRecord, SchedulerError> {
        let mut state = self.state.lock();
        let entry = state.find_mut(id).ok_or(SchedulerError::NotFound(id))?;
        entry.quantity_remaining = entry.quantity_remaining.map(|q| q.saturating_sub(1));
        entry.doses_taken = entry.doses_taken.saturating_add(1);
        let record = DoseRecord {
            entry_id: id,
            quantity_remaining: entry.quantity_remaining,
            low_stock: entry.is_low_stock(),
            doses_taken: entry.doses_taken,
        };
        self.persist(&state.entries);

        if record.low_stock {
            tracing::warn!(entry_id = %id, remaining = ?record.quantity_remaining, "low stock");
        }
        Ok(record)
    }

    /// Entries at or below their low-stock threshold.
    pub fn low_stock(&self) -> Vec<ScheduleEntry> {
        self.state
            .lock()
            .entries
            .iter()
            .filter(|e| e.is_low_stock())
            .cloned()
            .collect()
    }

    /// Adherence figures across all entries.
    pub fn adherence(&self) -> AdherenceStats {
        let state = self.state.lock();
        let total_fired: u64 = state.entries.iter().map(|e| u64::from(e.fire_count)).sum();
        let total_taken: u64 = state.entries.iter().map(|e| u64::from(e.doses_taken)).sum();
        #[allow(clippy::cast_precision_loss)]
        let completion_rate = if total_fired == 0 {
            0.0
        } else {
            total_taken as f64 / total_fired as f64 * 100.0
        };
        AdherenceStats {
            total_entries: state.entries.len(),
            active_entries: state.entries.iter().filter(|e| e.active).count(),
            total_fired,
            total_taken,
            completion_rate,
        }
    }

    /// Apply the post-fire transition for one entry.
    ///
    /// Returns `None` if the entry is gone or no longer due at `as_of`
    /// (removed, edited, or already advanced by an earlier tick).
    pub(crate) fn apply_fire(&self, id: EntryId, as_of: Timestamp) -> Option<AppliedFire> {
        let mut state = self.state.lock();
        let entry = state.find_mut(id)?;
        if !entry.is_due(as_of) {
            return None;
        }
        let occurrence = entry.next_occurrence.unwrap_or(as_of);

        entry.last_fired = Some(as_of);
        entry.fire_count = entry.fire_count.saturating_add(1);

        let outcome = if entry.repeat_policy.is_recurring() {
            match compute_next(&entry.times_of_day, entry.repeat_policy, entry.anchor_date, as_of) {
                Ok(NextOccurrence::At(next)) if next > as_of => {
                    entry.next_occurrence = Some(next);
                    FireOutcome::Rescheduled(next)
                }
                Ok(NextOccurrence::At(next)) => {
                    deactivate(entry, format!("next occurrence {next} is not after {as_of}"))
                }
                Ok(NextOccurrence::Terminal) => {
                    deactivate(entry, "recurring schedule produced no next occurrence".into())
                }
                Err(e) => deactivate(entry, e.to_string()),
            }
        } else {
            entry.active = false;
            FireOutcome::Completed
        };

        let entry = entry.clone();
        self.persist(&state.entries);
        Some(AppliedFire {
            occurrence,
            outcome,
            entry,
        })
    }

    fn persist(&self, entries: &[ScheduleEntry]) {
        if let Some(store) = &self.store {
            if let Err(e) = store.lock().save(entries) {
                tracing::warn!(error = %e, "failed to persist schedule; in-memory state kept");
            }
        }
    }
}

fn deactivate(entry: &mut ScheduleEntry, reason: String) -> FireOutcome {
    tracing::error!(entry_id = %entry.id, %reason, "calculator invariant violated; deactivating entry");
    entry.active = false;
    FireOutcome::Deactivated(reason)
}

/// Compute and store the entry's next occurrence relative to `now`.
fn stamp(entry: &mut ScheduleEntry, now: Timestamp) -> Result<(), SchedulerError> {
    match compute_next(&entry.times_of_day, entry.repeat_policy, entry.anchor_date, now)? {
        NextOccurrence::At(next) => {
            entry.next_occurrence = Some(next);
            entry.active = true;
        }
        NextOccurrence::Terminal => {
            tracing::warn!(entry_id = %entry.id, "one-time entry is already in the past; stored inactive");
            entry.next_occurrence = None;
            entry.active = false;
        }
    }
    Ok(())
}
