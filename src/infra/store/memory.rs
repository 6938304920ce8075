//! In-memory store for development and tests.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::{ScheduleEntry, ScheduleStore, SchedulerError};

/// Store keeping the last saved snapshot in memory.
///
/// Clones share the same backing vector, so a test can keep a handle and
/// inspect what the registry saved.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<Vec<ScheduleEntry>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `entries`.
    pub fn with_entries(entries: Vec<ScheduleEntry>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(entries)),
        }
    }

    /// Copy of the last saved snapshot.
    pub fn snapshot(&self) -> Vec<ScheduleEntry> {
        self.entries.lock().clone()
    }
}

impl ScheduleStore for MemoryStore {
    fn load(&self) -> Result<Vec<ScheduleEntry>, SchedulerError> {
        Ok(self.snapshot())
    }

    fn save(&mut self, entries: &[ScheduleEntry]) -> Result<(), SchedulerError> {
        *self.entries.lock() = entries.to_vec();
        Ok(())
    }
}
