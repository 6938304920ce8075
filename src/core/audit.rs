//! Audit sink implementations.
//!
//! The dispatcher writes one event per fire, delivery failure and state
//! transition. The in-memory sink keeps a bounded ring for dev and tests.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::core::EntryId;
use crate::util::clock::Timestamp;

/// Audit event structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Related entry.
    pub entry_id: EntryId,
    /// Action taken (fire, reschedule, complete, deactivate, delivery_failed, cancel).
    pub action: String,
    /// Evaluation time the action belongs to.
    pub created_at: Timestamp,
    /// Additional context.
    pub payload: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: VecDeque<AuditEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Helper to build an audit event with a fresh id.
pub fn build_audit_event(
    entry_id: EntryId,
    action: impl Into<String>,
    created_at: Timestamp,
    payload: Option<String>,
) -> AuditEvent {
    AuditEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        entry_id,
        action: action.into(),
        created_at,
        payload,
    }
}
