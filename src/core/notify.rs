//! Notification trigger abstraction and reference implementations.
//!
//! The engine decides *when* to fire; a [`NotificationTrigger`] decides how
//! the platform shows it. One implementation exists per target platform;
//! the ones here log through `tracing` or record deliveries in memory.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::entry::{EntryId, ReminderKind, ScheduleEntry, SoundKind};
use crate::core::SchedulerError;
use crate::util::clock::Timestamp;

/// Platform notification setup, passed to the trigger once at `init`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Channel the platform groups reminders under.
    pub channel: String,
    /// Vibration pattern in milliseconds (wait, vibrate, wait, ...).
    pub vibration_pattern: Vec<u64>,
    /// Show banners while the app is in the foreground.
    pub show_in_foreground: bool,
    /// Ask the user for notification permission during `init`.
    pub request_permission: bool,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            channel: "default".into(),
            vibration_pattern: vec![0, 250, 250, 250],
            show_in_foreground: true,
            request_permission: true,
        }
    }
}

/// Opaque handle returned by a trigger; used to cancel a notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationHandle(pub String);

/// Content handed to the platform at fire time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Entry that fired.
    pub entry_id: EntryId,
    /// Banner title.
    pub title: String,
    /// Banner body.
    pub body: String,
    /// Sound to play.
    pub sound: SoundKind,
    /// Vibrate the device.
    pub vibrate: bool,
    /// Occurrence this notification is for.
    pub occurrence: Timestamp,
}

impl Notification {
    /// Build the notification for `entry` firing at `occurrence`.
    pub fn for_entry(entry: &ScheduleEntry, occurrence: Timestamp) -> Self {
        let (title, body) = match entry.kind {
            ReminderKind::Medicine => {
                let body = if entry.detail.is_empty() {
                    format!("Time to take {}", entry.label)
                } else {
                    format!("Time to take {} of {}", entry.detail, entry.label)
                };
                (format!("Medicine time: {}", entry.label), body)
            }
            ReminderKind::Sleep => ("Sleep reminder".to_string(), body_or(entry, "Time to sleep!")),
            ReminderKind::Exercise => (
                "Exercise reminder".to_string(),
                body_or(entry, "Time to exercise!"),
            ),
            ReminderKind::Meal => ("Meal reminder".to_string(), body_or(entry, "Time to eat!")),
        };
        Self {
            entry_id: entry.id,
            title,
            body,
            sound: entry.sound,
            vibrate: entry.vibrate,
            occurrence,
        }
    }
}

fn body_or(entry: &ScheduleEntry, fallback: &str) -> String {
    if entry.detail.is_empty() {
        fallback.to_string()
    } else {
        entry.detail.clone()
    }
}

/// Platform notification collaborator.
pub trait NotificationTrigger: Send {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// One-time setup (channels, handlers, permission request).
    fn init(&mut self, _config: &NotifierConfig) -> Result<(), SchedulerError> {
        Ok(())
    }

    /// Show a notification now.
    fn trigger(&mut self, notification: &Notification) -> Result<NotificationHandle, SchedulerError>;

    /// Withdraw a previously triggered notification.
    fn cancel(&mut self, handle: &NotificationHandle) -> Result<(), SchedulerError>;

    /// Withdraw every outstanding notification.
    fn cancel_all(&mut self) -> Result<(), SchedulerError> {
        Ok(())
    }

    /// Release platform resources on shutdown.
    fn teardown(&mut self) -> Result<(), SchedulerError> {
        self.cancel_all()
    }
}

/// Trigger that only writes structured log lines.
#[derive(Debug, Default)]
pub struct LogNotifier {
    channel: String,
}

impl LogNotifier {
    /// Create a log notifier.
    pub fn new() -> Self {
        Self::default()
    }
}

impl NotificationTrigger for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    fn init(&mut self, config: &NotifierConfig) -> Result<(), SchedulerError> {
        self.channel.clone_from(&config.channel);
        tracing::info!(channel = %config.channel, "log notifier ready");
        Ok(())
    }

    fn trigger(&mut self, notification: &Notification) -> Result<NotificationHandle, SchedulerError> {
        let handle = NotificationHandle(uuid::Uuid::new_v4().to_string());
        tracing::info!(
            channel = %self.channel,
            entry_id = %notification.entry_id,
            title = %notification.title,
            body = %notification.body,
            sound = notification.sound.asset_name(),
            vibrate = notification.vibrate,
            handle = %handle.0,
            "reminder notification"
        );
        Ok(handle)
    }

    fn cancel(&mut self, handle: &NotificationHandle) -> Result<(), SchedulerError> {
        tracing::info!(handle = %handle.0, "reminder notification cancelled");
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryNotifierState {
    initialized: bool,
    permission_denied: bool,
    failing: bool,
    delivered: Vec<(NotificationHandle, Notification)>,
    cancelled: Vec<NotificationHandle>,
}

/// Trigger that records deliveries in memory.
///
/// Clones share state so tests can keep a handle after giving the trigger
/// to a dispatcher.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    state: Arc<Mutex<InMemoryNotifierState>>,
}

impl InMemoryNotifier {
    /// Create an empty notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `trigger` calls fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }

    /// Simulate the user refusing notification permission.
    pub fn deny_permission(&self) {
        self.state.lock().permission_denied = true;
    }

    /// Whether `init` has completed.
    pub fn is_initialized(&self) -> bool {
        self.state.lock().initialized
    }

    /// Notifications delivered so far, oldest first.
    pub fn delivered(&self) -> Vec<Notification> {
        self.state
            .lock()
            .delivered
            .iter()
            .map(|(_, n)| n.clone())
            .collect()
    }

    /// Handles cancelled so far.
    pub fn cancelled(&self) -> Vec<NotificationHandle> {
        self.state.lock().cancelled.clone()
    }
}

impl NotificationTrigger for InMemoryNotifier {
    fn name(&self) -> &str {
        "in_memory"
    }

    fn init(&mut self, config: &NotifierConfig) -> Result<(), SchedulerError> {
        let mut state = self.state.lock();
        if config.request_permission && state.permission_denied {
            return Err(SchedulerError::Notifier("notification permission not granted".into()));
        }
        state.initialized = true;
        Ok(())
    }

    fn trigger(&mut self, notification: &Notification) -> Result<NotificationHandle, SchedulerError> {
        let mut state = self.state.lock();
        if state.failing {
            return Err(SchedulerError::Notifier("delivery failed".into()));
        }
        let handle = NotificationHandle(uuid::Uuid::new_v4().to_string());
        state.delivered.push((handle.clone(), notification.clone()));
        Ok(handle)
    }

    fn cancel(&mut self, handle: &NotificationHandle) -> Result<(), SchedulerError> {
        self.state.lock().cancelled.push(handle.clone());
        Ok(())
    }

    fn cancel_all(&mut self) -> Result<(), SchedulerError> {
        let mut state = self.state.lock();
        let outstanding: Vec<NotificationHandle> = state
            .delivered
            .iter()
            .map(|(h, _)| h.clone())
            .filter(|h| !state.cancelled.contains(h))
            .collect();
        state.cancelled.extend(outstanding);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EntryDraft, RepeatPolicy};
    use chrono::NaiveDate;

    fn entry(kind: ReminderKind, detail: &str) -> ScheduleEntry {
        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        EntryDraft::new("Aspirin", vec!["08:00".parse().unwrap()], RepeatPolicy::Daily, day)
            .with_kind(kind)
            .with_detail(detail)
            .with_alert(SoundKind::Chime, false)
            .into_entry(EntryId(3), day.and_hms_opt(7, 0, 0).unwrap())
            .unwrap()
    }

    #[test]
    fn test_medicine_notification_content() {
        let e = entry(ReminderKind::Medicine, "2 tablets");
        let n = Notification::for_entry(&e, e.created_at);
        assert_eq!(n.title, "Medicine time: Aspirin");
        assert_eq!(n.body, "Time to take 2 tablets of Aspirin");
        assert_eq!(n.sound, SoundKind::Chime);
        assert!(!n.vibrate);
    }

    #[test]
    fn test_sleep_notification_falls_back_to_default_body() {
        let e = entry(ReminderKind::Sleep, "");
        let n = Notification::for_entry(&e, e.created_at);
        assert_eq!(n.title, "Sleep reminder");
        assert_eq!(n.body, "Time to sleep!");
    }

    #[test]
    fn test_in_memory_notifier_records_and_cancels() {
        let notifier = InMemoryNotifier::new();
        let mut trigger = notifier.clone();
        trigger.init(&NotifierConfig::default()).unwrap();
        assert!(notifier.is_initialized());

        let e = entry(ReminderKind::Meal, "Breakfast");
        let handle = trigger.trigger(&Notification::for_entry(&e, e.created_at)).unwrap();
        trigger.trigger(&Notification::for_entry(&e, e.created_at)).unwrap();
        trigger.cancel(&handle).unwrap();
        trigger.cancel_all().unwrap();

        assert_eq!(notifier.delivered().len(), 2);
        assert_eq!(notifier.cancelled().len(), 2);
    }

    #[test]
    fn test_in_memory_notifier_permission_and_failure() {
        let notifier = InMemoryNotifier::new();
        notifier.deny_permission();
        let mut trigger = notifier.clone();
        assert!(trigger.init(&NotifierConfig::default()).is_err());

        notifier.set_failing(true);
        let e = entry(ReminderKind::Exercise, "");
        assert!(trigger.trigger(&Notification::for_entry(&e, e.created_at)).is_err());
    }
}
