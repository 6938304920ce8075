//! API-facing request/response models.
//!
//! Form input arrives string-typed (`"HH:MM"` times, policy names, ISO
//! dates); it is parsed here into an [`EntryDraft`] before it reaches the
//! registry.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::{
    EntryDraft, EntryId, ReminderKind, RepeatPolicy, ScheduleEntry, ScheduleRegistry,
    SchedulerError, SoundKind, TimeOfDay,
};
use crate::util::clock::Timestamp;

/// Entry submission payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EntrySubmission {
    /// Display label.
    pub label: String,
    /// Dosage or free-text detail.
    pub detail: String,
    /// Reminder kind name; empty means medicine.
    pub kind: String,
    /// Times of day as `"HH:MM"`.
    pub times: Vec<String>,
    /// Repeat policy name (`once`, `daily`, `weekly`, `monthly`).
    pub repeat: String,
    /// Anchor date as `YYYY-MM-DD`.
    pub start_date: String,
    /// Sound name; empty means bell.
    pub sound: String,
    /// Vibrate with the notification.
    pub vibrate: bool,
    /// Doses on hand, if tracked.
    pub quantity: Option<u32>,
    /// Low-stock warning level.
    pub low_stock_threshold: Option<u32>,
}

impl EntrySubmission {
    /// Parse the form into a draft.
    pub fn into_draft(self) -> Result<EntryDraft, SchedulerError> {
        let times = self
            .times
            .iter()
            .map(|t| t.parse::<TimeOfDay>())
            .collect::<Result<Vec<_>, _>>()?;
        let policy: RepeatPolicy = self.repeat.parse()?;
        let anchor = NaiveDate::parse_from_str(self.start_date.trim(), "%Y-%m-%d").map_err(|e| {
            SchedulerError::Validation(format!("invalid start date `{}`: {e}", self.start_date))
        })?;
        let kind = if self.kind.trim().is_empty() {
            ReminderKind::default()
        } else {
            self.kind.parse()?
        };
        let sound = if self.sound.trim().is_empty() {
            SoundKind::default()
        } else {
            self.sound.parse()?
        };

        let mut draft = EntryDraft::new(self.label, times, policy, anchor)
            .with_detail(self.detail)
            .with_kind(kind)
            .with_alert(sound, self.vibrate);
        if let Some(quantity) = self.quantity {
            draft = draft.with_stock(quantity, self.low_stock_threshold);
        }
        Ok(draft)
    }
}

/// Parse and add a submission to the registry.
pub fn submit_entry(registry: &ScheduleRegistry, req: EntrySubmission) -> Result<EntryView, SchedulerError> {
    let entry = registry.add(req.into_draft()?)?;
    Ok(EntryView::new(&entry, registry.clock().now()))
}

/// Countdown to the next occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimeUntil {
    /// The occurrence is in the past.
    Overdue,
    /// More than 24 hours away.
    Days {
        /// Whole days.
        days: i64,
    },
    /// Within the next 24 hours.
    HoursMinutes {
        /// Whole hours.
        hours: i64,
        /// Remaining minutes.
        minutes: i64,
    },
}

impl fmt::Display for TimeUntil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overdue => write!(f, "overdue"),
            Self::Days { days } => write!(f, "in {days} days"),
            Self::HoursMinutes { hours, minutes } => write!(f, "in {hours}h {minutes}m"),
        }
    }
}

/// Countdown from `now` to `next`.
pub fn time_until(next: Timestamp, now: Timestamp) -> TimeUntil {
    let diff = next - now;
    if diff < chrono::Duration::zero() {
        return TimeUntil::Overdue;
    }
    let hours = diff.num_hours();
    if hours > 24 {
        return TimeUntil::Days { days: hours / 24 };
    }
    TimeUntil::HoursMinutes {
        hours,
        minutes: diff.num_minutes() % 60,
    }
}

/// Entry as shown in a list view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryView {
    /// Entry identifier.
    pub id: EntryId,
    /// Display label.
    pub label: String,
    /// Dosage or detail.
    pub detail: String,
    /// Reminder kind.
    pub kind: ReminderKind,
    /// Times of day as `"HH:MM"`.
    pub times: Vec<String>,
    /// Repeat policy name.
    pub repeat: String,
    /// Whether the entry still fires.
    pub active: bool,
    /// Next occurrence, if any.
    pub next_occurrence: Option<Timestamp>,
    /// Countdown to `next_occurrence`.
    pub time_until: Option<TimeUntil>,
    /// Doses left, if tracked.
    pub quantity_remaining: Option<u32>,
    /// Stock at or below its threshold.
    pub low_stock: bool,
}

impl EntryView {
    /// Build the view of `entry` as seen at `now`.
    pub fn new(entry: &ScheduleEntry, now: Timestamp) -> Self {
        Self {
            id: entry.id,
            label: entry.label.clone(),
            detail: entry.detail.clone(),
            kind: entry.kind,
            times: entry.times_of_day.iter().map(ToString::to_string).collect(),
            repeat: entry.repeat_policy.as_str().to_string(),
            active: entry.active,
            next_occurrence: entry.next_occurrence,
            time_until: entry
                .next_occurrence
                .filter(|_| entry.active)
                .map(|next| time_until(next, now)),
            quantity_remaining: entry.quantity_remaining,
            low_stock: entry.is_low_stock(),
        }
    }
}

/// Views of every entry, soonest active occurrence first.
pub fn list_entries(registry: &ScheduleRegistry) -> Vec<EntryView> {
    let now = registry.clock().now();
    let mut views: Vec<EntryView> = registry.all().iter().map(|e| EntryView::new(e, now)).collect();
    views.sort_by_key(|v| (!v.active, v.next_occurrence, v.id));
    views
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
}

/// Return a health payload.
pub const fn health() -> Health {
    Health { ok: true }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> Timestamp {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_time_until_buckets() {
        assert_eq!(time_until(at(7, 0), at(8, 0)), TimeUntil::Overdue);
        assert_eq!(
            time_until(at(20, 45), at(8, 0)),
            TimeUntil::HoursMinutes { hours: 12, minutes: 45 }
        );
        let three_days = at(8, 0) + chrono::Duration::hours(75);
        assert_eq!(time_until(three_days, at(8, 0)), TimeUntil::Days { days: 3 });
        assert_eq!(time_until(three_days, at(8, 0)).to_string(), "in 3 days");
    }

    #[test]
    fn test_submission_parses_form_fields() {
        let draft = EntrySubmission {
            label: "Metformin".into(),
            detail: "500mg".into(),
            times: vec!["20:00".into(), "08:00".into()],
            repeat: "Daily".into(),
            start_date: "2025-03-10".into(),
            sound: "chime".into(),
            vibrate: true,
            quantity: Some(30),
            low_stock_threshold: Some(5),
            ..EntrySubmission::default()
        }
        .into_draft()
        .unwrap();
        assert_eq!(draft.repeat_policy, RepeatPolicy::Daily);
        assert_eq!(draft.kind, ReminderKind::Medicine);
        assert_eq!(draft.sound, SoundKind::Chime);
        assert_eq!(draft.quantity_remaining, Some(30));
    }

    #[test]
    fn test_submission_rejects_bad_input() {
        let base = EntrySubmission {
            label: "Walk".into(),
            times: vec!["07:30".into()],
            repeat: "daily".into(),
            start_date: "2025-03-10".into(),
            ..EntrySubmission::default()
        };
        assert!(base.clone().into_draft().is_ok());

        let bad_time = EntrySubmission {
            times: vec!["25:00".into()],
            ..base.clone()
        };
        assert!(matches!(bad_time.into_draft(), Err(SchedulerError::Validation(_))));

        let bad_policy = EntrySubmission {
            repeat: "hourly".into(),
            ..base.clone()
        };
        assert!(bad_policy.into_draft().is_err());

        let bad_date = EntrySubmission {
            start_date: "10/03/2025".into(),
            ..base
        };
        assert!(bad_date.into_draft().is_err());
    }

    #[test]
    fn test_health() {
        assert!(health().ok);
    }
}
