//! Schedule entry records and the drafts/patches that create and edit them.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::occurrence::{normalize_times, RepeatPolicy, TimeOfDay};
use crate::core::SchedulerError;
use crate::util::clock::Timestamp;

/// Opaque, immutable entry identifier. Ordered so due-entry ties break stably.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the reminder is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    /// Take a medicine dose.
    #[default]
    Medicine,
    /// Go to bed / wake up.
    Sleep,
    /// Exercise session.
    Exercise,
    /// Meal from a diet plan.
    Meal,
}

impl FromStr for ReminderKind {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "medicine" => Ok(Self::Medicine),
            "sleep" => Ok(Self::Sleep),
            "exercise" => Ok(Self::Exercise),
            "meal" => Ok(Self::Meal),
            other => Err(SchedulerError::Validation(format!("unknown reminder kind `{other}`"))),
        }
    }
}

/// Sound played with a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundKind {
    /// Default bell.
    #[default]
    Bell,
    /// Chime.
    Chime,
    /// Crystal.
    Crystal,
    /// Digital beep.
    Digital,
    /// Melody.
    Melody,
}

impl SoundKind {
    /// Platform sound asset for this kind.
    pub const fn asset_name(self) -> &'static str {
        match self {
            Self::Bell => "notification.wav",
            Self::Chime => "chime.wav",
            Self::Crystal => "crystal.wav",
            Self::Digital => "digital.wav",
            Self::Melody => "melody.wav",
        }
    }
}

impl FromStr for SoundKind {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bell" => Ok(Self::Bell),
            "chime" => Ok(Self::Chime),
            "crystal" => Ok(Self::Crystal),
            "digital" => Ok(Self::Digital),
            "melody" => Ok(Self::Melody),
            other => Err(SchedulerError::Validation(format!("unknown sound `{other}`"))),
        }
    }
}

/// One reminder's timing, repeat policy and bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Identifier assigned at creation.
    pub id: EntryId,
    /// Short name (medicine name, "Bedtime", ...).
    pub label: String,
    /// Free text (dosage, notes).
    pub detail: String,
    /// What the reminder is for.
    pub kind: ReminderKind,
    /// Sorted, deduplicated fire times.
    pub times_of_day: Vec<TimeOfDay>,
    /// Recurrence rule.
    pub repeat_policy: RepeatPolicy,
    /// Date the schedule is pinned to.
    pub anchor_date: NaiveDate,
    /// Next fire time; `None` only once the entry is inactive.
    pub next_occurrence: Option<Timestamp>,
    /// Inactive entries are never due.
    pub active: bool,
    /// Notification sound.
    pub sound: SoundKind,
    /// Vibrate with the notification.
    pub vibrate: bool,
    /// Doses left, if tracked.
    pub quantity_remaining: Option<u32>,
    /// Low-stock warning level, if tracked.
    pub low_stock_threshold: Option<u32>,
    /// Creation time.
    pub created_at: Timestamp,
    /// `as_of` of the most recent tick that fired this entry.
    pub last_fired: Option<Timestamp>,
    /// Number of fires so far.
    pub fire_count: u32,
    /// Number of "dose taken" confirmations so far.
    pub doses_taken: u32,
}

impl ScheduleEntry {
    /// Whether the entry should fire at or before `as_of`.
    pub fn is_due(&self, as_of: Timestamp) -> bool {
        self.active && self.next_occurrence.is_some_and(|next| next <= as_of)
    }

    /// Whether remaining quantity has reached the low-stock threshold.
    pub fn is_low_stock(&self) -> bool {
        matches!(
            (self.quantity_remaining, self.low_stock_threshold),
            (Some(left), Some(threshold)) if left <= threshold
        )
    }

    /// Check the record-level invariants.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.active && self.times_of_day.is_empty() {
            return Err(SchedulerError::Validation(format!(
                "entry {} is active with no times of day",
                self.id
            )));
        }
        if self.active && self.next_occurrence.is_none() {
            return Err(SchedulerError::Validation(format!(
                "entry {} is active with no next occurrence",
                self.id
            )));
        }
        Ok(())
    }
}

/// Input for [`ScheduleRegistry::add`](crate::core::ScheduleRegistry::add).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDraft {
    /// Explicit id; assigned by the registry when `None`.
    pub id: Option<EntryId>,
    /// Short name.
    pub label: String,
    /// Free text.
    pub detail: String,
    /// What the reminder is for.
    pub kind: ReminderKind,
    /// Fire times in any order; must be non-empty.
    pub times_of_day: Vec<TimeOfDay>,
    /// Recurrence rule.
    pub repeat_policy: RepeatPolicy,
    /// Date the schedule is pinned to.
    pub anchor_date: NaiveDate,
    /// Notification sound.
    pub sound: SoundKind,
    /// Vibrate with the notification.
    pub vibrate: bool,
    /// Doses left, if tracked.
    pub quantity_remaining: Option<u32>,
    /// Low-stock warning level, if tracked.
    pub low_stock_threshold: Option<u32>,
}

impl EntryDraft {
    /// Draft with default sound, vibration on and no stock tracking.
    pub fn new(
        label: impl Into<String>,
        times_of_day: Vec<TimeOfDay>,
        repeat_policy: RepeatPolicy,
        anchor_date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            label: label.into(),
            detail: String::new(),
            kind: ReminderKind::default(),
            times_of_day,
            repeat_policy,
            anchor_date,
            sound: SoundKind::default(),
            vibrate: true,
            quantity_remaining: None,
            low_stock_threshold: None,
        }
    }

    /// Set the free-text detail.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    /// Set the reminder kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: ReminderKind) -> Self {
        self.kind = kind;
        self
    }

    /// Pin an explicit id.
    #[must_use]
    pub const fn with_id(mut self, id: EntryId) -> Self {
        self.id = Some(id);
        self
    }

    /// Set sound and vibration.
    #[must_use]
    pub const fn with_alert(mut self, sound: SoundKind, vibrate: bool) -> Self {
        self.sound = sound;
        self.vibrate = vibrate;
        self
    }

    /// Track remaining quantity with an optional low-stock threshold.
    #[must_use]
    pub const fn with_stock(mut self, remaining: u32, threshold: Option<u32>) -> Self {
        self.quantity_remaining = Some(remaining);
        self.low_stock_threshold = threshold;
        self
    }

    pub(crate) fn into_entry(self, id: EntryId, created_at: Timestamp) -> Result<ScheduleEntry, SchedulerError> {
        let times = normalize_times(self.times_of_day);
        if times.is_empty() {
            return Err(SchedulerError::Validation("times of day must not be empty".into()));
        }
        Ok(ScheduleEntry {
            id,
            label: self.label,
            detail: self.detail,
            kind: self.kind,
            times_of_day: times,
            repeat_policy: self.repeat_policy,
            anchor_date: self.anchor_date,
            next_occurrence: None,
            active: true,
            sound: self.sound,
            vibrate: self.vibrate,
            quantity_remaining: self.quantity_remaining,
            low_stock_threshold: self.low_stock_threshold,
            created_at,
            last_fired: None,
            fire_count: 0,
            doses_taken: 0,
        })
    }
}

/// Partial edit for [`ScheduleRegistry::update`](crate::core::ScheduleRegistry::update).
///
/// `None` leaves a field untouched. For the optional counters the outer
/// `Option` selects "change", the inner one the new value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryPatch {
    /// New label.
    pub label: Option<String>,
    /// New detail.
    pub detail: Option<String>,
    /// New kind.
    pub kind: Option<ReminderKind>,
    /// New fire times (temporal).
    pub times_of_day: Option<Vec<TimeOfDay>>,
    /// New recurrence rule (temporal).
    pub repeat_policy: Option<RepeatPolicy>,
    /// New anchor date (temporal).
    pub anchor_date: Option<NaiveDate>,
    /// New sound.
    pub sound: Option<SoundKind>,
    /// New vibration flag.
    pub vibrate: Option<bool>,
    /// New remaining quantity.
    pub quantity_remaining: Option<Option<u32>>,
    /// New low-stock threshold.
    pub low_stock_threshold: Option<Option<u32>>,
}

impl EntryPatch {
    /// Whether applying the patch changes when the entry fires.
    pub const fn is_temporal(&self) -> bool {
        self.times_of_day.is_some() || self.repeat_policy.is_some() || self.anchor_date.is_some()
    }

    /// Merge into `entry`. Does not recompute the occurrence.
    pub(crate) fn apply(self, entry: &mut ScheduleEntry) -> Result<(), SchedulerError> {
        if let Some(times) = self.times_of_day {
            let times = normalize_times(times);
            if times.is_empty() {
                return Err(SchedulerError::Validation("times of day must not be empty".into()));
            }
            entry.times_of_day = times;
        }
        if let Some(policy) = self.repeat_policy {
            entry.repeat_policy = policy;
        }
        if let Some(anchor) = self.anchor_date {
            entry.anchor_date = anchor;
        }
        if let Some(label) = self.label {
            entry.label = label;
        }
        if let Some(detail) = self.detail {
            entry.detail = detail;
        }
        if let Some(kind) = self.kind {
            entry.kind = kind;
        }
        if let Some(sound) = self.sound {
            entry.sound = sound;
        }
        if let Some(vibrate) = self.vibrate {
            entry.vibrate = vibrate;
        }
        if let Some(quantity) = self.quantity_remaining {
            entry.quantity_remaining = quantity;
        }
        if let Some(threshold) = self.low_stock_threshold {
            entry.low_stock_threshold = threshold;
        }
        Ok(())
    }
}
