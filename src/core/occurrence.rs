//! Next-occurrence calculation.
//!
//! [`compute_next`] is a pure function of its inputs: it never reads a clock.
//! Callers pass the reference time explicitly, which is what makes the
//! recurrence rules testable against arbitrary instants.
//!
//! Rules:
//!
//! - A candidate time is eligible only if it is strictly after the reference.
//!   A time equal to "now" counts as already passed, so a fired reminder
//!   never re-fires in the same tick.
//! - Recurring policies start searching at the later of the reference date
//!   and the anchor date, on the first date the policy allows.
//! - `Once` never advances: when its single date has no eligible time left
//!   the result is [`NextOccurrence::Terminal`].

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::core::SchedulerError;
use crate::util::clock::Timestamp;

/// Wall-clock time of day with minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    /// 00:00.
    pub const MIDNIGHT: Self = Self { hour: 0, minute: 0 };

    /// Build a time of day, rejecting out-of-range components.
    pub fn new(hour: u8, minute: u8) -> Result<Self, SchedulerError> {
        if hour > 23 || minute > 59 {
            return Err(SchedulerError::Validation(format!(
                "time of day out of range: {hour}:{minute}"
            )));
        }
        Ok(Self { hour, minute })
    }

    /// Hour component (0-23).
    pub const fn hour(self) -> u8 {
        self.hour
    }

    /// Minute component (0-59).
    pub const fn minute(self) -> u8 {
        self.minute
    }

    /// Convert to a chrono time.
    pub fn as_naive_time(self) -> NaiveTime {
        // components are range-checked in `new`
        NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
            .unwrap_or(NaiveTime::MIN)
    }

    /// Full timestamp for this time of day on `date`.
    pub fn on(self, date: NaiveDate) -> Timestamp {
        date.and_time(self.as_naive_time())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = SchedulerError;

    /// Parse `"HH:MM"` (a single-digit hour is accepted).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SchedulerError::Validation(format!("invalid time of day `{s}`, expected HH:MM"));
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        let hour = h.parse::<u8>().map_err(|_| invalid())?;
        let minute = m.parse::<u8>().map_err(|_| invalid())?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = SchedulerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

/// Recurrence rule governing how occurrences advance after firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatPolicy {
    /// Fires once on the anchor date, then goes terminal.
    Once,
    /// Fires every day.
    Daily,
    /// Fires on the anchor's weekday.
    Weekly,
    /// Fires on the anchor's day of month, clamped to short months.
    Monthly,
}

impl RepeatPolicy {
    /// Whether firing advances to another occurrence.
    pub const fn is_recurring(self) -> bool {
        !matches!(self, Self::Once)
    }

    /// Lowercase name as used in configuration and form input.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Once => "once",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for RepeatPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepeatPolicy {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "once" => Ok(Self::Once),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(SchedulerError::Validation(format!(
                "unknown repeat policy `{other}`"
            ))),
        }
    }
}

/// Result of a next-occurrence computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextOccurrence {
    /// The next fire time, strictly after the reference.
    At(Timestamp),
    /// No further occurrence; the caller deactivates the entry.
    Terminal,
}

impl NextOccurrence {
    /// The timestamp, if not terminal.
    pub const fn timestamp(self) -> Option<Timestamp> {
        match self {
            Self::At(ts) => Some(ts),
            Self::Terminal => None,
        }
    }
}

/// Sort ascending and collapse duplicates.
pub fn normalize_times(mut times: Vec<TimeOfDay>) -> Vec<TimeOfDay> {
    times.sort_unstable();
    times.dedup();
    times
}

/// Compute the next occurrence strictly after `reference`.
///
/// `times` may be in any order. Fails with [`SchedulerError::Validation`] when
/// `times` is empty and with [`SchedulerError::CalculatorInvariant`] if date
/// arithmetic leaves chrono's representable range.
pub fn compute_next(
    times: &[TimeOfDay],
    policy: RepeatPolicy,
    anchor: NaiveDate,
    reference: Timestamp,
) -> Result<NextOccurrence, SchedulerError> {
    let earliest = times
        .iter()
        .min()
        .copied()
        .ok_or_else(|| SchedulerError::Validation("times of day must not be empty".into()))?;

    if policy == RepeatPolicy::Once {
        return Ok(earliest_after(times, anchor, reference)
            .map_or(NextOccurrence::Terminal, NextOccurrence::At));
    }

    let start = reference.date().max(anchor);
    let first = first_date_on_or_after(policy, anchor, start)?;
    let next = match earliest_after(times, first, reference) {
        Some(ts) => ts,
        None => {
            let following = first.succ_opt().ok_or_else(|| overflow(first))?;
            earliest.on(first_date_on_or_after(policy, anchor, following)?)
        }
    };

    if next <= reference {
        return Err(SchedulerError::CalculatorInvariant(format!(
            "next occurrence {next} is not after reference {reference}"
        )));
    }
    Ok(NextOccurrence::At(next))
}

/// Up to `limit` consecutive occurrences after `reference`.
///
/// Used for calendar views; a `Once` schedule yields at most one item.
pub fn upcoming(
    times: &[TimeOfDay],
    policy: RepeatPolicy,
    anchor: NaiveDate,
    reference: Timestamp,
    limit: usize,
) -> Result<Vec<Timestamp>, SchedulerError> {
    let mut out = Vec::with_capacity(limit.min(64));
    let mut cursor = reference;
    while out.len() < limit {
        match compute_next(times, policy, anchor, cursor)? {
            NextOccurrence::At(ts) => {
                out.push(ts);
                if !policy.is_recurring() {
                    break;
                }
                cursor = ts;
            }
            NextOccurrence::Terminal => break,
        }
    }
    Ok(out)
}

fn earliest_after(times: &[TimeOfDay], date: NaiveDate, reference: Timestamp) -> Option<Timestamp> {
    times
        .iter()
        .map(|t| t.on(date))
        .filter(|candidate| *candidate > reference)
        .min()
}

fn first_date_on_or_after(
    policy: RepeatPolicy,
    anchor: NaiveDate,
    from: NaiveDate,
) -> Result<NaiveDate, SchedulerError> {
    match policy {
        RepeatPolicy::Once | RepeatPolicy::Daily => Ok(from),
        RepeatPolicy::Weekly => {
            let target = anchor.weekday().num_days_from_monday();
            let current = from.weekday().num_days_from_monday();
            let delta = (target + 7 - current) % 7;
            from.checked_add_days(Days::new(u64::from(delta)))
                .ok_or_else(|| overflow(from))
        }
        RepeatPolicy::Monthly => {
            let day = anchor.day();
            let this_month = clamped_date(from.year(), from.month(), day).ok_or_else(|| overflow(from))?;
            if this_month >= from {
                return Ok(this_month);
            }
            let (year, month) = if from.month() == 12 {
                (from.year() + 1, 1)
            } else {
                (from.year(), from.month() + 1)
            };
            clamped_date(year, month, day).ok_or_else(|| overflow(from))
        }
    }
}

/// `day` in the given month, or the month's last day when `day` is past it.
fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let last = days_in_month(year, month)?;
    NaiveDate::from_ymd_opt(year, month, day.min(last))
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?
        .pred_opt()
        .map(|d| d.day())
}

fn overflow(from: NaiveDate) -> SchedulerError {
    SchedulerError::CalculatorInvariant(format!("date arithmetic overflowed after {from}"))
}
