//! # Prometheus Reminders
//!
//! A reminder recurrence and next-occurrence scheduling engine.
//!
//! Each reminder is a [`ScheduleEntry`](core::ScheduleEntry): one or more
//! times of day, a repeat policy (`once`, `daily`, `weekly`, `monthly`) and an
//! anchor date. The engine computes the next wall-clock occurrence strictly
//! after "now", fires notifications for entries that have come due, and
//! advances or retires them so nothing fires twice for the same occurrence.
//!
//! ## Key Features
//!
//! - **Occurrence math**: weekly schedules keep the anchor's weekday, monthly
//!   schedules clamp the anchor's day to short months (Jan 31 -> Feb 28/29)
//! - **At-most-once firing**: the schedule advances before the notification
//!   goes out, and a late tick fires once instead of replaying a backlog
//! - **Pluggable edges**: notification triggers and schedule stores are traits
//! - **Tracking extras**: dose counting, low-stock warnings, adherence stats
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use prometheus_reminders::builders::build_engine;
//! use prometheus_reminders::config::EngineConfig;
//! use prometheus_reminders::core::{EntryDraft, RepeatPolicy};
//! use prometheus_reminders::runtime::TokioTicker;
//! use prometheus_reminders::util::SystemClock;
//!
//! let engine = build_engine(EngineConfig::from_env()?, Arc::new(SystemClock))?;
//! engine.init()?;
//! engine.registry.add(EntryDraft::new(
//!     "Metformin",
//!     vec!["08:00".parse()?, "20:00".parse()?],
//!     RepeatPolicy::Daily,
//!     chrono::Local::now().date_naive(),
//! ))?;
//!
//! // Tokio runtime: tick every `tick_interval_secs` and receive fired events.
//! let ticker = TokioTicker::from_secs(engine.dispatcher.clone(), engine.config.tick_interval_secs);
//! let (handle, mut events) = ticker.spawn();
//! ```

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Occurrence math, entries, registry, notifications and dispatch.
pub mod core;
/// Configuration models for the engine and its backends.
pub mod config;
/// Builders to construct an engine from configuration.
pub mod builders;
/// Infrastructure adapters for schedule persistence.
pub mod infra;
/// Runtime adapters and API surface.
pub mod runtime;
/// Shared utilities.
pub mod util;
