//! Runtime adapters and API surface.

pub mod api;
#[cfg(feature = "tokio-runtime")]
pub mod tokio_ticker;

pub use api::{health, list_entries, submit_entry, time_until, EntrySubmission, EntryView, Health, TimeUntil};
#[cfg(feature = "tokio-runtime")]
pub use tokio_ticker::{TickerHandle, TokioTicker, MIN_TICK_INTERVAL};
