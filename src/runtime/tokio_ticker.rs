//! Tokio-driven periodic ticker.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::core::{DispatcherState, FiredEvent, ReminderDispatcher};
use crate::util::clock::ClockSource;

/// Shortest interval the ticker runs at.
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Calls [`ReminderDispatcher::tick`] on a fixed interval.
#[derive(Clone)]
pub struct TokioTicker {
    dispatcher: Arc<ReminderDispatcher>,
    clock: Arc<dyn ClockSource>,
    interval: Duration,
}

/// Running ticker task.
pub struct TickerHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl TickerHandle {
    /// Signal the loop to stop and wait for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.join.await {
            tracing::warn!(error = %e, "ticker task ended abnormally");
        }
    }
}

impl TokioTicker {
    /// Create a ticker. Intervals shorter than [`MIN_TICK_INTERVAL`] are raised to it.
    pub fn new(dispatcher: Arc<ReminderDispatcher>, clock: Arc<dyn ClockSource>, interval: Duration) -> Self {
        Self {
            dispatcher,
            clock,
            interval: interval.max(MIN_TICK_INTERVAL),
        }
    }

    /// Effective tick interval.
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Create a ticker with the registry's clock and an interval in seconds.
    pub fn from_secs(dispatcher: Arc<ReminderDispatcher>, secs: u64) -> Self {
        let clock = Arc::clone(dispatcher.registry().clock());
        Self::new(dispatcher, clock, Duration::from_secs(secs))
    }

    /// Spawn the loop on the current Tokio runtime.
    ///
    /// Fired events are forwarded to the returned receiver; the loop keeps
    /// ticking if the receiver is dropped. It exits on shutdown or once the
    /// dispatcher has been torn down.
    pub fn spawn(self) -> (TickerHandle, mpsc::UnboundedReceiver<FiredEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(self.run(events_tx, shutdown_rx));
        (
            TickerHandle {
                shutdown: shutdown_tx,
                join,
            },
            events_rx,
        )
    }

    async fn run(self, events: mpsc::UnboundedSender<FiredEvent>, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(interval_ms = self.interval.as_millis(), "reminder ticker started");
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if self.dispatcher.state() == DispatcherState::ShutDown {
                        break;
                    }
                    match self.dispatcher.tick(self.clock.now()) {
                        Ok(fired) => {
                            for event in fired {
                                // receiver may be gone; keep ticking
                                let _ = events.send(event);
                            }
                        }
                        Err(e) => tracing::warn!(error = %e, "tick failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!("reminder ticker stopped");
    }
}
