//! Builders to construct a reminder engine from configuration.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::{EngineConfig, NotifierBackendConfig, StoreBackendConfig};
use crate::core::{
    AuditSink, InMemoryAuditSink, InMemoryNotifier, LogNotifier, NotificationTrigger,
    ReminderDispatcher, ScheduleRegistry, ScheduleStore, SchedulerError,
};
use crate::infra::{JsonFileStore, MemoryStore};
use crate::util::clock::ClockSource;

/// Wired registry, dispatcher and audit sink.
pub struct Engine {
    /// Entry registry shared with the dispatcher.
    pub registry: Arc<ScheduleRegistry>,
    /// Dispatcher driving notifications. Not yet initialized.
    pub dispatcher: Arc<ReminderDispatcher>,
    /// Audit sink, absent when `audit_capacity` is 0.
    pub audit: Option<Arc<Mutex<InMemoryAuditSink>>>,
    /// Handle to the in-memory notifier when that backend is selected.
    pub notifier: Option<InMemoryNotifier>,
    /// Configuration the engine was built from.
    pub config: EngineConfig,
}

impl Engine {
    /// Initialize the dispatcher's notifier.
    pub fn init(&self) -> Result<(), SchedulerError> {
        self.dispatcher.init()
    }

    /// Audit events recorded so far (empty without a sink).
    pub fn audit_events(&self) -> Vec<crate::core::AuditEvent> {
        self.audit
            .as_ref()
            .map(|sink| sink.lock().events())
            .unwrap_or_default()
    }
}

/// Build an engine using the notifier backend named in `cfg`.
///
/// The store is loaded before returning, so entries that came due while the
/// process was down fire on the first tick.
pub fn build_engine(cfg: EngineConfig, clock: Arc<dyn ClockSource>) -> Result<Engine, SchedulerError> {
    let mut handle = None;
    let notifier: Box<dyn NotificationTrigger> = match cfg.notifier {
        NotifierBackendConfig::Log => Box::new(LogNotifier::new()),
        NotifierBackendConfig::InMemory => {
            let notifier = InMemoryNotifier::new();
            handle = Some(notifier.clone());
            Box::new(notifier)
        }
    };
    let mut engine = build_engine_with_notifier(cfg, clock, notifier)?;
    engine.notifier = handle;
    Ok(engine)
}

/// Build an engine around a caller-supplied platform notifier.
pub fn build_engine_with_notifier(
    cfg: EngineConfig,
    clock: Arc<dyn ClockSource>,
    notifier: Box<dyn NotificationTrigger>,
) -> Result<Engine, SchedulerError> {
    cfg.validate()
        .map_err(|e| SchedulerError::Validation(format!("config invalid: {e}")))?;

    let store: Box<dyn ScheduleStore> = match &cfg.store {
        StoreBackendConfig::InMemory => Box::new(MemoryStore::new()),
        StoreBackendConfig::File { dir, name } => Box::new(JsonFileStore::new(dir, name.clone())?),
    };
    let registry = Arc::new(ScheduleRegistry::new(clock).with_store(store));
    registry.load_from_store()?;

    let mut dispatcher =
        ReminderDispatcher::new(Arc::clone(&registry), notifier, cfg.notifier_config.clone());
    let audit = (cfg.audit_capacity > 0)
        .then(|| Arc::new(Mutex::new(InMemoryAuditSink::new(cfg.audit_capacity))));
    if let Some(sink) = &audit {
        let sink: Arc<Mutex<dyn AuditSink>> = sink.clone();
        dispatcher = dispatcher.with_audit(sink);
    }

    tracing::info!(
        store = ?cfg.store,
        notifier = ?cfg.notifier,
        entries = registry.len(),
        "reminder engine built"
    );
    Ok(Engine {
        registry,
        dispatcher: Arc::new(dispatcher),
        audit,
        notifier: None,
        config: cfg,
    })
}
