//! Engine configuration structures.

use serde::{Deserialize, Serialize};

use crate::core::NotifierConfig;

/// Persistence backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreBackendConfig {
    /// Keep the schedule in memory only.
    #[default]
    InMemory,
    /// JSON-lines file `<dir>/<name>.jsonl`.
    File {
        /// Directory holding the snapshot.
        dir: String,
        /// Snapshot name.
        name: String,
    },
}

/// Notification trigger selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifierBackendConfig {
    /// Write notifications to the tracing log.
    #[default]
    Log,
    /// Record notifications in memory.
    InMemory,
}

/// Root engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds between periodic ticks.
    pub tick_interval_secs: u64,
    /// Persistence backend.
    #[serde(default)]
    pub store: StoreBackendConfig,
    /// Notification backend.
    #[serde(default)]
    pub notifier: NotifierBackendConfig,
    /// Events kept by the in-memory audit sink; 0 disables auditing.
    #[serde(default = "default_audit_capacity")]
    pub audit_capacity: usize,
    /// Platform notification setup.
    #[serde(default)]
    pub notifier_config: NotifierConfig,
}

const fn default_audit_capacity() -> usize {
    256
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 30,
            store: StoreBackendConfig::default(),
            notifier: NotifierBackendConfig::default(),
            audit_capacity: default_audit_capacity(),
            notifier_config: NotifierConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_interval_secs == 0 {
            return Err("tick_interval_secs must be greater than 0".into());
        }
        if let StoreBackendConfig::File { dir, name } = &self.store {
            if dir.trim().is_empty() {
                return Err("file store dir must not be empty".into());
            }
            if name.trim().is_empty() || name.contains(['/', '\\']) {
                return Err(format!("file store name `{name}` is invalid"));
            }
        }
        if self.notifier_config.channel.trim().is_empty() {
            return Err("notifier channel must not be empty".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from `REMINDER_*` environment variables, loading a
    /// `.env` file first if one exists.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Recognized keys: `REMINDER_TICK_SECS`, `REMINDER_STORE_DIR`,
    /// `REMINDER_STORE_NAME`, `REMINDER_NOTIFIER`, `REMINDER_AUDIT_CAPACITY`,
    /// `REMINDER_CHANNEL`. Missing keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut cfg = Self::default();
        if let Some(secs) = lookup("REMINDER_TICK_SECS") {
            cfg.tick_interval_secs = secs
                .trim()
                .parse()
                .map_err(|e| format!("REMINDER_TICK_SECS: {e}"))?;
        }
        if let Some(dir) = lookup("REMINDER_STORE_DIR") {
            cfg.store = StoreBackendConfig::File {
                dir,
                name: lookup("REMINDER_STORE_NAME").unwrap_or_else(|| "schedule".into()),
            };
        }
        if let Some(notifier) = lookup("REMINDER_NOTIFIER") {
            cfg.notifier = match notifier.trim() {
                "log" => NotifierBackendConfig::Log,
                "in_memory" => NotifierBackendConfig::InMemory,
                other => return Err(format!("REMINDER_NOTIFIER: unknown notifier `{other}`")),
            };
        }
        if let Some(capacity) = lookup("REMINDER_AUDIT_CAPACITY") {
            cfg.audit_capacity = capacity
                .trim()
                .parse()
                .map_err(|e| format!("REMINDER_AUDIT_CAPACITY: {e}"))?;
        }
        if let Some(channel) = lookup("REMINDER_CHANNEL") {
            cfg.notifier_config.channel = channel;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}
