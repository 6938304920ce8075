//! Tests for configuration validation

use prometheus_reminders::config::{EngineConfig, NotifierBackendConfig, StoreBackendConfig};

#[test]
fn test_engine_config_default_is_valid() {
    assert!(EngineConfig::default().validate().is_ok());
}

#[test]
fn test_engine_config_invalid_tick_interval() {
    let invalid = EngineConfig {
        tick_interval_secs: 0,
        ..EngineConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_engine_config_invalid_store_dir() {
    let invalid = EngineConfig {
        store: StoreBackendConfig::File {
            dir: "  ".into(),
            name: "schedule".into(),
        },
        ..EngineConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_engine_config_empty_channel() {
    let mut invalid = EngineConfig::default();
    invalid.notifier_config.channel.clear();
    assert!(invalid.validate().is_err());
}

#[test]
fn test_engine_config_json_round_trip() {
    let cfg = EngineConfig {
        tick_interval_secs: 15,
        store: StoreBackendConfig::File {
            dir: "/tmp/reminders".into(),
            name: "meds".into(),
        },
        notifier: NotifierBackendConfig::InMemory,
        audit_capacity: 0,
        ..EngineConfig::default()
    };
    let json = serde_json::to_string(&cfg).unwrap();
    assert_eq!(EngineConfig::from_json_str(&json).unwrap(), cfg);
}

#[test]
fn test_engine_config_minimal_json_uses_defaults() {
    let cfg = EngineConfig::from_json_str(r#"{"tick_interval_secs": 30}"#).unwrap();
    assert_eq!(cfg, EngineConfig::default());
}
