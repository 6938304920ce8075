//! Configuration models for the engine, its store and its notifier.

pub mod engine;

pub use engine::{EngineConfig, NotifierBackendConfig, StoreBackendConfig};
