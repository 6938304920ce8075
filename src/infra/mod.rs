//! Infrastructure adapters for schedule persistence.

pub mod store;

pub use store::{JsonFileStore, MemoryStore};
