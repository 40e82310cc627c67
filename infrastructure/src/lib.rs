//! Infrastructure layer for leancup
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the in-memory record store, the system clock,
//! short code generation, event sinks and configuration file loading.

pub mod clock;
pub mod config;
pub mod events;
pub mod short_code;
pub mod store;

// Re-export commonly used types
pub use clock::SystemClock;
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileCoordinatorConfig, FileLoggingConfig,
};
pub use events::{BroadcastNotifier, JsonlEventLog};
pub use short_code::RandomShortCodeGenerator;
pub use store::InMemoryRecordStore;
