//! Application-level configuration.
//!
//! - [`CoordinatorConfig`]: limits and time box shared by every use case

pub mod coordinator_config;

pub use coordinator_config::CoordinatorConfig;
