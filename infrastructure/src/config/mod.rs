//! Configuration file loading for leancup
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `LEANCUP_*` environment variables (e.g. `LEANCUP_COORDINATOR__MAX_VOTE_COUNT`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./leancup.toml` or `./.leancup.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/leancup/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{ConfigValidationError, FileConfig, FileCoordinatorConfig, FileLoggingConfig};
pub use loader::ConfigLoader;
