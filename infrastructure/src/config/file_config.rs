//! Raw TOML configuration data types
//!
//! These structs mirror the layout of the TOML config file and are converted
//! into the application's [`CoordinatorConfig`] after validation.

use leancup_application::CoordinatorConfig;
use leancup_domain::MAX_VOTE_COUNT;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("discussion_box_secs cannot be 0")]
    ZeroDiscussionBox,

    #[error("max_vote_count cannot be 0")]
    ZeroVoteCount,

    #[error("max_vote_count {} exceeds the maximum of {}", .0, MAX_VOTE_COUNT)]
    VoteCountTooHigh(u32),

    #[error("{0} cannot be 0")]
    ZeroBound(&'static str),

    #[error("unknown log level '{0}' (expected error, warn, info, debug or trace)")]
    UnknownLogLevel(String),
}

/// Raw coordinator configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCoordinatorConfig {
    /// Discussion time box in seconds
    pub discussion_box_secs: u64,
    pub max_vote_count: u32,
    pub max_description_len: usize,
    pub max_session_name_len: usize,
    pub max_username_len: usize,
    /// Short code draws before session creation fails
    pub short_code_attempts: usize,
    /// Conditional write attempts before a request fails with a conflict
    pub cas_retry_limit: usize,
}

impl Default for FileCoordinatorConfig {
    fn default() -> Self {
        let defaults = CoordinatorConfig::default();
        Self {
            discussion_box_secs: defaults.discussion_box.as_secs(),
            max_vote_count: defaults.max_vote_count,
            max_description_len: defaults.max_description_len,
            max_session_name_len: defaults.max_session_name_len,
            max_username_len: defaults.max_username_len,
            short_code_attempts: defaults.short_code_attempts,
            cas_retry_limit: defaults.cas_retry_limit,
        }
    }
}

/// Raw logging configuration from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Default level when neither `-v` nor `RUST_LOG` is given
    pub level: Option<String>,
    /// Write diagnostic logs to this file instead of stderr
    pub file: Option<PathBuf>,
    /// Append session events as JSONL to this file
    pub event_log: Option<PathBuf>,
}

/// Complete configuration file structure
///
/// Example configuration:
///
/// ```toml
/// [coordinator]
/// discussion_box_secs = 300
/// max_vote_count = 10
///
/// [logging]
/// level = "info"
/// event_log = "leancup-events.jsonl"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub coordinator: FileCoordinatorConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let c = &self.coordinator;
        if c.discussion_box_secs == 0 {
            return Err(ConfigValidationError::ZeroDiscussionBox);
        }
        if c.max_vote_count == 0 {
            return Err(ConfigValidationError::ZeroVoteCount);
        }
        if c.max_vote_count > MAX_VOTE_COUNT {
            return Err(ConfigValidationError::VoteCountTooHigh(c.max_vote_count));
        }

        let bounds = [
            ("max_description_len", c.max_description_len),
            ("max_session_name_len", c.max_session_name_len),
            ("max_username_len", c.max_username_len),
            ("short_code_attempts", c.short_code_attempts),
            ("cas_retry_limit", c.cas_retry_limit),
        ];
        if let Some((name, _)) = bounds.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigValidationError::ZeroBound(name));
        }

        if let Some(level) = &self.logging.level
            && !matches!(
                level.to_ascii_lowercase().as_str(),
                "error" | "warn" | "info" | "debug" | "trace"
            )
        {
            return Err(ConfigValidationError::UnknownLogLevel(level.clone()));
        }

        Ok(())
    }

    /// Convert to the application's coordinator configuration
    pub fn to_coordinator_config(&self) -> CoordinatorConfig {
        let c = &self.coordinator;
        CoordinatorConfig {
            discussion_box: Duration::from_secs(c.discussion_box_secs),
            max_vote_count: c.max_vote_count,
            max_description_len: c.max_description_len,
            max_session_name_len: c.max_session_name_len,
            max_username_len: c.max_username_len,
            short_code_attempts: c.short_code_attempts,
            cas_retry_limit: c.cas_retry_limit,
        }
    }
}
