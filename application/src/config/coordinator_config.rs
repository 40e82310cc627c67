//! Coordinator configuration.
//!
//! [`CoordinatorConfig`] groups the static parameters that bound the session
//! coordination engine: the discussion time box, text and vote limits, and
//! the retry bounds of the two optimistic loops (short code allocation and
//! read-modify-CAS on records). These are application concerns, not domain
//! policy; the domain receives them as plain arguments.

use leancup_domain::MAX_VOTE_COUNT;
use leancup_domain::core::text::{
    DEFAULT_MAX_DESCRIPTION_LEN, DEFAULT_MAX_SESSION_NAME_LEN, DEFAULT_MAX_USERNAME_LEN,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Coordinator limits and retry bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Time box for discussing the ticket in DOING.
    pub discussion_box: Duration,
    /// Maximum votes a participant may place on a single ticket.
    pub max_vote_count: u32,
    /// Maximum ticket description length (characters).
    pub max_description_len: usize,
    /// Maximum session display name length (characters).
    pub max_session_name_len: usize,
    /// Maximum username length (characters).
    pub max_username_len: usize,
    /// Short code generation attempts before giving up.
    pub short_code_attempts: usize,
    /// Conditional write attempts before a request fails with a conflict.
    pub cas_retry_limit: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            discussion_box: Duration::from_secs(9 * 60),
            max_vote_count: MAX_VOTE_COUNT,
            max_description_len: DEFAULT_MAX_DESCRIPTION_LEN,
            max_session_name_len: DEFAULT_MAX_SESSION_NAME_LEN,
            max_username_len: DEFAULT_MAX_USERNAME_LEN,
            short_code_attempts: 10,
            cas_retry_limit: 16,
        }
    }
}

impl CoordinatorConfig {
    /// Discussion box in milliseconds, saturating.
    pub fn discussion_box_ms(&self) -> u64 {
        u64::try_from(self.discussion_box.as_millis()).unwrap_or(u64::MAX)
    }

    // ==================== Builder Methods ====================

    pub fn with_discussion_box(mut self, discussion_box: Duration) -> Self {
        self.discussion_box = discussion_box;
        self
    }

    pub fn with_max_vote_count(mut self, max: u32) -> Self {
        self.max_vote_count = max;
        self
    }

    pub fn with_short_code_attempts(mut self, attempts: usize) -> Self {
        self.short_code_attempts = attempts;
        self
    }

    pub fn with_cas_retry_limit(mut self, limit: usize) -> Self {
        self.cas_retry_limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.discussion_box_ms(), 540_000);
        assert_eq!(config.max_vote_count, 20);
        assert_eq!(config.max_description_len, 1000);
        assert_eq!(config.max_session_name_len, 100);
        assert_eq!(config.max_username_len, 50);
        assert_eq!(config.short_code_attempts, 10);
        assert_eq!(config.cas_retry_limit, 16);
    }

    #[test]
    fn test_builder() {
        let config = CoordinatorConfig::default()
            .with_discussion_box(Duration::from_secs(300))
            .with_short_code_attempts(3)
            .with_cas_retry_limit(4);

        assert_eq!(config.discussion_box_ms(), 300_000);
        assert_eq!(config.short_code_attempts, 3);
        assert_eq!(config.cas_retry_limit, 4);
    }
}
