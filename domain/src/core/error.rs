//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// Raised by value-object constructors and entity transitions. The
/// application layer maps each variant onto its request-level taxonomy via
/// [`DomainError::is_validation`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("{field} cannot be empty")]
    EmptyText { field: &'static str },

    #[error("{field} is too long: {actual} characters (max {max})")]
    TextTooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("Vote count {count} is out of range (0..={max})")]
    VoteCountOutOfRange { count: u32, max: u32 },

    #[error("Invalid short code: {0}")]
    InvalidShortCode(String),

    #[error("Ticket must be in DOING to {action}")]
    NotInDoing { action: &'static str },

    #[error("Timer is not running")]
    TimerNotRunning,

    #[error("Archived tickets cannot be moved to {0}")]
    ArchiveIsTerminal(String),

    #[error("Voting round is not active")]
    RoundNotActive,

    #[error("Continuation poll is already closed")]
    PollClosed,
}

impl DomainError {
    /// Whether this error rejects the caller's input rather than the
    /// current state of an entity
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DomainError::EmptyText { .. }
                | DomainError::TextTooLong { .. }
                | DomainError::VoteCountOutOfRange { .. }
                | DomainError::InvalidShortCode(_)
        )
    }
}
