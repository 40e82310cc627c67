//! Request-level error taxonomy
//!
//! Every use case returns [`CoreError`]. Domain and store errors are mapped
//! onto it at the use-case boundary so callers only ever see one taxonomy.

use crate::ports::record_store::{Constraint, StoreError};
use leancup_domain::DomainError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by coordinator operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Not enough points: this allocation costs {requested}, {spent} already spent of {budget}")]
    BudgetExceeded { requested: u64, spent: u64, budget: u64 },

    #[error("Storage error: {0}")]
    Storage(StoreError),
}

/// Serializable discriminant of [`CoreError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Validation,
    Conflict,
    InvalidState,
    BudgetExceeded,
    Storage,
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        CoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::Forbidden(_) => ErrorKind::Forbidden,
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::Conflict(_) => ErrorKind::Conflict,
            CoreError::InvalidState(_) => ErrorKind::InvalidState,
            CoreError::BudgetExceeded { .. } => ErrorKind::BudgetExceeded,
            CoreError::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<DomainError> for CoreError {
    fn from(error: DomainError) -> Self {
        if error.is_validation() {
            CoreError::Validation(error.to_string())
        } else {
            CoreError::InvalidState(error.to_string())
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            StoreError::UniqueViolation(Constraint::DoingPerSession) => {
                CoreError::Conflict("another ticket is already in DOING".to_string())
            }
            StoreError::UniqueViolation(Constraint::ActiveRoundPerSession) => {
                CoreError::Conflict("a voting round is already active".to_string())
            }
            StoreError::UniqueViolation(constraint) => {
                CoreError::Conflict(format!("{} already taken", constraint))
            }
            StoreError::VersionConflict { entity, id } => {
                CoreError::Conflict(format!("{} {} was modified concurrently", entity, id))
            }
            StoreError::Precondition(reason) => CoreError::InvalidState(reason),
            unavailable @ StoreError::Unavailable(_) => CoreError::Storage(unavailable),
        }
    }
}
