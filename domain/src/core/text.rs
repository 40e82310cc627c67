//! Validated text value objects
//!
//! Lengths are counted in Unicode scalar values, not bytes. Upper bounds are
//! passed in by the caller so deployments can tune them; the `DEFAULT_MAX_*`
//! constants are the stock limits.

use super::error::DomainError;
use serde::{Deserialize, Serialize};

/// Stock upper bound for ticket descriptions
pub const DEFAULT_MAX_DESCRIPTION_LEN: usize = 1000;

/// Stock upper bound for usernames
pub const DEFAULT_MAX_USERNAME_LEN: usize = 50;

/// Stock upper bound for session display names
pub const DEFAULT_MAX_SESSION_NAME_LEN: usize = 100;

fn validate(field: &'static str, content: &str, max: usize) -> Result<(), DomainError> {
    if content.trim().is_empty() {
        return Err(DomainError::EmptyText { field });
    }
    let actual = content.chars().count();
    if actual > max {
        return Err(DomainError::TextTooLong { field, max, actual });
    }
    Ok(())
}

/// Text of a ticket (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Description(String);

impl Description {
    /// Validate and wrap a description
    pub fn try_new(content: impl Into<String>, max_len: usize) -> Result<Self, DomainError> {
        let content = content.into();
        validate("description", &content, max_len)?;
        Ok(Self(content))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Description {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Self-asserted participant name, unique within one session (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    pub fn try_new(content: impl Into<String>, max_len: usize) -> Result<Self, DomainError> {
        let content = content.into();
        validate("username", &content, max_len)?;
        Ok(Self(content))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display name of a session (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionName(String);

impl SessionName {
    pub fn try_new(content: impl Into<String>, max_len: usize) -> Result<Self, DomainError> {
        let content = content.into();
        validate("session name", &content, max_len)?;
        Ok(Self(content))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
