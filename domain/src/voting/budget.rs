//! Quadratic cost and point budget

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Stock upper bound for votes on a single ticket
pub const MAX_VOTE_COUNT: u32 = 20;

/// Points it costs to place `count` votes on one ticket
pub fn quadratic_cost(count: u32) -> u64 {
    let count = u64::from(count);
    count * count
}

/// Per-participant point budget for a round over `todo_count` tickets
///
/// `(todo_count - 1)²`, or 0 when there is nothing to choose between.
/// Always evaluated against the live queue, never cached on the round.
///
/// # Example
///
/// ```
/// use leancup_domain::point_budget;
///
/// assert_eq!(point_budget(0), 0);
/// assert_eq!(point_budget(1), 0);
/// assert_eq!(point_budget(4), 9);
/// ```
pub fn point_budget(todo_count: usize) -> u64 {
    let n = u64::try_from(todo_count.saturating_sub(1)).unwrap_or(u64::MAX);
    n.saturating_mul(n)
}

/// Requested allocation for one ticket (Value Object)
///
/// Zero is valid and means "remove my votes from this ticket".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoteCount(u32);

impl VoteCount {
    pub fn try_new(count: u32, max: u32) -> Result<Self, DomainError> {
        if count > max {
            return Err(DomainError::VoteCountOutOfRange { count, max });
        }
        Ok(Self(count))
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn cost(&self) -> u64 {
        quadratic_cost(self.0)
    }
}
