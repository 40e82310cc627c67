//! Ticket entity

use super::space::Space;
use super::timer::DiscussionTimer;
use crate::core::error::DomainError;
use crate::core::ids::{SessionId, TicketId, UserId};
use crate::core::text::Description;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `archived_by` label used when a mover does not give a username
pub const ARCHIVED_BY_UNKNOWN: &str = "Unknown";

/// A discussion topic proposed by a participant (Entity)
///
/// `version` is owned by the record store: it increases on every successful
/// write and guards conditional updates. Domain methods never touch it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub session_id: SessionId,
    /// Creator; ownership never transfers
    pub owner_id: UserId,
    pub description: Description,
    pub space: Space,
    /// Written only when a voting round closes
    pub vote_count: u32,
    pub timer: DiscussionTimer,
    pub archived_by: Option<String>,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
}

impl Ticket {
    /// Create a ticket in `PERSONAL`
    pub fn new(
        session_id: SessionId,
        owner_id: UserId,
        description: Description,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TicketId::generate(),
            session_id,
            owner_id,
            description,
            space: Space::Personal,
            vote_count: 0,
            timer: DiscussionTimer::default(),
            archived_by: None,
            archived_at: None,
            created_at: now,
            version: 0,
        }
    }

    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.owner_id == user
    }

    /// Whether `user` may move this ticket to another space
    ///
    /// Personal tickets are movable only by their creator. Shared tickets are
    /// movable by anyone in the session.
    pub fn is_movable_by(&self, user: &UserId) -> bool {
        self.space != Space::Personal || self.is_owned_by(user)
    }

    pub fn is_visible_to(&self, user: &UserId) -> bool {
        self.space.is_shared() || self.is_owned_by(user)
    }

    /// Apply a space transition
    ///
    /// Leaving `DOING` freezes the timer. Entering `ARCHIVE` stamps the
    /// archive metadata with `archived_by` (or [`ARCHIVED_BY_UNKNOWN`]).
    /// Moving an archived ticket anywhere but `ARCHIVE` is rejected; moving
    /// it to `ARCHIVE` again is a no-op.
    ///
    /// Ownership and DOING capacity are checked by the caller.
    pub fn move_to(
        &mut self,
        target: Space,
        archived_by: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if self.space == Space::Archive {
            if target == Space::Archive {
                return Ok(());
            }
            return Err(DomainError::ArchiveIsTerminal(target.to_string()));
        }

        if self.space == Space::Doing && target != Space::Doing {
            self.timer.freeze(now);
        }

        if target == Space::Archive {
            self.archived_by = Some(archived_by.unwrap_or(ARCHIVED_BY_UNKNOWN).to_string());
            self.archived_at = Some(now);
        }

        self.space = target;
        Ok(())
    }

    /// Archive as the outcome of a group decision
    pub fn archive_by_decision(
        &mut self,
        label: &str,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.move_to(Space::Archive, Some(label), now)
    }

    /// Start or restart the discussion timer (DOING only)
    pub fn start_timer(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.space != Space::Doing {
            return Err(DomainError::NotInDoing {
                action: "start the timer",
            });
        }
        self.timer.start(now);
        Ok(())
    }
}

/// Order tickets for display: highest tally first, then newest first
///
/// Ids break the remaining ties so the order is stable across polls.
pub fn sort_for_display(tickets: &mut [Ticket]) {
    tickets.sort_by(|a, b| {
        b.vote_count
            .cmp(&a.vote_count)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}
