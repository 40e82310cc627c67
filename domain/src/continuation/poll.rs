//! Continuation poll

use super::ballot::ContinuationBallot;
use super::decision::{ClosedBy, ContinuationTally, Decision};
use crate::core::error::DomainError;
use crate::core::ids::{PollId, SessionId, TicketId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One continuation decision cycle for a ticket (Entity)
///
/// Opened by the first ballot of a cycle, which freezes the session's
/// membership as `participants`. Closed polls are kept as decision history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuationPoll {
    pub id: PollId,
    pub ticket_id: TicketId,
    pub session_id: SessionId,
    pub participants: Vec<UserId>,
    pub open: bool,
    pub decision: Option<Decision>,
    pub tally: Option<ContinuationTally>,
    pub closed_by: Option<ClosedBy>,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub version: u64,
}

impl ContinuationPoll {
    pub fn open(
        ticket_id: TicketId,
        session_id: SessionId,
        participants: Vec<UserId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PollId::generate(),
            ticket_id,
            session_id,
            participants,
            open: true,
            decision: None,
            tally: None,
            closed_by: None,
            opened_at: now,
            closed_at: None,
            version: 0,
        }
    }

    /// Whether every frozen participant has a ballot in this poll
    pub fn quorum_reached(&self, ballots: &[ContinuationBallot]) -> bool {
        !self.participants.is_empty()
            && self.participants.iter().all(|user| {
                ballots
                    .iter()
                    .any(|b| &b.user_id == user && b.poll_id == self.id)
            })
    }

    /// Transition `open → closed`, recording the outcome
    pub fn close(
        &mut self,
        tally: ContinuationTally,
        closed_by: ClosedBy,
        now: DateTime<Utc>,
    ) -> Result<Decision, DomainError> {
        if !self.open {
            return Err(DomainError::PollClosed);
        }
        let decision = tally.decision();
        self.open = false;
        self.decision = Some(decision);
        self.tally = Some(tally);
        self.closed_by = Some(closed_by);
        self.closed_at = Some(now);
        Ok(decision)
    }
}
