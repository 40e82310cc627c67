//! Voting round, voter status and vote records

use super::budget::{VoteCount, quadratic_cost};
use crate::core::error::DomainError;
use crate::core::ids::{RoundId, SessionId, TicketId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A quadratic voting round over a session's `TODO` queue (Entity)
///
/// `participants` is frozen when the round starts: quorum waits for exactly
/// these users, so someone joining mid-round cannot stall or skip it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VotingRound {
    pub id: RoundId,
    pub session_id: SessionId,
    pub active: bool,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Username of whoever force-closed the round
    pub force_closed_by: Option<String>,
    pub participants: Vec<UserId>,
    #[serde(default)]
    pub version: u64,
}

impl VotingRound {
    pub fn new(session_id: SessionId, participants: Vec<UserId>, now: DateTime<Utc>) -> Self {
        Self {
            id: RoundId::generate(),
            session_id,
            active: true,
            started_at: now,
            ended_at: None,
            force_closed_by: None,
            participants,
            version: 0,
        }
    }

    pub fn is_participant(&self, user: &UserId) -> bool {
        self.participants.contains(user)
    }

    /// One not-done status per frozen participant
    pub fn initial_statuses(&self) -> Vec<VoterStatus> {
        self.participants
            .iter()
            .map(|user| VoterStatus::new(self.id.clone(), user.clone()))
            .collect()
    }

    /// Whether every frozen participant has marked themselves done
    pub fn quorum_reached(&self, statuses: &[VoterStatus]) -> bool {
        self.participants.iter().all(|user| {
            statuses
                .iter()
                .any(|s| &s.user_id == user && s.round_id == self.id && s.done)
        })
    }

    /// Transition `active → closed`
    pub fn close(
        &mut self,
        now: DateTime<Utc>,
        forced_by: Option<String>,
    ) -> Result<(), DomainError> {
        if !self.active {
            return Err(DomainError::RoundNotActive);
        }
        self.active = false;
        self.ended_at = Some(now);
        self.force_closed_by = forced_by;
        Ok(())
    }
}

/// Per-participant progress in a round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterStatus {
    pub round_id: RoundId,
    pub user_id: UserId,
    pub done: bool,
}

impl VoterStatus {
    pub fn new(round_id: RoundId, user_id: UserId) -> Self {
        Self {
            round_id,
            user_id,
            done: false,
        }
    }
}

/// A participant's allocation to one ticket in one round
///
/// A zero allocation is never stored; it is the absence of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub round_id: RoundId,
    pub ticket_id: TicketId,
    pub user_id: UserId,
    pub count: u32,
    pub cast_at: DateTime<Utc>,
}

impl Vote {
    /// Build a stored vote. Returns `None` for a zero allocation.
    pub fn new(
        round_id: RoundId,
        ticket_id: TicketId,
        user_id: UserId,
        count: VoteCount,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        if count.is_zero() {
            return None;
        }
        Some(Self {
            round_id,
            ticket_id,
            user_id,
            count: count.get(),
            cast_at: now,
        })
    }

    pub fn cost(&self) -> u64 {
        quadratic_cost(self.count)
    }
}

/// Points a user has spent across `votes`, skipping `excluded` ticket
pub fn spent_excluding(votes: &[Vote], user: &UserId, excluded: Option<&TicketId>) -> u64 {
    votes
        .iter()
        .filter(|v| &v.user_id == user)
        .filter(|v| Some(&v.ticket_id) != excluded)
        .map(Vote::cost)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voting::budget::MAX_VOTE_COUNT;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()
    }

    fn round(users: &[&str]) -> VotingRound {
        VotingRound::new(
            SessionId::new("s1"),
            users.iter().map(|u| UserId::new(*u)).collect(),
            t0(),
        )
    }

    fn vote(round: &VotingRound, ticket: &str, user: &str, count: u32) -> Vote {
        Vote::new(
            round.id.clone(),
            TicketId::new(ticket),
            UserId::new(user),
            VoteCount::try_new(count, MAX_VOTE_COUNT).unwrap(),
            t0(),
        )
        .unwrap()
    }

    #[test]
    fn test_quorum_waits_for_frozen_participants() {
        let r = round(&["ana", "bob"]);
        let mut statuses = r.initial_statuses();
        assert_eq!(statuses.len(), 2);
        assert!(!r.quorum_reached(&statuses));

        statuses[0].done = true;
        assert!(!r.quorum_reached(&statuses));

        // A latecomer marking done does not count
        let mut late = VoterStatus::new(r.id.clone(), UserId::new("carol"));
        late.done = true;
        statuses.push(late);
        assert!(!r.quorum_reached(&statuses));

        statuses[1].done = true;
        assert!(r.quorum_reached(&statuses));
    }

    #[test]
    fn test_close_only_once() {
        let mut r = round(&["ana"]);
        r.close(t0(), Some("ana".to_string())).unwrap();
        assert!(!r.active);
        assert_eq!(r.ended_at, Some(t0()));
        assert_eq!(r.force_closed_by.as_deref(), Some("ana"));

        assert_eq!(r.close(t0(), None), Err(DomainError::RoundNotActive));
    }

    #[test]
    fn test_zero_vote_is_no_record() {
        let r = round(&["ana"]);
        let zero = VoteCount::try_new(0, MAX_VOTE_COUNT).unwrap();
        assert!(Vote::new(r.id, TicketId::new("t"), UserId::new("ana"), zero, t0()).is_none());
    }

    #[test]
    fn test_spent_excluding_ticket() {
        let r = round(&["ana", "bob"]);
        let votes = vec![
            vote(&r, "t1", "ana", 2),
            vote(&r, "t2", "ana", 3),
            vote(&r, "t1", "bob", 4),
        ];
        let ana = UserId::new("ana");
        assert_eq!(spent_excluding(&votes, &ana, None), 13);
        assert_eq!(spent_excluding(&votes, &ana, Some(&TicketId::new("t2"))), 4);
    }
}
