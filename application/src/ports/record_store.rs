//! Record store port
//!
//! Defines the persistence contract the coordinator relies on. The store is
//! the only place where concurrent requests meet, so every critical section
//! is expressed as a single atomic call:
//!
//! | Guard | Call |
//! |-------|------|
//! | Record version (CAS) | [`RecordStore::update_ticket`], [`RecordStore::update_round`], [`RecordStore::update_poll`] |
//! | One ticket in DOING per session | [`RecordStore::update_ticket`] |
//! | One active round per session | [`RecordStore::insert_round`] |
//! | One open poll per ticket, ticket in DOING | [`RecordStore::insert_poll`] |
//! | Open poll dropped on leaving DOING | [`RecordStore::update_ticket`] |
//! | Allocation snapshot + active round | [`RecordStore::apply_vote`] |
//! | Open poll | [`RecordStore::upsert_ballot`] |
//!
//! Versioned records are returned with the version the store assigned. A
//! caller passes the record back unchanged in its `version` field; the store
//! rejects the write with [`StoreError::VersionConflict`] if the stored
//! version moved on in between.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leancup_domain::{
    ContinuationBallot, ContinuationPoll, LeanSession, Participant, PollId, RoundId, SessionId,
    ShortCode, Ticket, TicketId, UserId, Username, Vote, VoterStatus, VotingRound,
};
use thiserror::Error;

/// Uniqueness constraints enforced by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constraint {
    SessionShortCode,
    UsernamePerSession,
    DoingPerSession,
    ActiveRoundPerSession,
    OpenPollPerTicket,
}

impl Constraint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Constraint::SessionShortCode => "session short code",
            Constraint::UsernamePerSession => "username",
            Constraint::DoingPerSession => "DOING slot",
            Constraint::ActiveRoundPerSession => "active voting round",
            Constraint::OpenPollPerTicket => "open continuation poll",
        }
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur during store operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Version conflict on {entity} {id}")]
    VersionConflict { entity: &'static str, id: String },

    #[error("Uniqueness constraint violated: {0}")]
    UniqueViolation(Constraint),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn version_conflict(entity: &'static str, id: impl std::fmt::Display) -> Self {
        StoreError::VersionConflict {
            entity,
            id: id.to_string(),
        }
    }
}

/// Conditional replacement of one participant's allocation to one ticket
///
/// Applied only if the round is still active and the user's allocations to
/// the *other* tickets of the round are exactly `expected_others`, i.e. the
/// snapshot the budget check was computed from.
#[derive(Debug, Clone)]
pub struct VoteWrite {
    pub round_id: RoundId,
    pub ticket_id: TicketId,
    pub user_id: UserId,
    pub expected_others: Vec<Vote>,
    /// `None` removes the allocation
    pub vote: Option<Vote>,
}

/// Persistence port for sessions, tickets, rounds and polls
#[async_trait]
pub trait RecordStore: Send + Sync {
    // ==================== Sessions ====================

    /// Insert a session. Fails with `UniqueViolation(SessionShortCode)`.
    async fn insert_session(&self, session: &LeanSession) -> Result<(), StoreError>;

    async fn get_session(&self, id: &SessionId) -> Result<Option<LeanSession>, StoreError>;

    async fn find_session_by_short_code(
        &self,
        code: &ShortCode,
    ) -> Result<Option<LeanSession>, StoreError>;

    /// Bump `last_interaction_at`
    async fn touch_session(&self, id: &SessionId, at: DateTime<Utc>) -> Result<(), StoreError>;

    // ==================== Participants ====================

    /// Insert a participant. Fails with `UniqueViolation(UsernamePerSession)`.
    async fn insert_participant(&self, participant: &Participant) -> Result<(), StoreError>;

    async fn get_participant(&self, id: &UserId) -> Result<Option<Participant>, StoreError>;

    async fn find_participant_by_username(
        &self,
        session_id: &SessionId,
        username: &Username,
    ) -> Result<Option<Participant>, StoreError>;

    async fn list_participants(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<Participant>, StoreError>;

    /// Record a heartbeat. `last_seen` never moves backwards.
    async fn touch_participant(
        &self,
        id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<Participant, StoreError>;

    // ==================== Tickets ====================

    async fn insert_ticket(&self, ticket: &Ticket) -> Result<Ticket, StoreError>;

    async fn get_ticket(&self, id: &TicketId) -> Result<Option<Ticket>, StoreError>;

    async fn list_tickets(&self, session_id: &SessionId) -> Result<Vec<Ticket>, StoreError>;

    /// Conditional update on `ticket.version`
    ///
    /// Also rejects, atomically with the version check, a write that would
    /// put a second ticket of the session into DOING. A write that takes the
    /// ticket out of DOING discards its open continuation poll together with
    /// that poll's ballots.
    async fn update_ticket(&self, ticket: &Ticket) -> Result<Ticket, StoreError>;

    /// Delete a ticket together with its votes, polls and ballots
    async fn delete_ticket(&self, id: &TicketId) -> Result<(), StoreError>;

    // ==================== Voting rounds ====================

    /// Insert an active round with its voter statuses
    ///
    /// Fails with `UniqueViolation(ActiveRoundPerSession)`.
    async fn insert_round(
        &self,
        round: &VotingRound,
        statuses: &[VoterStatus],
    ) -> Result<VotingRound, StoreError>;

    async fn get_round(&self, id: &RoundId) -> Result<Option<VotingRound>, StoreError>;

    async fn find_active_round(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<VotingRound>, StoreError>;

    /// Conditional update on `round.version`
    async fn update_round(&self, round: &VotingRound) -> Result<VotingRound, StoreError>;

    async fn list_voter_statuses(&self, round_id: &RoundId)
    -> Result<Vec<VoterStatus>, StoreError>;

    /// Set `done` on an existing status. `NotFound` if the user has none.
    async fn mark_voter_done(
        &self,
        round_id: &RoundId,
        user_id: &UserId,
    ) -> Result<VoterStatus, StoreError>;

    async fn list_votes(&self, round_id: &RoundId) -> Result<Vec<Vote>, StoreError>;

    /// Apply a [`VoteWrite`]
    ///
    /// `Precondition` if the round is not active, `VersionConflict` if the
    /// user's other allocations no longer match the snapshot.
    async fn apply_vote(&self, write: &VoteWrite) -> Result<(), StoreError>;

    // ==================== Continuation polls ====================

    /// Insert an open poll
    ///
    /// Fails with `UniqueViolation(OpenPollPerTicket)`, or `Precondition` if
    /// the ticket is not in DOING.
    async fn insert_poll(&self, poll: &ContinuationPoll) -> Result<ContinuationPoll, StoreError>;

    async fn get_poll(&self, id: &PollId) -> Result<Option<ContinuationPoll>, StoreError>;

    async fn find_open_poll(
        &self,
        ticket_id: &TicketId,
    ) -> Result<Option<ContinuationPoll>, StoreError>;

    /// Conditional update on `poll.version`
    async fn update_poll(&self, poll: &ContinuationPoll) -> Result<ContinuationPoll, StoreError>;

    /// Insert or replace the user's ballot in an open poll
    ///
    /// `Precondition` if the poll is closed. Bumps the poll's version so a
    /// concurrent close re-reads the ballots it tallies.
    async fn upsert_ballot(
        &self,
        ballot: &ContinuationBallot,
    ) -> Result<ContinuationBallot, StoreError>;

    async fn list_ballots(&self, poll_id: &PollId) -> Result<Vec<ContinuationBallot>, StoreError>;

    /// Delete every ballot of a poll, returning how many were removed
    ///
    /// Bumps the poll's version like [`RecordStore::upsert_ballot`].
    async fn delete_ballots(&self, poll_id: &PollId) -> Result<usize, StoreError>;
}
