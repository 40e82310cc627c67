//! In-memory record store.
//!
//! Every port call takes the state lock once, checks its guards and applies
//! its write before releasing it, which gives the single-record atomicity,
//! conditional updates and uniqueness constraints the coordinator relies on.
//! The lock is a `std::sync::Mutex` and is never held across an `.await`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leancup_application::ports::record_store::{Constraint, RecordStore, StoreError, VoteWrite};
use leancup_domain::{
    ContinuationBallot, ContinuationPoll, LeanSession, Participant, PollId, RoundId, SessionId,
    ShortCode, Space, Ticket, TicketId, UserId, Username, Vote, VoterStatus, VotingRound,
};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// In-memory store state.
#[derive(Default)]
struct MemoryState {
    sessions: HashMap<SessionId, LeanSession>,
    participants: HashMap<UserId, Participant>,
    tickets: HashMap<TicketId, Ticket>,
    rounds: HashMap<RoundId, VotingRound>,
    /// Keyed by (round, user)
    statuses: HashMap<(RoundId, UserId), VoterStatus>,
    /// Keyed by (round, ticket, user)
    votes: HashMap<(RoundId, TicketId, UserId), Vote>,
    polls: HashMap<PollId, ContinuationPoll>,
    /// Keyed by (poll, user)
    ballots: HashMap<(PollId, UserId), ContinuationBallot>,
}

impl MemoryState {
    fn doing_taken_by_other(&self, ticket: &Ticket) -> bool {
        ticket.space == Space::Doing
            && self.tickets.values().any(|other| {
                other.id != ticket.id
                    && other.session_id == ticket.session_id
                    && other.space == Space::Doing
            })
    }

    /// The user's votes in a round on every ticket except `excluded`,
    /// as comparable `(ticket, count)` pairs
    fn other_allocations(
        &self,
        round_id: &RoundId,
        user_id: &UserId,
        excluded: &TicketId,
    ) -> Vec<(TicketId, u32)> {
        let mut pairs: Vec<(TicketId, u32)> = self
            .votes
            .values()
            .filter(|v| &v.round_id == round_id && &v.user_id == user_id)
            .filter(|v| &v.ticket_id != excluded)
            .map(|v| (v.ticket_id.clone(), v.count))
            .collect();
        pairs.sort();
        pairs
    }

    /// Drop the ticket's open poll and its ballots; closed polls stay as history
    fn discard_open_polls(&mut self, ticket_id: &TicketId) {
        let open: Vec<PollId> = self
            .polls
            .values()
            .filter(|p| &p.ticket_id == ticket_id && p.open)
            .map(|p| p.id.clone())
            .collect();
        self.ballots.retain(|(poll_id, _), _| !open.contains(poll_id));
        self.polls.retain(|id, _| !open.contains(id));
    }

    fn bump_poll(&mut self, poll_id: &PollId) {
        if let Some(poll) = self.polls.get_mut(poll_id) {
            poll.version += 1;
        }
    }
}

/// In-memory implementation of [`RecordStore`].
#[derive(Default)]
pub struct InMemoryRecordStore {
    state: Mutex<MemoryState>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    // ==================== Sessions ====================

    async fn insert_session(&self, session: &LeanSession) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if state
            .sessions
            .values()
            .any(|s| s.short_code == session.short_code)
        {
            return Err(StoreError::UniqueViolation(Constraint::SessionShortCode));
        }
        state.sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<LeanSession>, StoreError> {
        Ok(self.lock()?.sessions.get(id).cloned())
    }

    async fn find_session_by_short_code(
        &self,
        code: &ShortCode,
    ) -> Result<Option<LeanSession>, StoreError> {
        Ok(self
            .lock()?
            .sessions
            .values()
            .find(|s| &s.short_code == code)
            .cloned())
    }

    async fn touch_session(&self, id: &SessionId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let session = state
            .sessions
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("session", id))?;
        if at > session.last_interaction_at {
            session.last_interaction_at = at;
        }
        Ok(())
    }

    // ==================== Participants ====================

    async fn insert_participant(&self, participant: &Participant) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if state.participants.values().any(|p| {
            p.session_id == participant.session_id && p.username == participant.username
        }) {
            return Err(StoreError::UniqueViolation(Constraint::UsernamePerSession));
        }
        state
            .participants
            .insert(participant.id.clone(), participant.clone());
        Ok(())
    }

    async fn get_participant(&self, id: &UserId) -> Result<Option<Participant>, StoreError> {
        Ok(self.lock()?.participants.get(id).cloned())
    }

    async fn find_participant_by_username(
        &self,
        session_id: &SessionId,
        username: &Username,
    ) -> Result<Option<Participant>, StoreError> {
        Ok(self
            .lock()?
            .participants
            .values()
            .find(|p| &p.session_id == session_id && &p.username == username)
            .cloned())
    }

    async fn list_participants(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<Participant>, StoreError> {
        Ok(self
            .lock()?
            .participants
            .values()
            .filter(|p| &p.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn touch_participant(
        &self,
        id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<Participant, StoreError> {
        let mut state = self.lock()?;
        let participant = state
            .participants
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("user", id))?;
        participant.touch(at);
        Ok(participant.clone())
    }

    // ==================== Tickets ====================

    async fn insert_ticket(&self, ticket: &Ticket) -> Result<Ticket, StoreError> {
        let mut state = self.lock()?;
        if state.doing_taken_by_other(ticket) {
            return Err(StoreError::UniqueViolation(Constraint::DoingPerSession));
        }
        let mut stored = ticket.clone();
        stored.version = 1;
        state.tickets.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn get_ticket(&self, id: &TicketId) -> Result<Option<Ticket>, StoreError> {
        Ok(self.lock()?.tickets.get(id).cloned())
    }

    async fn list_tickets(&self, session_id: &SessionId) -> Result<Vec<Ticket>, StoreError> {
        Ok(self
            .lock()?
            .tickets
            .values()
            .filter(|t| &t.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn update_ticket(&self, ticket: &Ticket) -> Result<Ticket, StoreError> {
        let mut state = self.lock()?;
        let current = state
            .tickets
            .get(&ticket.id)
            .ok_or_else(|| StoreError::not_found("ticket", &ticket.id))?;
        if current.version != ticket.version {
            return Err(StoreError::version_conflict("ticket", &ticket.id));
        }
        let left_doing = current.space == Space::Doing && ticket.space != Space::Doing;
        if state.doing_taken_by_other(ticket) {
            return Err(StoreError::UniqueViolation(Constraint::DoingPerSession));
        }

        let mut stored = ticket.clone();
        stored.version += 1;
        state.tickets.insert(stored.id.clone(), stored.clone());
        if left_doing {
            state.discard_open_polls(&ticket.id);
        }
        Ok(stored)
    }

    async fn delete_ticket(&self, id: &TicketId) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if state.tickets.remove(id).is_none() {
            return Err(StoreError::not_found("ticket", id));
        }

        state.votes.retain(|(_, ticket_id, _), _| ticket_id != id);
        let polls: Vec<PollId> = state
            .polls
            .values()
            .filter(|p| &p.ticket_id == id)
            .map(|p| p.id.clone())
            .collect();
        state.ballots.retain(|(poll_id, _), _| !polls.contains(poll_id));
        state.polls.retain(|_, p| &p.ticket_id != id);
        Ok(())
    }

    // ==================== Voting rounds ====================

    async fn insert_round(
        &self,
        round: &VotingRound,
        statuses: &[VoterStatus],
    ) -> Result<VotingRound, StoreError> {
        let mut state = self.lock()?;
        if round.active
            && state
                .rounds
                .values()
                .any(|r| r.session_id == round.session_id && r.active)
        {
            return Err(StoreError::UniqueViolation(Constraint::ActiveRoundPerSession));
        }

        let mut stored = round.clone();
        stored.version = 1;
        state.rounds.insert(stored.id.clone(), stored.clone());
        for status in statuses {
            state.statuses.insert(
                (status.round_id.clone(), status.user_id.clone()),
                status.clone(),
            );
        }
        Ok(stored)
    }

    async fn get_round(&self, id: &RoundId) -> Result<Option<VotingRound>, StoreError> {
        Ok(self.lock()?.rounds.get(id).cloned())
    }

    async fn find_active_round(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<VotingRound>, StoreError> {
        Ok(self
            .lock()?
            .rounds
            .values()
            .find(|r| &r.session_id == session_id && r.active)
            .cloned())
    }

    async fn update_round(&self, round: &VotingRound) -> Result<VotingRound, StoreError> {
        let mut state = self.lock()?;
        let current = state
            .rounds
            .get(&round.id)
            .ok_or_else(|| StoreError::not_found("voting round", &round.id))?;
        if current.version != round.version {
            return Err(StoreError::version_conflict("voting round", &round.id));
        }

        let mut stored = round.clone();
        stored.version += 1;
        state.rounds.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn list_voter_statuses(
        &self,
        round_id: &RoundId,
    ) -> Result<Vec<VoterStatus>, StoreError> {
        let state = self.lock()?;
        let Some(round) = state.rounds.get(round_id) else {
            return Ok(Vec::new());
        };
        // Frozen participant order
        Ok(round
            .participants
            .iter()
            .filter_map(|user| state.statuses.get(&(round_id.clone(), user.clone())))
            .cloned()
            .collect())
    }

    async fn mark_voter_done(
        &self,
        round_id: &RoundId,
        user_id: &UserId,
    ) -> Result<VoterStatus, StoreError> {
        let mut state = self.lock()?;
        let status = state
            .statuses
            .get_mut(&(round_id.clone(), user_id.clone()))
            .ok_or_else(|| StoreError::not_found("voter status", user_id))?;
        status.done = true;
        Ok(status.clone())
    }

    async fn list_votes(&self, round_id: &RoundId) -> Result<Vec<Vote>, StoreError> {
        let mut votes: Vec<Vote> = self
            .lock()?
            .votes
            .values()
            .filter(|v| &v.round_id == round_id)
            .cloned()
            .collect();
        votes.sort_by(|a, b| {
            (&a.user_id, &a.ticket_id).cmp(&(&b.user_id, &b.ticket_id))
        });
        Ok(votes)
    }

    async fn apply_vote(&self, write: &VoteWrite) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        match state.rounds.get(&write.round_id) {
            Some(round) if round.active => {}
            Some(_) => {
                return Err(StoreError::Precondition(
                    "voting round is not active".to_string(),
                ));
            }
            None => return Err(StoreError::not_found("voting round", &write.round_id)),
        }

        let mut expected: Vec<(TicketId, u32)> = write
            .expected_others
            .iter()
            .map(|v| (v.ticket_id.clone(), v.count))
            .collect();
        expected.sort();
        if state.other_allocations(&write.round_id, &write.user_id, &write.ticket_id) != expected {
            return Err(StoreError::version_conflict("allocations of user", &write.user_id));
        }

        let key = (
            write.round_id.clone(),
            write.ticket_id.clone(),
            write.user_id.clone(),
        );
        match &write.vote {
            Some(vote) => {
                state.votes.insert(key, vote.clone());
            }
            None => {
                state.votes.remove(&key);
            }
        }
        Ok(())
    }

    // ==================== Continuation polls ====================

    async fn insert_poll(&self, poll: &ContinuationPoll) -> Result<ContinuationPoll, StoreError> {
        let mut state = self.lock()?;
        match state.tickets.get(&poll.ticket_id) {
            Some(ticket) if ticket.space == Space::Doing => {}
            Some(_) => {
                return Err(StoreError::Precondition(
                    "ticket is not in DOING".to_string(),
                ));
            }
            None => return Err(StoreError::not_found("ticket", &poll.ticket_id)),
        }
        if poll.open
            && state
                .polls
                .values()
                .any(|p| p.ticket_id == poll.ticket_id && p.open)
        {
            return Err(StoreError::UniqueViolation(Constraint::OpenPollPerTicket));
        }

        let mut stored = poll.clone();
        stored.version = 1;
        state.polls.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn get_poll(&self, id: &PollId) -> Result<Option<ContinuationPoll>, StoreError> {
        Ok(self.lock()?.polls.get(id).cloned())
    }

    async fn find_open_poll(
        &self,
        ticket_id: &TicketId,
    ) -> Result<Option<ContinuationPoll>, StoreError> {
        Ok(self
            .lock()?
            .polls
            .values()
            .find(|p| &p.ticket_id == ticket_id && p.open)
            .cloned())
    }

    async fn update_poll(&self, poll: &ContinuationPoll) -> Result<ContinuationPoll, StoreError> {
        let mut state = self.lock()?;
        let current = state
            .polls
            .get(&poll.id)
            .ok_or_else(|| StoreError::not_found("continuation poll", &poll.id))?;
        if current.version != poll.version {
            return Err(StoreError::version_conflict("continuation poll", &poll.id));
        }

        let mut stored = poll.clone();
        stored.version += 1;
        state.polls.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn upsert_ballot(
        &self,
        ballot: &ContinuationBallot,
    ) -> Result<ContinuationBallot, StoreError> {
        let mut state = self.lock()?;
        match state.polls.get(&ballot.poll_id) {
            Some(poll) if poll.open => {}
            Some(_) => {
                return Err(StoreError::Precondition(
                    "continuation poll is closed".to_string(),
                ));
            }
            None => return Err(StoreError::not_found("continuation poll", &ballot.poll_id)),
        }

        state.ballots.insert(
            (ballot.poll_id.clone(), ballot.user_id.clone()),
            ballot.clone(),
        );
        state.bump_poll(&ballot.poll_id);
        Ok(ballot.clone())
    }

    async fn list_ballots(&self, poll_id: &PollId) -> Result<Vec<ContinuationBallot>, StoreError> {
        let mut ballots: Vec<ContinuationBallot> = self
            .lock()?
            .ballots
            .values()
            .filter(|b| &b.poll_id == poll_id)
            .cloned()
            .collect();
        ballots.sort_by(|a, b| a.cast_at.cmp(&b.cast_at).then_with(|| a.user_id.cmp(&b.user_id)));
        Ok(ballots)
    }

    async fn delete_ballots(&self, poll_id: &PollId) -> Result<usize, StoreError> {
        let mut state = self.lock()?;
        let before = state.ballots.len();
        state.ballots.retain(|(id, _), _| id != poll_id);
        let removed = before - state.ballots.len();
        state.bump_poll(poll_id);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use leancup_domain::{
        Choice, ClosedBy, ContinuationTally, Description, SessionName, VoteCount,
    };

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()
    }

    fn session(code: &str) -> LeanSession {
        LeanSession::new(
            SessionName::try_new("Retro", 100).unwrap(),
            ShortCode::parse(code).unwrap(),
            t0(),
        )
    }

    fn ticket(session_id: &SessionId) -> Ticket {
        Ticket::new(
            session_id.clone(),
            UserId::new("ana"),
            Description::try_new("Topic", 1000).unwrap(),
            t0(),
        )
    }

    async fn doing_ticket(store: &InMemoryRecordStore, session_id: &SessionId) -> Ticket {
        let mut t = ticket(session_id);
        t.space = Space::Doing;
        store.insert_ticket(&t).await.unwrap()
    }

    fn open_poll(ticket: &Ticket) -> ContinuationPoll {
        ContinuationPoll::open(
            ticket.id.clone(),
            ticket.session_id.clone(),
            vec![UserId::new("ana")],
            t0(),
        )
    }

    #[tokio::test]
    async fn test_short_code_is_unique() {
        let store = InMemoryRecordStore::new();
        store.insert_session(&session("abc-def-ghi")).await.unwrap();
        assert_eq!(
            store.insert_session(&session("abc-def-ghi")).await,
            Err(StoreError::UniqueViolation(Constraint::SessionShortCode))
        );
    }

    #[tokio::test]
    async fn test_username_unique_per_session() {
        let store = InMemoryRecordStore::new();
        let name = Username::try_new("ana", 50).unwrap();
        let s1 = SessionId::new("s1");
        let s2 = SessionId::new("s2");

        store
            .insert_participant(&Participant::new(s1.clone(), name.clone(), t0()))
            .await
            .unwrap();
        // Same name in another session is fine
        store
            .insert_participant(&Participant::new(s2, name.clone(), t0()))
            .await
            .unwrap();
        assert_eq!(
            store
                .insert_participant(&Participant::new(s1, name, t0()))
                .await,
            Err(StoreError::UniqueViolation(Constraint::UsernamePerSession))
        );
    }

    #[tokio::test]
    async fn test_update_ticket_checks_version() {
        let store = InMemoryRecordStore::new();
        let stored = store.insert_ticket(&ticket(&SessionId::new("s1"))).await.unwrap();
        assert_eq!(stored.version, 1);

        let mut first = stored.clone();
        first.space = Space::Todo;
        let first = store.update_ticket(&first).await.unwrap();
        assert_eq!(first.version, 2);

        // A writer still holding version 1 loses
        let mut stale = stored;
        stale.space = Space::Archive;
        assert!(matches!(
            store.update_ticket(&stale).await,
            Err(StoreError::VersionConflict { .. })
        ));
    }

    #[tokio::test]
    async fn test_doing_is_unique_per_session() {
        let store = InMemoryRecordStore::new();
        let session_id = SessionId::new("s1");
        let mut a = store.insert_ticket(&ticket(&session_id)).await.unwrap();
        let mut b = store.insert_ticket(&ticket(&session_id)).await.unwrap();
        let mut elsewhere = store
            .insert_ticket(&ticket(&SessionId::new("s2")))
            .await
            .unwrap();

        a.space = Space::Doing;
        store.update_ticket(&a).await.unwrap();

        b.space = Space::Doing;
        assert_eq!(
            store.update_ticket(&b).await,
            Err(StoreError::UniqueViolation(Constraint::DoingPerSession))
        );

        elsewhere.space = Space::Doing;
        assert!(store.update_ticket(&elsewhere).await.is_ok());
    }

    #[tokio::test]
    async fn test_one_active_round_per_session() {
        let store = InMemoryRecordStore::new();
        let session_id = SessionId::new("s1");
        let round = VotingRound::new(session_id.clone(), vec![UserId::new("ana")], t0());
        let stored = store
            .insert_round(&round, &round.initial_statuses())
            .await
            .unwrap();

        let second = VotingRound::new(session_id.clone(), vec![], t0());
        assert_eq!(
            store.insert_round(&second, &[]).await,
            Err(StoreError::UniqueViolation(Constraint::ActiveRoundPerSession))
        );

        let mut closed = stored;
        closed.close(t0(), None).unwrap();
        store.update_round(&closed).await.unwrap();
        assert!(store.insert_round(&second, &[]).await.is_ok());
    }

    #[tokio::test]
    async fn test_apply_vote_checks_snapshot_and_round() {
        let store = InMemoryRecordStore::new();
        let round = VotingRound::new(SessionId::new("s1"), vec![UserId::new("ana")], t0());
        let round = store.insert_round(&round, &[]).await.unwrap();
        let ana = UserId::new("ana");

        let vote = |ticket: &str, count: u32| {
            Vote::new(
                round.id.clone(),
                TicketId::new(ticket),
                ana.clone(),
                VoteCount::try_new(count, 20).unwrap(),
                t0(),
            )
        };
        let write = |ticket: &str, count: u32, expected: Vec<Vote>| VoteWrite {
            round_id: round.id.clone(),
            ticket_id: TicketId::new(ticket),
            user_id: ana.clone(),
            expected_others: expected,
            vote: vote(ticket, count),
        };

        store.apply_vote(&write("t1", 2, vec![])).await.unwrap();

        // Snapshot taken before the t1 vote is stale
        assert!(matches!(
            store.apply_vote(&write("t2", 1, vec![])).await,
            Err(StoreError::VersionConflict { .. })
        ));

        let current = store.list_votes(&round.id).await.unwrap();
        store.apply_vote(&write("t2", 1, current)).await.unwrap();
        assert_eq!(store.list_votes(&round.id).await.unwrap().len(), 2);

        let mut closed = round.clone();
        closed.close(t0(), None).unwrap();
        store.update_round(&closed).await.unwrap();
        let current = store.list_votes(&round.id).await.unwrap();
        let others: Vec<Vote> = current
            .into_iter()
            .filter(|v| v.ticket_id != TicketId::new("t1"))
            .collect();
        assert!(matches!(
            store.apply_vote(&write("t1", 0, others)).await,
            Err(StoreError::Precondition(_))
        ));
    }

    #[tokio::test]
    async fn test_ballots_require_open_poll_and_bump_version() {
        let store = InMemoryRecordStore::new();
        let doing = doing_ticket(&store, &SessionId::new("s1")).await;
        let poll = store.insert_poll(&open_poll(&doing)).await.unwrap();
        assert_eq!(poll.version, 1);

        let ballot = ContinuationBallot::new(
            poll.id.clone(),
            doing.id.clone(),
            UserId::new("ana"),
            Choice::Continue,
            t0(),
        );
        store.upsert_ballot(&ballot).await.unwrap();

        // A close computed from the pre-ballot read must lose
        let mut stale = poll.clone();
        stale.open = false;
        assert!(matches!(
            store.update_poll(&stale).await,
            Err(StoreError::VersionConflict { .. })
        ));

        let mut fresh = store.get_poll(&poll.id).await.unwrap().unwrap();
        fresh.open = false;
        store.update_poll(&fresh).await.unwrap();

        assert!(matches!(
            store.upsert_ballot(&ballot).await,
            Err(StoreError::Precondition(_))
        ));
        assert_eq!(store.delete_ballots(&poll.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_ticket_cascades() {
        let store = InMemoryRecordStore::new();
        let stored = doing_ticket(&store, &SessionId::new("s1")).await;
        let poll = store.insert_poll(&open_poll(&stored)).await.unwrap();
        store
            .upsert_ballot(&ContinuationBallot::new(
                poll.id.clone(),
                stored.id.clone(),
                UserId::new("ana"),
                Choice::Archive,
                t0(),
            ))
            .await
            .unwrap();

        store.delete_ticket(&stored.id).await.unwrap();

        assert!(store.get_ticket(&stored.id).await.unwrap().is_none());
        assert!(store.find_open_poll(&stored.id).await.unwrap().is_none());
        assert!(store.list_ballots(&poll.id).await.unwrap().is_empty());
        assert!(matches!(
            store.delete_ticket(&stored.id).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_poll_requires_ticket_in_doing() {
        let store = InMemoryRecordStore::new();
        let todo = store.insert_ticket(&ticket(&SessionId::new("s1"))).await.unwrap();
        assert!(matches!(
            store.insert_poll(&open_poll(&todo)).await,
            Err(StoreError::Precondition(_))
        ));

        let missing = open_poll(&ticket(&SessionId::new("s1")));
        assert!(matches!(
            store.insert_poll(&missing).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_leaving_doing_discards_open_poll() {
        let store = InMemoryRecordStore::new();
        let doing = doing_ticket(&store, &SessionId::new("s1")).await;

        // A decided poll from an earlier time box is history and survives
        let mut decided = store.insert_poll(&open_poll(&doing)).await.unwrap();
        decided
            .close(ContinuationTally::default(), ClosedBy::MajorityVote, t0())
            .unwrap();
        store.update_poll(&decided).await.unwrap();

        let open = store.insert_poll(&open_poll(&doing)).await.unwrap();
        store
            .upsert_ballot(&ContinuationBallot::new(
                open.id.clone(),
                doing.id.clone(),
                UserId::new("ana"),
                Choice::Continue,
                t0(),
            ))
            .await
            .unwrap();

        let mut moved = store.get_ticket(&doing.id).await.unwrap().unwrap();
        moved.space = Space::Todo;
        store.update_ticket(&moved).await.unwrap();

        assert!(store.find_open_poll(&doing.id).await.unwrap().is_none());
        assert!(store.get_poll(&open.id).await.unwrap().is_none());
        assert!(store.list_ballots(&open.id).await.unwrap().is_empty());
        assert!(store.get_poll(&decided.id).await.unwrap().is_some());
    }
}
