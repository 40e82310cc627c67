//! Shared wiring for coordinator integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use leancup_application::{
    Coordinator, CoordinatorConfig, ManualClock, RecordStore, SessionEvent, SessionEventSink,
    ShortCodeGenerator, StoreError, UseCaseContext, VoteWrite,
};
use leancup_domain::{
    ContinuationBallot, ContinuationPoll, LeanSession, Participant, PollId, RoundId, SessionId,
    ShortCode, Space, Ticket, TicketId, UserId, Username, Vote, VoterStatus, VotingRound,
};
use leancup_infrastructure::{InMemoryRecordStore, RandomShortCodeGenerator};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()
}

/// Event sink that keeps every event for inspection
#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<SessionEvent>>,
}

impl RecordingSink {
    pub fn types(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.event_type())
            .collect()
    }

    pub fn count(&self, event_type: &str) -> usize {
        self.types().iter().filter(|t| **t == event_type).count()
    }
}

impl SessionEventSink for RecordingSink {
    fn publish(&self, event: &SessionEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Replays a fixed list of codes, repeating the last one forever
pub struct FixedCodes {
    codes: Mutex<Vec<ShortCode>>,
}

impl FixedCodes {
    pub fn new(codes: &[&str]) -> Self {
        let mut codes: Vec<ShortCode> = codes.iter().map(|c| ShortCode::parse(c).unwrap()).collect();
        codes.reverse();
        Self {
            codes: Mutex::new(codes),
        }
    }
}

impl ShortCodeGenerator for FixedCodes {
    fn generate(&self) -> ShortCode {
        let mut codes = self.codes.lock().unwrap();
        if codes.len() > 1 {
            codes.pop().unwrap()
        } else {
            codes[0].clone()
        }
    }
}

/// Store that fails ticket updates on demand and delegates everything else
pub struct TicketWriteFault {
    inner: Arc<InMemoryRecordStore>,
    failing: AtomicBool,
}

impl TicketWriteFault {
    pub fn new(inner: Arc<InMemoryRecordStore>) -> Self {
        Self {
            inner,
            failing: AtomicBool::new(false),
        }
    }

    pub fn fail_ticket_updates(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordStore for TicketWriteFault {
    async fn insert_session(&self, session: &LeanSession) -> Result<(), StoreError> {
        self.inner.insert_session(session).await
    }
    async fn get_session(&self, id: &SessionId) -> Result<Option<LeanSession>, StoreError> {
        self.inner.get_session(id).await
    }
    async fn find_session_by_short_code(
        &self,
        code: &ShortCode,
    ) -> Result<Option<LeanSession>, StoreError> {
        self.inner.find_session_by_short_code(code).await
    }
    async fn touch_session(&self, id: &SessionId, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.inner.touch_session(id, at).await
    }
    async fn insert_participant(&self, participant: &Participant) -> Result<(), StoreError> {
        self.inner.insert_participant(participant).await
    }
    async fn get_participant(&self, id: &UserId) -> Result<Option<Participant>, StoreError> {
        self.inner.get_participant(id).await
    }
    async fn find_participant_by_username(
        &self,
        session_id: &SessionId,
        username: &Username,
    ) -> Result<Option<Participant>, StoreError> {
        self.inner.find_participant_by_username(session_id, username).await
    }
    async fn list_participants(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<Participant>, StoreError> {
        self.inner.list_participants(session_id).await
    }
    async fn touch_participant(
        &self,
        id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<Participant, StoreError> {
        self.inner.touch_participant(id, at).await
    }
    async fn insert_ticket(&self, ticket: &Ticket) -> Result<Ticket, StoreError> {
        self.inner.insert_ticket(ticket).await
    }
    async fn get_ticket(&self, id: &TicketId) -> Result<Option<Ticket>, StoreError> {
        self.inner.get_ticket(id).await
    }
    async fn list_tickets(&self, session_id: &SessionId) -> Result<Vec<Ticket>, StoreError> {
        self.inner.list_tickets(session_id).await
    }
    async fn update_ticket(&self, ticket: &Ticket) -> Result<Ticket, StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("ticket writes disabled".to_string()));
        }
        self.inner.update_ticket(ticket).await
    }
    async fn delete_ticket(&self, id: &TicketId) -> Result<(), StoreError> {
        self.inner.delete_ticket(id).await
    }
    async fn insert_round(
        &self,
        round: &VotingRound,
        statuses: &[VoterStatus],
    ) -> Result<VotingRound, StoreError> {
        self.inner.insert_round(round, statuses).await
    }
    async fn get_round(&self, id: &RoundId) -> Result<Option<VotingRound>, StoreError> {
        self.inner.get_round(id).await
    }
    async fn find_active_round(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<VotingRound>, StoreError> {
        self.inner.find_active_round(session_id).await
    }
    async fn update_round(&self, round: &VotingRound) -> Result<VotingRound, StoreError> {
        self.inner.update_round(round).await
    }
    async fn list_voter_statuses(
        &self,
        round_id: &RoundId,
    ) -> Result<Vec<VoterStatus>, StoreError> {
        self.inner.list_voter_statuses(round_id).await
    }
    async fn mark_voter_done(
        &self,
        round_id: &RoundId,
        user_id: &UserId,
    ) -> Result<VoterStatus, StoreError> {
        self.inner.mark_voter_done(round_id, user_id).await
    }
    async fn list_votes(&self, round_id: &RoundId) -> Result<Vec<Vote>, StoreError> {
        self.inner.list_votes(round_id).await
    }
    async fn apply_vote(&self, write: &VoteWrite) -> Result<(), StoreError> {
        self.inner.apply_vote(write).await
    }
    async fn insert_poll(&self, poll: &ContinuationPoll) -> Result<ContinuationPoll, StoreError> {
        self.inner.insert_poll(poll).await
    }
    async fn get_poll(&self, id: &PollId) -> Result<Option<ContinuationPoll>, StoreError> {
        self.inner.get_poll(id).await
    }
    async fn find_open_poll(
        &self,
        ticket_id: &TicketId,
    ) -> Result<Option<ContinuationPoll>, StoreError> {
        self.inner.find_open_poll(ticket_id).await
    }
    async fn update_poll(&self, poll: &ContinuationPoll) -> Result<ContinuationPoll, StoreError> {
        self.inner.update_poll(poll).await
    }
    async fn upsert_ballot(
        &self,
        ballot: &ContinuationBallot,
    ) -> Result<ContinuationBallot, StoreError> {
        self.inner.upsert_ballot(ballot).await
    }
    async fn list_ballots(&self, poll_id: &PollId) -> Result<Vec<ContinuationBallot>, StoreError> {
        self.inner.list_ballots(poll_id).await
    }
    async fn delete_ballots(&self, poll_id: &PollId) -> Result<usize, StoreError> {
        self.inner.delete_ballots(poll_id).await
    }
}

pub struct Harness {
    pub coordinator: Arc<Coordinator>,
    pub clock: Arc<ManualClock>,
    pub store: Arc<InMemoryRecordStore>,
    pub events: Arc<RecordingSink>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(
            CoordinatorConfig::default(),
            Arc::new(RandomShortCodeGenerator::seeded(42)),
        )
    }

    pub fn with(config: CoordinatorConfig, codes: Arc<dyn ShortCodeGenerator>) -> Self {
        let clock = Arc::new(ManualClock::new(t0()));
        let store = Arc::new(InMemoryRecordStore::new());
        let events = Arc::new(RecordingSink::default());
        let ctx = UseCaseContext::new(store.clone(), clock.clone(), events.clone(), config);
        Self {
            coordinator: Arc::new(Coordinator::new(ctx, codes)),
            clock,
            store,
            events,
        }
    }

    /// Harness whose coordinator writes through a [`TicketWriteFault`]
    pub fn with_faults() -> (Self, Arc<TicketWriteFault>) {
        let clock = Arc::new(ManualClock::new(t0()));
        let store = Arc::new(InMemoryRecordStore::new());
        let faults = Arc::new(TicketWriteFault::new(store.clone()));
        let events = Arc::new(RecordingSink::default());
        let ctx = UseCaseContext::new(
            faults.clone(),
            clock.clone(),
            events.clone(),
            CoordinatorConfig::default(),
        );
        let harness = Self {
            coordinator: Arc::new(Coordinator::new(
                ctx,
                Arc::new(RandomShortCodeGenerator::seeded(42)),
            )),
            clock,
            store,
            events,
        };
        (harness, faults)
    }

    pub fn tick(&self, ms: i64) {
        self.clock.advance(chrono::Duration::milliseconds(ms));
    }

    pub async fn session(&self) -> SessionId {
        self.coordinator.sessions.create("Team retro").await.unwrap().id
    }

    pub async fn join(&self, session_id: &SessionId, name: &str) -> UserId {
        self.coordinator
            .sessions
            .join(session_id, name)
            .await
            .unwrap()
            .user
            .id
    }

    pub async fn ticket_in(
        &self,
        session_id: &SessionId,
        owner: &UserId,
        text: &str,
        space: Space,
    ) -> Ticket {
        let ticket = self
            .coordinator
            .tickets
            .create(session_id, owner, text)
            .await
            .unwrap();
        if space == Space::Personal {
            return ticket;
        }
        self.coordinator
            .tickets
            .move_to_space(&ticket.id, space, owner, Some("owner"))
            .await
            .unwrap()
    }
}

impl Harness {
    /// Current stored state of a ticket
    pub async fn store_ticket(&self, ticket: &Ticket) -> Ticket {
        self.store.get_ticket(&ticket.id).await.unwrap().unwrap()
    }
}
