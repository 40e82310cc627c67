//! Continuation voting use case
//!
//! Decides whether the ticket in DOING keeps being discussed once its time
//! box runs out.
//!
//! Taking the ticket out of DOING discards its open poll in the same store
//! write, so each discussion starts with a clean ballot set.
//!
//! # Exactly-once decisions
//!
//! Ballots collect in the ticket's open [`ContinuationPoll`]. The request
//! that flips the poll `open → closed` (a conditional write on the poll's
//! version) is the only one that applies the decision. Ballot writes bump
//! the same version, so a close that raced with a late ballot re-reads and
//! re-tallies instead of deciding on stale counts.
//!
//! Applying the decision to the ticket is a second write. If it fails after
//! the close landed, the poll stays closed with its recorded decision, the
//! ticket is left as it was and the failure is logged at `warn` with the
//! poll id.

use crate::error::CoreError;
use crate::ports::event_sink::SessionEvent;
use crate::ports::record_store::{Constraint, StoreError};
use crate::use_cases::shared::UseCaseContext;
use leancup_domain::{
    Choice, ClosedBy, ContinuationBallot, ContinuationPoll, ContinuationTally, Decision, PollId,
    Space, Ticket, TicketId, UserId,
};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Outcome of a closed poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PollOutcome {
    pub decision: Decision,
    pub continue_count: usize,
    pub archive_count: usize,
}

impl PollOutcome {
    fn new(decision: Decision, tally: ContinuationTally) -> Self {
        Self {
            decision,
            continue_count: tally.continue_count,
            archive_count: tally.archive_count,
        }
    }
}

/// Result of a cast: the stored ballot, plus the decision if it completed
/// the quorum
#[derive(Debug, Clone, Serialize)]
pub struct CastBallotOutcome {
    pub ballot: ContinuationBallot,
    pub decision: Option<PollOutcome>,
}

/// Use case for continuation voting
pub struct ContinuationUseCase {
    ctx: UseCaseContext,
}

impl ContinuationUseCase {
    pub fn new(ctx: UseCaseContext) -> Self {
        Self { ctx }
    }

    async fn require_doing(&self, ticket_id: &TicketId, action: &str) -> Result<Ticket, CoreError> {
        let ticket = self.ctx.require_ticket(ticket_id).await?;
        if ticket.space != Space::Doing {
            return Err(CoreError::InvalidState(format!(
                "can only {} on tickets in DOING",
                action
            )));
        }
        Ok(ticket)
    }

    /// The ticket's open poll, opening one if there is none
    ///
    /// Opening freezes the session's current membership as the poll's
    /// participants. Two requests opening at once meet at the store's
    /// one-open-poll constraint; the loser adopts the winner's poll.
    async fn open_poll(&self, ticket: &Ticket) -> Result<ContinuationPoll, CoreError> {
        if let Some(poll) = self.ctx.store.find_open_poll(&ticket.id).await? {
            return Ok(poll);
        }

        let participants: Vec<UserId> = self
            .ctx
            .store
            .list_participants(&ticket.session_id)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();
        let poll = ContinuationPoll::open(
            ticket.id.clone(),
            ticket.session_id.clone(),
            participants,
            self.ctx.clock.now(),
        );

        match self.ctx.store.insert_poll(&poll).await {
            Ok(stored) => {
                debug!(poll_id = %stored.id, ticket_id = %ticket.id, "Continuation poll opened");
                Ok(stored)
            }
            Err(StoreError::Precondition(_)) => Err(CoreError::InvalidState(
                "ticket left DOING before its continuation poll opened".to_string(),
            )),
            Err(StoreError::UniqueViolation(Constraint::OpenPollPerTicket)) => self
                .ctx
                .store
                .find_open_poll(&ticket.id)
                .await?
                .ok_or_else(|| {
                    CoreError::Conflict("continuation poll closed while opening".to_string())
                }),
            Err(e) => Err(e.into()),
        }
    }

    /// Record the user's choice; decides the poll once everyone has voted
    pub async fn cast(
        &self,
        ticket_id: &TicketId,
        user_id: &UserId,
        choice: Choice,
    ) -> Result<CastBallotOutcome, CoreError> {
        let ticket = self.ctx.require_ticket(ticket_id).await?;
        self.ctx.require_member(user_id, &ticket.session_id).await?;

        let limit = self.ctx.config.cas_retry_limit;
        for attempt in 1..=limit {
            let ticket = self.require_doing(ticket_id, "vote").await?;
            let poll = self.open_poll(&ticket).await?;
            let ballot = ContinuationBallot::new(
                poll.id.clone(),
                ticket_id.clone(),
                user_id.clone(),
                choice,
                self.ctx.clock.now(),
            );

            match self.ctx.store.upsert_ballot(&ballot).await {
                Ok(stored) => {
                    debug!(ticket_id = %ticket_id, user_id = %user_id, %choice, "Continuation ballot cast");
                    let ballots = self.ctx.store.list_ballots(&poll.id).await?;
                    let decision = if poll.quorum_reached(&ballots) {
                        self.decide(&poll.id, ClosedBy::MajorityVote).await?
                    } else {
                        None
                    };
                    return Ok(CastBallotOutcome {
                        ballot: stored,
                        decision,
                    });
                }
                Err(StoreError::Precondition(_)) | Err(StoreError::NotFound { .. }) => {
                    // Poll closed or discarded between read and write; the next cycle re-checks
                    debug!(ticket_id = %ticket_id, attempt, "Continuation poll closed underneath, retrying");
                    tokio::task::yield_now().await;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CoreError::Conflict(format!(
            "continuation poll kept closing, gave up after {} attempts",
            limit
        )))
    }

    /// Ballots of the ticket's open poll
    pub async fn list_ballots(
        &self,
        ticket_id: &TicketId,
    ) -> Result<Vec<ContinuationBallot>, CoreError> {
        self.ctx.require_ticket(ticket_id).await?;
        match self.ctx.store.find_open_poll(ticket_id).await? {
            Some(poll) => Ok(self.ctx.store.list_ballots(&poll.id).await?),
            None => Ok(Vec::new()),
        }
    }

    /// Discard the ballots of the ticket's open poll without deciding
    pub async fn clear_ballots(&self, ticket_id: &TicketId) -> Result<usize, CoreError> {
        self.ctx.require_ticket(ticket_id).await?;
        let Some(poll) = self.ctx.store.find_open_poll(ticket_id).await? else {
            return Ok(0);
        };
        let cleared = self.ctx.store.delete_ballots(&poll.id).await?;
        debug!(ticket_id = %ticket_id, cleared, "Continuation ballots cleared");
        Ok(cleared)
    }

    /// Decide now on whatever ballots exist
    ///
    /// If a concurrent request decides the poll first, its outcome is
    /// reported instead of applying a second decision.
    pub async fn force_end(&self, ticket_id: &TicketId) -> Result<PollOutcome, CoreError> {
        let ticket = self.require_doing(ticket_id, "force end a vote").await?;
        let poll = self.open_poll(&ticket).await?;

        if let Some(outcome) = self.decide(&poll.id, ClosedBy::ForcedVoteEnd).await? {
            return Ok(outcome);
        }

        let closed = self
            .ctx
            .store
            .get_poll(&poll.id)
            .await?
            .ok_or_else(|| CoreError::not_found("continuation poll", &poll.id))?;
        match (closed.decision, closed.tally) {
            (Some(decision), Some(tally)) => Ok(PollOutcome::new(decision, tally)),
            _ => Err(CoreError::Conflict(
                "continuation poll closed without a decision".to_string(),
            )),
        }
    }

    /// Attempt `open → closed` and apply the decision
    ///
    /// Returns `None` if another request closed the poll first.
    async fn decide(
        &self,
        poll_id: &PollId,
        closed_by: ClosedBy,
    ) -> Result<Option<PollOutcome>, CoreError> {
        let limit = self.ctx.config.cas_retry_limit;
        for attempt in 1..=limit {
            let Some(mut poll) = self.ctx.store.get_poll(poll_id).await? else {
                return Ok(None);
            };
            if !poll.open {
                return Ok(None);
            }

            let ballots = self.ctx.store.list_ballots(poll_id).await?;
            let tally = ContinuationTally::from_ballots(&ballots);
            let now = self.ctx.clock.now();
            let decision = poll.close(tally, closed_by, now)?;

            match self.ctx.store.update_poll(&poll).await {
                Ok(stored) => {
                    let applied = self
                        .ctx
                        .modify_ticket(&stored.ticket_id, |ticket| {
                            // A ticket moved out of DOING meanwhile keeps its new place
                            if ticket.space != Space::Doing {
                                return Ok(());
                            }
                            Ok(decision.apply(ticket, closed_by, now)?)
                        })
                        .await;
                    if let Err(e) = applied {
                        warn!(
                            poll_id = %poll_id,
                            ticket_id = %stored.ticket_id,
                            ?decision,
                            error = %e,
                            "Continuation poll closed but its decision was not applied"
                        );
                        return Err(e);
                    }
                    self.ctx.store.delete_ballots(poll_id).await?;

                    info!(
                        ticket_id = %stored.ticket_id,
                        ?decision,
                        continue_count = tally.continue_count,
                        archive_count = tally.archive_count,
                        closed_by = %closed_by,
                        "Continuation poll decided"
                    );
                    self.ctx.publish(SessionEvent::PollDecided {
                        session_id: stored.session_id.clone(),
                        ticket_id: stored.ticket_id.clone(),
                        poll_id: stored.id.clone(),
                        decision,
                        closed_by,
                        continue_count: tally.continue_count,
                        archive_count: tally.archive_count,
                    });
                    return Ok(Some(PollOutcome::new(decision, tally)));
                }
                Err(StoreError::VersionConflict { .. }) => {
                    debug!(poll_id = %poll_id, attempt, "Poll changed underneath, re-tallying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CoreError::Conflict(format!(
            "continuation poll {} kept changing, gave up after {} attempts",
            poll_id, limit
        )))
    }
}
