//! Quadratic voting use case
//!
//! Runs prioritization rounds over a session's `TODO` queue.
//!
//! # Closing a round
//!
//! A round closes when every frozen participant has marked themselves done,
//! or when anyone forces it closed. Several requests may notice the quorum at
//! once; each attempts the conditional `active → closed` write on the round's
//! version and only the one that succeeds tallies. The others observe a
//! closed round and report `closed = false`.
//!
//! The close and the ticket tally writes are separate store calls. If a
//! tally write fails after the close landed, the round stays closed with
//! partial tallies and the failure is logged at `warn` with the round id;
//! nothing retries it.

use crate::error::CoreError;
use crate::ports::event_sink::SessionEvent;
use crate::ports::record_store::{StoreError, VoteWrite};
use crate::use_cases::shared::UseCaseContext;
use leancup_domain::{
    RoundId, SessionId, Space, TicketId, UserId, Vote, VoteCount, VoterStatus, VotingRound,
    point_budget, spent_excluding, tally_by_ticket,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// The active round of a session with live budget
#[derive(Debug, Clone, Serialize)]
pub struct ActiveRoundView {
    pub round: VotingRound,
    pub statuses: Vec<VoterStatus>,
    pub budget: u64,
}

/// Result of a cast: the stored allocation, or its removal
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CastOutcome {
    Recorded(Vote),
    Deleted { deleted: bool },
}

/// A participant's allocations in one round
#[derive(Debug, Clone, Serialize)]
pub struct VoteSummary {
    pub votes: Vec<Vote>,
    pub spent: u64,
    pub budget: u64,
    pub remaining: u64,
}

/// Result of marking a participant done
#[derive(Debug, Clone, Serialize)]
pub struct MarkDoneOutcome {
    pub status: VoterStatus,
    /// Whether this request closed the round and wrote the tallies
    pub closed: bool,
}

/// Result of a forced close
#[derive(Debug, Clone, Serialize)]
pub struct ForceCloseOutcome {
    pub round: VotingRound,
    pub tallies: BTreeMap<TicketId, u32>,
}

/// Use case for quadratic prioritization voting
pub struct VotingUseCase {
    ctx: UseCaseContext,
}

impl VotingUseCase {
    pub fn new(ctx: UseCaseContext) -> Self {
        Self { ctx }
    }

    async fn require_round(&self, id: &RoundId) -> Result<VotingRound, CoreError> {
        self.ctx
            .store
            .get_round(id)
            .await?
            .ok_or_else(|| CoreError::not_found("voting round", id))
    }

    async fn todo_count(&self, session_id: &SessionId) -> Result<usize, CoreError> {
        Ok(self
            .ctx
            .store
            .list_tickets(session_id)
            .await?
            .iter()
            .filter(|t| t.space == Space::Todo)
            .count())
    }

    async fn budget(&self, session_id: &SessionId) -> Result<u64, CoreError> {
        Ok(point_budget(self.todo_count(session_id).await?))
    }

    /// Start a round with every current member as a frozen participant
    pub async fn start_round(&self, session_id: &SessionId) -> Result<VotingRound, CoreError> {
        self.ctx.require_session(session_id).await?;

        if self
            .ctx
            .store
            .find_active_round(session_id)
            .await?
            .is_some()
        {
            return Err(CoreError::Conflict(
                "a voting round is already active".to_string(),
            ));
        }

        let todo = self.todo_count(session_id).await?;
        if todo < 2 {
            return Err(CoreError::Validation(format!(
                "need at least 2 tickets in TODO to start voting, found {}",
                todo
            )));
        }

        let participants: Vec<UserId> = self
            .ctx
            .store
            .list_participants(session_id)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();
        let round = VotingRound::new(session_id.clone(), participants, self.ctx.clock.now());
        let stored = self
            .ctx
            .store
            .insert_round(&round, &round.initial_statuses())
            .await?;

        info!(
            round_id = %stored.id,
            session_id = %session_id,
            participants = stored.participants.len(),
            "Voting round started"
        );
        self.ctx.publish(SessionEvent::RoundStarted {
            session_id: session_id.clone(),
            round_id: stored.id.clone(),
            participants: stored.participants.len(),
        });
        Ok(stored)
    }

    /// The session's active round, if any
    pub async fn active_round(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<ActiveRoundView>, CoreError> {
        self.ctx.require_session(session_id).await?;
        let Some(round) = self.ctx.store.find_active_round(session_id).await? else {
            return Ok(None);
        };
        let statuses = self.ctx.store.list_voter_statuses(&round.id).await?;
        let budget = self.budget(session_id).await?;
        Ok(Some(ActiveRoundView {
            round,
            statuses,
            budget,
        }))
    }

    /// Set the user's absolute allocation to a ticket
    ///
    /// The budget check and the write are tied together by the store: the
    /// write only lands if the user's other allocations are still the ones
    /// the check summed, so concurrent casts cannot jointly overspend.
    pub async fn cast_vote(
        &self,
        round_id: &RoundId,
        ticket_id: &TicketId,
        user_id: &UserId,
        count: u32,
    ) -> Result<CastOutcome, CoreError> {
        let count = VoteCount::try_new(count, self.ctx.config.max_vote_count)?;
        let round = self.require_round(round_id).await?;
        if !round.active {
            return Err(CoreError::InvalidState(
                "voting round is not active".to_string(),
            ));
        }
        self.ctx.require_member(user_id, &round.session_id).await?;
        let ticket = self.ctx.require_ticket(ticket_id).await?;
        if ticket.session_id != round.session_id || ticket.space != Space::Todo {
            return Err(CoreError::InvalidState(
                "only TODO tickets of the round's session can receive votes".to_string(),
            ));
        }

        let limit = self.ctx.config.cas_retry_limit;
        for attempt in 1..=limit {
            let mine: Vec<Vote> = self
                .ctx
                .store
                .list_votes(round_id)
                .await?
                .into_iter()
                .filter(|v| &v.user_id == user_id)
                .collect();
            let spent = spent_excluding(&mine, user_id, Some(ticket_id));
            let budget = self.budget(&round.session_id).await?;
            let requested = count.cost();
            if spent + requested > budget {
                return Err(CoreError::BudgetExceeded {
                    requested,
                    spent,
                    budget,
                });
            }

            let vote = Vote::new(
                round_id.clone(),
                ticket_id.clone(),
                user_id.clone(),
                count,
                self.ctx.clock.now(),
            );
            let write = VoteWrite {
                round_id: round_id.clone(),
                ticket_id: ticket_id.clone(),
                user_id: user_id.clone(),
                expected_others: mine
                    .into_iter()
                    .filter(|v| &v.ticket_id != ticket_id)
                    .collect(),
                vote: vote.clone(),
            };

            match self.ctx.store.apply_vote(&write).await {
                Ok(()) => {
                    debug!(round_id = %round_id, ticket_id = %ticket_id, user_id = %user_id, count = count.get(), "Vote cast");
                    return Ok(match vote {
                        Some(vote) => CastOutcome::Recorded(vote),
                        None => CastOutcome::Deleted { deleted: true },
                    });
                }
                Err(StoreError::VersionConflict { .. }) => {
                    debug!(round_id = %round_id, user_id = %user_id, attempt, "Allocations changed underneath, retrying");
                    tokio::task::yield_now().await;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CoreError::Conflict(format!(
            "allocations kept changing, gave up after {} attempts",
            limit
        )))
    }

    /// The user's allocations in a round with live budget
    pub async fn list_votes(
        &self,
        round_id: &RoundId,
        user_id: &UserId,
    ) -> Result<VoteSummary, CoreError> {
        let round = self.require_round(round_id).await?;
        let votes: Vec<Vote> = self
            .ctx
            .store
            .list_votes(round_id)
            .await?
            .into_iter()
            .filter(|v| &v.user_id == user_id)
            .collect();
        let spent = spent_excluding(&votes, user_id, None);
        let budget = self.budget(&round.session_id).await?;
        Ok(VoteSummary {
            votes,
            spent,
            budget,
            remaining: budget.saturating_sub(spent),
        })
    }

    /// Mark the user done; closes and tallies the round on quorum
    pub async fn mark_done(
        &self,
        round_id: &RoundId,
        user_id: &UserId,
    ) -> Result<MarkDoneOutcome, CoreError> {
        let round = self.require_round(round_id).await?;
        let status = self
            .ctx
            .store
            .mark_voter_done(round_id, user_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => {
                    CoreError::not_found("voter status", format!("{} in round {}", user_id, round_id))
                }
                other => other.into(),
            })?;

        let mut closed = false;
        if round.active {
            let statuses = self.ctx.store.list_voter_statuses(round_id).await?;
            if round.quorum_reached(&statuses) {
                closed = self.try_close(round_id, None).await?.is_some();
            }
        }

        Ok(MarkDoneOutcome { status, closed })
    }

    /// Close the round now, whoever is still voting
    pub async fn force_close(
        &self,
        round_id: &RoundId,
        user_id: &UserId,
        username: &str,
    ) -> Result<ForceCloseOutcome, CoreError> {
        let round = self.require_round(round_id).await?;
        if !round.active {
            return Err(CoreError::InvalidState(
                "voting round is not active".to_string(),
            ));
        }

        debug!(round_id = %round_id, user_id = %user_id, "Force closing round");
        match self.try_close(round_id, Some(username.to_string())).await? {
            Some(outcome) => Ok(outcome),
            None => Err(CoreError::InvalidState(
                "voting round is not active".to_string(),
            )),
        }
    }

    /// Attempt `active → closed`; only the winner tallies
    ///
    /// Returns `None` if another request closed the round first.
    async fn try_close(
        &self,
        round_id: &RoundId,
        forced_by: Option<String>,
    ) -> Result<Option<ForceCloseOutcome>, CoreError> {
        let limit = self.ctx.config.cas_retry_limit;
        for attempt in 1..=limit {
            let mut round = self.require_round(round_id).await?;
            if !round.active {
                return Ok(None);
            }
            let now = self.ctx.clock.now();
            round.close(now, forced_by.clone())?;

            match self.ctx.store.update_round(&round).await {
                Ok(stored) => {
                    let tallies = match self.write_tallies(&stored).await {
                        Ok(tallies) => tallies,
                        Err(e) => {
                            warn!(
                                round_id = %round_id,
                                error = %e,
                                "Round closed but its tallies were not fully written"
                            );
                            return Err(e);
                        }
                    };
                    info!(
                        round_id = %round_id,
                        forced = stored.force_closed_by.is_some(),
                        tickets = tallies.len(),
                        "Voting round closed"
                    );
                    self.ctx.publish(SessionEvent::RoundClosed {
                        session_id: stored.session_id.clone(),
                        round_id: stored.id.clone(),
                        force_closed_by: stored.force_closed_by.clone(),
                        tallies: tallies.clone(),
                    });
                    return Ok(Some(ForceCloseOutcome {
                        round: stored,
                        tallies,
                    }));
                }
                Err(StoreError::VersionConflict { .. }) => {
                    debug!(round_id = %round_id, attempt, "Round changed underneath, re-reading");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CoreError::Conflict(format!(
            "voting round {} kept changing, gave up after {} attempts",
            round_id, limit
        )))
    }

    /// Write per-ticket sums into ticket tallies
    async fn write_tallies(
        &self,
        round: &VotingRound,
    ) -> Result<BTreeMap<TicketId, u32>, CoreError> {
        let votes = self.ctx.store.list_votes(&round.id).await?;
        let tallies = tally_by_ticket(&votes);

        for (ticket_id, total) in &tallies {
            let result = self
                .ctx
                .modify_ticket(ticket_id, |ticket| {
                    ticket.vote_count = *total;
                    Ok(())
                })
                .await;
            match result {
                Ok(_) => {}
                Err(CoreError::NotFound { .. }) => {
                    debug!(ticket_id = %ticket_id, "Voted ticket was deleted before the tally");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(tallies)
    }
}
