//! Coordinator facade
//!
//! One entry point for every operation of the session coordination engine,
//! expressed as typed [`Request`] / [`Response`] values. Requests are tagged
//! by `op` (e.g. `"ticket.move"`) so a transport can decode them from JSON
//! directly:
//!
//! ```text
//! {"op": "ticket.move", "ticket_id": "…", "target": "DOING", "user_id": "…"}
//!   → {"ok": { …ticket… }}
//!   → {"error": {"kind": "conflict", "message": "…"}}
//! ```

use crate::error::{CoreError, ErrorKind};
use crate::ports::short_code::ShortCodeGenerator;
use crate::use_cases::continuation::{CastBallotOutcome, ContinuationUseCase, PollOutcome};
use crate::use_cases::session::{CreatedSession, JoinOutcome, SessionUseCase, SessionView};
use crate::use_cases::shared::UseCaseContext;
use crate::use_cases::tickets::TicketUseCase;
use crate::use_cases::timer::TimerUseCase;
use crate::use_cases::voting::{
    ActiveRoundView, CastOutcome, ForceCloseOutcome, MarkDoneOutcome, VoteSummary, VotingUseCase,
};
use leancup_domain::{
    Choice, ContinuationBallot, Participant, RoundId, SessionId, Space, Ticket, TicketId,
    TimerSnapshot, UserId, VotingRound,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// An operation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum Request {
    #[serde(rename = "session.create")]
    CreateSession { name: String },
    #[serde(rename = "session.getByShortCode")]
    GetSessionByShortCode { short_code: String },
    #[serde(rename = "session.join")]
    JoinSession {
        session_id: SessionId,
        username: String,
    },
    #[serde(rename = "session.checkUsername")]
    CheckUsername {
        session_id: SessionId,
        username: String,
    },
    #[serde(rename = "session.heartbeat")]
    Heartbeat { user_id: UserId },
    #[serde(rename = "session.participants")]
    ListParticipants { session_id: SessionId },

    #[serde(rename = "ticket.create")]
    CreateTicket {
        session_id: SessionId,
        user_id: UserId,
        description: String,
    },
    #[serde(rename = "ticket.listVisible")]
    ListVisibleTickets {
        session_id: SessionId,
        user_id: UserId,
    },
    #[serde(rename = "ticket.move")]
    MoveTicket {
        ticket_id: TicketId,
        target: Space,
        user_id: UserId,
        #[serde(default)]
        username: Option<String>,
    },
    #[serde(rename = "ticket.delete")]
    DeleteTicket { ticket_id: TicketId, user_id: UserId },
    #[serde(rename = "ticket.edit")]
    EditTicket {
        ticket_id: TicketId,
        user_id: UserId,
        description: String,
    },

    #[serde(rename = "timer.start")]
    StartTimer { ticket_id: TicketId },
    #[serde(rename = "timer.pause")]
    PauseTimer { ticket_id: TicketId },
    #[serde(rename = "timer.reset")]
    ResetTimer { ticket_id: TicketId },
    #[serde(rename = "timer.read")]
    ReadTimer { ticket_id: TicketId },

    #[serde(rename = "vote.startRound")]
    StartRound { session_id: SessionId },
    #[serde(rename = "vote.activeRound")]
    ActiveRound { session_id: SessionId },
    #[serde(rename = "vote.cast")]
    CastVote {
        round_id: RoundId,
        ticket_id: TicketId,
        user_id: UserId,
        count: u32,
    },
    #[serde(rename = "vote.list")]
    ListVotes { round_id: RoundId, user_id: UserId },
    #[serde(rename = "vote.markDone")]
    MarkDone { round_id: RoundId, user_id: UserId },
    #[serde(rename = "vote.forceClose")]
    ForceClose {
        round_id: RoundId,
        user_id: UserId,
        username: String,
    },

    #[serde(rename = "continuation.cast")]
    CastBallot {
        ticket_id: TicketId,
        user_id: UserId,
        choice: Choice,
    },
    #[serde(rename = "continuation.list")]
    ListBallots { ticket_id: TicketId },
    #[serde(rename = "continuation.clear")]
    ClearBallots { ticket_id: TicketId },
    #[serde(rename = "continuation.forceEnd")]
    ForceEnd { ticket_id: TicketId },
}

impl Request {
    /// The `op` tag of this request
    pub fn op(&self) -> &'static str {
        match self {
            Request::CreateSession { .. } => "session.create",
            Request::GetSessionByShortCode { .. } => "session.getByShortCode",
            Request::JoinSession { .. } => "session.join",
            Request::CheckUsername { .. } => "session.checkUsername",
            Request::Heartbeat { .. } => "session.heartbeat",
            Request::ListParticipants { .. } => "session.participants",
            Request::CreateTicket { .. } => "ticket.create",
            Request::ListVisibleTickets { .. } => "ticket.listVisible",
            Request::MoveTicket { .. } => "ticket.move",
            Request::DeleteTicket { .. } => "ticket.delete",
            Request::EditTicket { .. } => "ticket.edit",
            Request::StartTimer { .. } => "timer.start",
            Request::PauseTimer { .. } => "timer.pause",
            Request::ResetTimer { .. } => "timer.reset",
            Request::ReadTimer { .. } => "timer.read",
            Request::StartRound { .. } => "vote.startRound",
            Request::ActiveRound { .. } => "vote.activeRound",
            Request::CastVote { .. } => "vote.cast",
            Request::ListVotes { .. } => "vote.list",
            Request::MarkDone { .. } => "vote.markDone",
            Request::ForceClose { .. } => "vote.forceClose",
            Request::CastBallot { .. } => "continuation.cast",
            Request::ListBallots { .. } => "continuation.list",
            Request::ClearBallots { .. } => "continuation.clear",
            Request::ForceEnd { .. } => "continuation.forceEnd",
        }
    }
}

/// The result of a successful request
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Response {
    SessionCreated(CreatedSession),
    Session(SessionView),
    Joined(JoinOutcome),
    UsernameAvailability { available: bool },
    Participant(Participant),
    Participants(Vec<Participant>),
    Ticket(Ticket),
    Tickets(Vec<Ticket>),
    Deleted { deleted: bool },
    Timer(TimerSnapshot),
    Round(VotingRound),
    ActiveRound(Option<ActiveRoundView>),
    Vote(CastOutcome),
    Votes(VoteSummary),
    MarkDone(MarkDoneOutcome),
    RoundClosed(ForceCloseOutcome),
    Ballot(CastBallotOutcome),
    Ballots(Vec<ContinuationBallot>),
    Cleared { cleared: usize },
    Decision(PollOutcome),
}

/// Wire form of a [`CoreError`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&CoreError> for ErrorBody {
    fn from(error: &CoreError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Envelope written back for every request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reply {
    Ok(Response),
    Error(ErrorBody),
}

impl From<Result<Response, CoreError>> for Reply {
    fn from(result: Result<Response, CoreError>) -> Self {
        match result {
            Ok(response) => Reply::Ok(response),
            Err(error) => Reply::Error(ErrorBody::from(&error)),
        }
    }
}

/// Session coordination engine
pub struct Coordinator {
    pub sessions: SessionUseCase,
    pub tickets: TicketUseCase,
    pub timer: TimerUseCase,
    pub voting: VotingUseCase,
    pub continuation: ContinuationUseCase,
}

impl Coordinator {
    pub fn new(ctx: UseCaseContext, codes: Arc<dyn ShortCodeGenerator>) -> Self {
        Self {
            sessions: SessionUseCase::new(ctx.clone(), codes),
            tickets: TicketUseCase::new(ctx.clone()),
            timer: TimerUseCase::new(ctx.clone()),
            voting: VotingUseCase::new(ctx.clone()),
            continuation: ContinuationUseCase::new(ctx),
        }
    }

    /// Dispatch one request
    pub async fn handle(&self, request: Request) -> Result<Response, CoreError> {
        debug!(op = request.op(), "Handling request");
        let response = match request {
            Request::CreateSession { name } => {
                Response::SessionCreated(self.sessions.create(&name).await?)
            }
            Request::GetSessionByShortCode { short_code } => {
                Response::Session(self.sessions.get_by_short_code(&short_code).await?)
            }
            Request::JoinSession {
                session_id,
                username,
            } => Response::Joined(self.sessions.join(&session_id, &username).await?),
            Request::CheckUsername {
                session_id,
                username,
            } => Response::UsernameAvailability {
                available: self.sessions.check_username(&session_id, &username).await?,
            },
            Request::Heartbeat { user_id } => {
                Response::Participant(self.sessions.heartbeat(&user_id).await?)
            }
            Request::ListParticipants { session_id } => {
                Response::Participants(self.sessions.list_participants(&session_id).await?)
            }

            Request::CreateTicket {
                session_id,
                user_id,
                description,
            } => Response::Ticket(
                self.tickets
                    .create(&session_id, &user_id, &description)
                    .await?,
            ),
            Request::ListVisibleTickets {
                session_id,
                user_id,
            } => Response::Tickets(self.tickets.list_visible(&session_id, &user_id).await?),
            Request::MoveTicket {
                ticket_id,
                target,
                user_id,
                username,
            } => Response::Ticket(
                self.tickets
                    .move_to_space(&ticket_id, target, &user_id, username.as_deref())
                    .await?,
            ),
            Request::DeleteTicket { ticket_id, user_id } => {
                self.tickets.delete(&ticket_id, &user_id).await?;
                Response::Deleted { deleted: true }
            }
            Request::EditTicket {
                ticket_id,
                user_id,
                description,
            } => Response::Ticket(
                self.tickets
                    .edit(&ticket_id, &user_id, &description)
                    .await?,
            ),

            Request::StartTimer { ticket_id } => {
                Response::Timer(self.timer.start(&ticket_id).await?)
            }
            Request::PauseTimer { ticket_id } => {
                Response::Timer(self.timer.pause(&ticket_id).await?)
            }
            Request::ResetTimer { ticket_id } => {
                Response::Timer(self.timer.reset(&ticket_id).await?)
            }
            Request::ReadTimer { ticket_id } => Response::Timer(self.timer.read(&ticket_id).await?),

            Request::StartRound { session_id } => {
                Response::Round(self.voting.start_round(&session_id).await?)
            }
            Request::ActiveRound { session_id } => {
                Response::ActiveRound(self.voting.active_round(&session_id).await?)
            }
            Request::CastVote {
                round_id,
                ticket_id,
                user_id,
                count,
            } => Response::Vote(
                self.voting
                    .cast_vote(&round_id, &ticket_id, &user_id, count)
                    .await?,
            ),
            Request::ListVotes { round_id, user_id } => {
                Response::Votes(self.voting.list_votes(&round_id, &user_id).await?)
            }
            Request::MarkDone { round_id, user_id } => {
                Response::MarkDone(self.voting.mark_done(&round_id, &user_id).await?)
            }
            Request::ForceClose {
                round_id,
                user_id,
                username,
            } => Response::RoundClosed(
                self.voting
                    .force_close(&round_id, &user_id, &username)
                    .await?,
            ),

            Request::CastBallot {
                ticket_id,
                user_id,
                choice,
            } => Response::Ballot(
                self.continuation
                    .cast(&ticket_id, &user_id, choice)
                    .await?,
            ),
            Request::ListBallots { ticket_id } => {
                Response::Ballots(self.continuation.list_ballots(&ticket_id).await?)
            }
            Request::ClearBallots { ticket_id } => Response::Cleared {
                cleared: self.continuation.clear_ballots(&ticket_id).await?,
            },
            Request::ForceEnd { ticket_id } => {
                Response::Decision(self.continuation.force_end(&ticket_id).await?)
            }
        };
        Ok(response)
    }

    /// Decode one JSON request, dispatch it and encode the reply
    ///
    /// A line that does not decode into a [`Request`] is answered with a
    /// `validation` error rather than failing the caller.
    pub async fn handle_json(&self, line: &str) -> serde_json::Value {
        let reply: Reply = match serde_json::from_str::<Request>(line) {
            Ok(request) => self.handle(request).await.into(),
            Err(e) => Reply::Error(ErrorBody {
                kind: ErrorKind::Validation,
                message: format!("Malformed request: {}", e),
            }),
        };
        serde_json::to_value(&reply).unwrap_or_else(|e| {
            serde_json::json!({
                "error": { "kind": ErrorKind::Storage, "message": e.to_string() }
            })
        })
    }
}
