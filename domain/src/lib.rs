//! Domain layer for leancup
//!
//! This crate contains the entities, value objects and pure decision rules of
//! a Lean Coffee session. It has no dependencies on storage, clocks or
//! transport concerns; every timestamp is passed in by the caller.
//!
//! # Core Concepts
//!
//! ## Tickets and spaces
//!
//! A ticket is a discussion topic. It lives in exactly one [`Space`]:
//! `PERSONAL` (private draft) → `TODO` (shared queue) → `DOING` (under
//! discussion, at most one per session) → `ARCHIVE` (terminal).
//!
//! ## Two voting protocols
//!
//! - **Quadratic voting**: prioritizes the `TODO` queue. Allocating `n` votes
//!   to one ticket costs `n²` points out of a per-user budget of
//!   `(todoCount − 1)²`.
//! - **Continuation voting**: when the time box of the `DOING` ticket runs
//!   out, participants vote to continue or archive. Ties archive.

pub mod continuation;
pub mod core;
pub mod session;
pub mod ticket;
pub mod voting;

// Re-export commonly used types
pub use continuation::{
    ballot::{Choice, ContinuationBallot},
    decision::{ClosedBy, ContinuationTally, Decision},
    poll::ContinuationPoll,
};
pub use core::{
    error::DomainError,
    ids::{PollId, RoundId, SessionId, TicketId, UserId},
    text::{Description, SessionName, Username},
};
pub use session::{
    entities::{LeanSession, Participant},
    short_code::ShortCode,
};
pub use ticket::{
    entities::{ARCHIVED_BY_UNKNOWN, Ticket, sort_for_display},
    space::Space,
    timer::{DiscussionTimer, TimerSnapshot},
};
pub use voting::{
    budget::{MAX_VOTE_COUNT, VoteCount, point_budget, quadratic_cost},
    round::{Vote, VoterStatus, VotingRound, spent_excluding},
    tally::tally_by_ticket,
};
