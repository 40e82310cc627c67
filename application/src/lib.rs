//! Application layer for leancup
//!
//! This crate contains use cases, port definitions, the request-level error
//! taxonomy and coordinator configuration. It depends only on the domain
//! layer.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::CoordinatorConfig;
pub use coordinator::{Coordinator, ErrorBody, Reply, Request, Response};
pub use error::{CoreError, ErrorKind};
pub use ports::{
    clock::{Clock, ManualClock},
    event_sink::{CompositeEventSink, NoEventSink, SessionEvent, SessionEventSink},
    record_store::{Constraint, RecordStore, StoreError, VoteWrite},
    short_code::ShortCodeGenerator,
};
pub use use_cases::continuation::{CastBallotOutcome, ContinuationUseCase, PollOutcome};
pub use use_cases::session::{CreatedSession, JoinOutcome, SessionUseCase, SessionView};
pub use use_cases::shared::UseCaseContext;
pub use use_cases::tickets::TicketUseCase;
pub use use_cases::timer::TimerUseCase;
pub use use_cases::voting::{
    ActiveRoundView, CastOutcome, ForceCloseOutcome, MarkDoneOutcome, VoteSummary, VotingUseCase,
};
