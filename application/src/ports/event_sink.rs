//! Port for session activity events.
//!
//! Defines the [`SessionEventSink`] trait for publishing state changes
//! (tickets moving, timers changing, rounds and polls closing) to observers
//! such as a JSONL activity log or an in-process push channel.
//!
//! Events are additive. Clients still discover state by reading; a sink that
//! drops events never changes what a read returns.

use leancup_domain::{
    ClosedBy, Decision, PollId, RoundId, SessionId, ShortCode, Space, TicketId, UserId, Username,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A state change inside one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    SessionCreated {
        session_id: SessionId,
        short_code: ShortCode,
    },
    ParticipantJoined {
        session_id: SessionId,
        user_id: UserId,
        username: Username,
    },
    TicketCreated {
        session_id: SessionId,
        ticket_id: TicketId,
    },
    TicketMoved {
        session_id: SessionId,
        ticket_id: TicketId,
        from: Space,
        to: Space,
    },
    TicketDeleted {
        session_id: SessionId,
        ticket_id: TicketId,
    },
    TimerChanged {
        session_id: SessionId,
        ticket_id: TicketId,
        running: bool,
        total_ms: u64,
    },
    RoundStarted {
        session_id: SessionId,
        round_id: RoundId,
        participants: usize,
    },
    RoundClosed {
        session_id: SessionId,
        round_id: RoundId,
        force_closed_by: Option<String>,
        tallies: BTreeMap<TicketId, u32>,
    },
    PollDecided {
        session_id: SessionId,
        ticket_id: TicketId,
        poll_id: PollId,
        decision: Decision,
        closed_by: ClosedBy,
        continue_count: usize,
        archive_count: usize,
    },
}

impl SessionEvent {
    /// Event type identifier, matching the serialized `type` tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::SessionCreated { .. } => "session_created",
            SessionEvent::ParticipantJoined { .. } => "participant_joined",
            SessionEvent::TicketCreated { .. } => "ticket_created",
            SessionEvent::TicketMoved { .. } => "ticket_moved",
            SessionEvent::TicketDeleted { .. } => "ticket_deleted",
            SessionEvent::TimerChanged { .. } => "timer_changed",
            SessionEvent::RoundStarted { .. } => "round_started",
            SessionEvent::RoundClosed { .. } => "round_closed",
            SessionEvent::PollDecided { .. } => "poll_decided",
        }
    }

    pub fn session_id(&self) -> &SessionId {
        match self {
            SessionEvent::SessionCreated { session_id, .. }
            | SessionEvent::ParticipantJoined { session_id, .. }
            | SessionEvent::TicketCreated { session_id, .. }
            | SessionEvent::TicketMoved { session_id, .. }
            | SessionEvent::TicketDeleted { session_id, .. }
            | SessionEvent::TimerChanged { session_id, .. }
            | SessionEvent::RoundStarted { session_id, .. }
            | SessionEvent::RoundClosed { session_id, .. }
            | SessionEvent::PollDecided { session_id, .. } => session_id,
        }
    }
}

/// Port for publishing session events.
///
/// `publish` is synchronous and non-fallible: a sink that cannot deliver
/// logs the failure itself and never fails the request that produced the
/// event.
pub trait SessionEventSink: Send + Sync {
    fn publish(&self, event: &SessionEvent);
}

/// No-op implementation for tests and when no observer is attached.
pub struct NoEventSink;

impl SessionEventSink for NoEventSink {
    fn publish(&self, _event: &SessionEvent) {}
}

/// Sink that forwards every event to several inner sinks.
pub struct CompositeEventSink {
    delegates: Vec<Arc<dyn SessionEventSink>>,
}

impl CompositeEventSink {
    pub fn new(delegates: Vec<Arc<dyn SessionEventSink>>) -> Self {
        Self { delegates }
    }
}

impl SessionEventSink for CompositeEventSink {
    fn publish(&self, event: &SessionEvent) {
        for delegate in &self.delegates {
            delegate.publish(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<&'static str>>,
    }

    impl SessionEventSink for RecordingSink {
        fn publish(&self, event: &SessionEvent) {
            self.events.lock().unwrap().push(event.event_type());
        }
    }

    fn moved() -> SessionEvent {
        SessionEvent::TicketMoved {
            session_id: SessionId::new("s1"),
            ticket_id: TicketId::new("t1"),
            from: Space::Todo,
            to: Space::Doing,
        }
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let json = serde_json::to_value(moved()).unwrap();
        assert_eq!(json["type"], "ticket_moved");
        assert_eq!(json["from"], "TODO");
        assert_eq!(json["to"], "DOING");
        assert_eq!(json["session_id"], "s1");
    }

    #[test]
    fn test_event_type_matches_tag() {
        let event = SessionEvent::PollDecided {
            session_id: SessionId::new("s1"),
            ticket_id: TicketId::new("t1"),
            poll_id: PollId::new("p1"),
            decision: Decision::Archive,
            closed_by: ClosedBy::ForcedVoteEnd,
            continue_count: 0,
            archive_count: 0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.event_type());
        assert_eq!(event.session_id().as_str(), "s1");
    }

    #[test]
    fn test_composite_fans_out() {
        let a = Arc::new(RecordingSink::default());
        let b = Arc::new(RecordingSink::default());
        let composite = CompositeEventSink::new(vec![
            a.clone() as Arc<dyn SessionEventSink>,
            b.clone(),
            Arc::new(NoEventSink),
        ]);

        composite.publish(&moved());

        assert_eq!(*a.events.lock().unwrap(), vec!["ticket_moved"]);
        assert_eq!(*b.events.lock().unwrap(), vec!["ticket_moved"]);
    }
}
