//! In-process push channel for session events.

use leancup_application::ports::event_sink::{SessionEvent, SessionEventSink};
use tokio::sync::broadcast;
use tracing::trace;

/// Fans events out to any number of live subscribers
///
/// Publishing never blocks. A subscriber that falls more than `capacity`
/// events behind sees `RecvError::Lagged` and skips ahead; it can always
/// recover by reading state through the coordinator.
pub struct BroadcastNotifier {
    sender: broadcast::Sender<SessionEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(256)
    }
}

impl SessionEventSink for BroadcastNotifier {
    fn publish(&self, event: &SessionEvent) {
        // Err only means nobody is listening
        if self.sender.send(event.clone()).is_err() {
            trace!(event_type = event.event_type(), "No subscribers for event");
        }
    }
}
