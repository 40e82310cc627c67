//! Dependency injection: adapters into the coordinator

use leancup_application::{CompositeEventSink, Coordinator, SessionEventSink, UseCaseContext};
use leancup_infrastructure::{
    BroadcastNotifier, FileConfig, InMemoryRecordStore, JsonlEventLog, RandomShortCodeGenerator,
    SystemClock,
};
use std::sync::Arc;
use tracing::info;

pub struct Services {
    pub coordinator: Arc<Coordinator>,
    pub notifier: Arc<BroadcastNotifier>,
}

pub fn build(config: &FileConfig) -> Services {
    let notifier = Arc::new(BroadcastNotifier::default());
    let mut sinks: Vec<Arc<dyn SessionEventSink>> =
        vec![notifier.clone() as Arc<dyn SessionEventSink>];

    if let Some(path) = &config.logging.event_log
        && let Some(log) = JsonlEventLog::new(path)
    {
        info!("Appending session events to {}", log.path().display());
        sinks.push(Arc::new(log));
    }

    let ctx = UseCaseContext::new(
        Arc::new(InMemoryRecordStore::new()),
        Arc::new(SystemClock),
        Arc::new(CompositeEventSink::new(sinks)),
        config.to_coordinator_config(),
    );
    let coordinator = Coordinator::new(ctx, Arc::new(RandomShortCodeGenerator::new()));

    Services {
        coordinator: Arc::new(coordinator),
        notifier,
    }
}
