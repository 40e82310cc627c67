//! Shared utilities for use cases.
//!
//! Contains the collaborators every use case holds and the bounded
//! read-modify-CAS loop used for all ticket mutations.

use crate::config::CoordinatorConfig;
use crate::error::CoreError;
use crate::ports::clock::Clock;
use crate::ports::event_sink::{SessionEvent, SessionEventSink};
use crate::ports::record_store::{RecordStore, StoreError};
use leancup_domain::{LeanSession, Participant, SessionId, Ticket, TicketId, UserId};
use std::sync::Arc;
use tracing::debug;

/// Collaborators shared by every use case
#[derive(Clone)]
pub struct UseCaseContext {
    pub store: Arc<dyn RecordStore>,
    pub clock: Arc<dyn Clock>,
    pub events: Arc<dyn SessionEventSink>,
    pub config: CoordinatorConfig,
}

impl UseCaseContext {
    pub fn new(
        store: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn SessionEventSink>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            store,
            clock,
            events,
            config,
        }
    }

    pub(crate) fn publish(&self, event: SessionEvent) {
        self.events.publish(&event);
    }

    pub(crate) async fn require_session(&self, id: &SessionId) -> Result<LeanSession, CoreError> {
        self.store
            .get_session(id)
            .await?
            .ok_or_else(|| CoreError::not_found("session", id))
    }

    pub(crate) async fn require_ticket(&self, id: &TicketId) -> Result<Ticket, CoreError> {
        self.store
            .get_ticket(id)
            .await?
            .ok_or_else(|| CoreError::not_found("ticket", id))
    }

    /// The participant `user_id`, who must have joined `session_id`
    pub(crate) async fn require_member(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> Result<Participant, CoreError> {
        let user = self
            .store
            .get_participant(user_id)
            .await?
            .ok_or_else(|| CoreError::not_found("user", user_id))?;
        if &user.session_id != session_id {
            return Err(CoreError::Forbidden(
                "user belongs to another session".to_string(),
            ));
        }
        Ok(user)
    }

    /// Read a ticket, apply `change`, and write it back conditionally
    ///
    /// On a version conflict the ticket is re-read and `change` re-validated
    /// against the fresh state, at most `cas_retry_limit` times. If `change`
    /// leaves the ticket untouched nothing is written, which keeps repeated
    /// requests idempotent.
    pub(crate) async fn modify_ticket<F>(
        &self,
        id: &TicketId,
        mut change: F,
    ) -> Result<Ticket, CoreError>
    where
        F: FnMut(&mut Ticket) -> Result<(), CoreError> + Send,
    {
        let limit = self.config.cas_retry_limit;
        for attempt in 1..=limit {
            let current = self.require_ticket(id).await?;
            let mut updated = current.clone();
            change(&mut updated)?;
            if updated == current {
                return Ok(current);
            }

            match self.store.update_ticket(&updated).await {
                Ok(stored) => return Ok(stored),
                Err(StoreError::VersionConflict { .. }) => {
                    debug!(ticket_id = %id, attempt, "Ticket changed underneath, retrying");
                    tokio::task::yield_now().await;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CoreError::Conflict(format!(
            "ticket {} kept changing, gave up after {} attempts",
            id, limit
        )))
    }
}
