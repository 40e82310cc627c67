//! Discussion timer use case

use crate::error::CoreError;
use crate::ports::event_sink::SessionEvent;
use crate::use_cases::shared::UseCaseContext;
use leancup_domain::{Ticket, TicketId, TimerSnapshot};
use tracing::debug;

/// Use case for the timer of the ticket under discussion
pub struct TimerUseCase {
    ctx: UseCaseContext,
}

impl TimerUseCase {
    pub fn new(ctx: UseCaseContext) -> Self {
        Self { ctx }
    }

    /// Start (or restart) the timer. The ticket must be in DOING.
    pub async fn start(&self, ticket_id: &TicketId) -> Result<TimerSnapshot, CoreError> {
        let now = self.ctx.clock.now();
        let ticket = self
            .ctx
            .modify_ticket(ticket_id, |ticket| Ok(ticket.start_timer(now)?))
            .await?;
        Ok(self.changed(&ticket))
    }

    /// Pause a running timer
    pub async fn pause(&self, ticket_id: &TicketId) -> Result<TimerSnapshot, CoreError> {
        let now = self.ctx.clock.now();
        let ticket = self
            .ctx
            .modify_ticket(ticket_id, |ticket| Ok(ticket.timer.pause(now)?))
            .await?;
        Ok(self.changed(&ticket))
    }

    /// Clear the timer and its accumulated time
    pub async fn reset(&self, ticket_id: &TicketId) -> Result<TimerSnapshot, CoreError> {
        let ticket = self
            .ctx
            .modify_ticket(ticket_id, |ticket| {
                ticket.timer.reset();
                Ok(())
            })
            .await?;
        Ok(self.changed(&ticket))
    }

    /// Current timer state against the configured time box
    pub async fn read(&self, ticket_id: &TicketId) -> Result<TimerSnapshot, CoreError> {
        let ticket = self.ctx.require_ticket(ticket_id).await?;
        Ok(self.snapshot(&ticket))
    }

    fn snapshot(&self, ticket: &Ticket) -> TimerSnapshot {
        ticket
            .timer
            .snapshot(self.ctx.clock.now(), self.ctx.config.discussion_box_ms())
    }

    fn changed(&self, ticket: &Ticket) -> TimerSnapshot {
        let snapshot = self.snapshot(ticket);
        debug!(
            ticket_id = %ticket.id,
            running = snapshot.running,
            total_ms = snapshot.total_ms,
            "Timer changed"
        );
        self.ctx.publish(SessionEvent::TimerChanged {
            session_id: ticket.session_id.clone(),
            ticket_id: ticket.id.clone(),
            running: snapshot.running,
            total_ms: snapshot.total_ms,
        });
        snapshot
    }
}
