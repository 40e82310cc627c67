//! Ticket lifecycle use case
//!
//! Creation, space transitions, edits and deletion of tickets, plus the
//! per-user visible listing. Every mutation goes through
//! [`UseCaseContext::modify_ticket`], so a lost race is re-validated against
//! fresh state instead of overwriting it.

use crate::error::CoreError;
use crate::ports::event_sink::SessionEvent;
use crate::use_cases::shared::UseCaseContext;
use leancup_domain::{
    Description, SessionId, Space, Ticket, TicketId, UserId, sort_for_display,
};
use tracing::{debug, info};

/// Use case for the ticket lifecycle
pub struct TicketUseCase {
    ctx: UseCaseContext,
}

impl TicketUseCase {
    pub fn new(ctx: UseCaseContext) -> Self {
        Self { ctx }
    }

    /// Create a ticket in the user's `PERSONAL` space
    pub async fn create(
        &self,
        session_id: &SessionId,
        user_id: &UserId,
        description: &str,
    ) -> Result<Ticket, CoreError> {
        let description = Description::try_new(description, self.ctx.config.max_description_len)?;
        self.ctx.require_session(session_id).await?;

        self.ctx.require_member(user_id, session_id).await?;

        let ticket = Ticket::new(
            session_id.clone(),
            user_id.clone(),
            description,
            self.ctx.clock.now(),
        );
        let stored = self.ctx.store.insert_ticket(&ticket).await?;

        debug!(ticket_id = %stored.id, session_id = %session_id, "Ticket created");
        self.ctx.publish(SessionEvent::TicketCreated {
            session_id: session_id.clone(),
            ticket_id: stored.id.clone(),
        });
        Ok(stored)
    }

    /// Tickets `user_id` may see, highest tally first
    pub async fn list_visible(
        &self,
        session_id: &SessionId,
        user_id: &UserId,
    ) -> Result<Vec<Ticket>, CoreError> {
        self.ctx.require_session(session_id).await?;
        let mut tickets: Vec<Ticket> = self
            .ctx
            .store
            .list_tickets(session_id)
            .await?
            .into_iter()
            .filter(|t| t.is_visible_to(user_id))
            .collect();
        sort_for_display(&mut tickets);
        Ok(tickets)
    }

    /// Move a ticket to `target`
    ///
    /// `username` labels the archive stamp when the move enters `ARCHIVE`.
    pub async fn move_to_space(
        &self,
        ticket_id: &TicketId,
        target: Space,
        user_id: &UserId,
        username: Option<&str>,
    ) -> Result<Ticket, CoreError> {
        let now = self.ctx.clock.now();
        let mut from = Space::default();

        let ticket = self
            .ctx
            .modify_ticket(ticket_id, |ticket| {
                if !ticket.is_movable_by(user_id) {
                    return Err(CoreError::Forbidden(
                        "only the creator can move a personal ticket".to_string(),
                    ));
                }
                from = ticket.space;
                ticket.move_to(target, username, now)?;
                Ok(())
            })
            .await?;

        if from != ticket.space {
            info!(ticket_id = %ticket_id, %from, to = %ticket.space, "Ticket moved");
            self.ctx.publish(SessionEvent::TicketMoved {
                session_id: ticket.session_id.clone(),
                ticket_id: ticket.id.clone(),
                from,
                to: ticket.space,
            });
        }
        Ok(ticket)
    }

    /// Replace a ticket's description (creator only, any space)
    pub async fn edit(
        &self,
        ticket_id: &TicketId,
        user_id: &UserId,
        description: &str,
    ) -> Result<Ticket, CoreError> {
        let description = Description::try_new(description, self.ctx.config.max_description_len)?;
        self.ctx
            .modify_ticket(ticket_id, |ticket| {
                if !ticket.is_owned_by(user_id) {
                    return Err(CoreError::Forbidden(
                        "only the creator can edit a ticket".to_string(),
                    ));
                }
                ticket.description = description.clone();
                Ok(())
            })
            .await
    }

    /// Delete a ticket (creator only, any space)
    pub async fn delete(&self, ticket_id: &TicketId, user_id: &UserId) -> Result<(), CoreError> {
        let ticket = self.ctx.require_ticket(ticket_id).await?;
        if !ticket.is_owned_by(user_id) {
            return Err(CoreError::Forbidden(
                "only the creator can delete a ticket".to_string(),
            ));
        }

        self.ctx.store.delete_ticket(ticket_id).await?;

        info!(ticket_id = %ticket_id, space = %ticket.space, "Ticket deleted");
        self.ctx.publish(SessionEvent::TicketDeleted {
            session_id: ticket.session_id,
            ticket_id: ticket.id,
        });
        Ok(())
    }
}
