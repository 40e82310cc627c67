//! Session registry use case
//!
//! Creating sessions under a unique short code, joining by username,
//! presence heartbeats and lookups.

use crate::error::CoreError;
use crate::ports::event_sink::SessionEvent;
use crate::ports::record_store::{Constraint, StoreError};
use crate::ports::short_code::ShortCodeGenerator;
use crate::use_cases::shared::UseCaseContext;
use leancup_domain::{
    LeanSession, Participant, SessionId, SessionName, ShortCode, UserId, Username,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Identifiers of a freshly created session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedSession {
    pub id: SessionId,
    pub short_code: ShortCode,
}

/// A session together with its participants, most recently seen first
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session: LeanSession,
    pub participants: Vec<Participant>,
}

/// Result of a join request
#[derive(Debug, Clone, Serialize)]
pub struct JoinOutcome {
    pub user: Participant,
    pub is_new: bool,
}

/// Use case for the session registry
pub struct SessionUseCase {
    ctx: UseCaseContext,
    codes: Arc<dyn ShortCodeGenerator>,
}

impl SessionUseCase {
    pub fn new(ctx: UseCaseContext, codes: Arc<dyn ShortCodeGenerator>) -> Self {
        Self { ctx, codes }
    }

    /// Create a session, regenerating the short code on collision
    pub async fn create(&self, name: &str) -> Result<CreatedSession, CoreError> {
        let name = SessionName::try_new(name, self.ctx.config.max_session_name_len)?;
        let attempts = self.ctx.config.short_code_attempts;

        for attempt in 1..=attempts {
            let session = LeanSession::new(name.clone(), self.codes.generate(), self.ctx.clock.now());
            match self.ctx.store.insert_session(&session).await {
                Ok(()) => {
                    info!(session_id = %session.id, short_code = %session.short_code, "Session created");
                    self.ctx.publish(SessionEvent::SessionCreated {
                        session_id: session.id.clone(),
                        short_code: session.short_code.clone(),
                    });
                    return Ok(CreatedSession {
                        id: session.id,
                        short_code: session.short_code,
                    });
                }
                Err(StoreError::UniqueViolation(Constraint::SessionShortCode)) => {
                    debug!(attempt, short_code = %session.short_code, "Short code collision");
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(attempts, "Could not allocate a unique short code");
        Err(CoreError::Conflict(format!(
            "could not allocate a unique short code after {} attempts",
            attempts
        )))
    }

    /// Look a session up by its short code
    pub async fn get_by_short_code(&self, code: &str) -> Result<SessionView, CoreError> {
        let parsed = ShortCode::parse(code)
            .map_err(|_| CoreError::not_found("session", code))?;
        let session = self
            .ctx
            .store
            .find_session_by_short_code(&parsed)
            .await?
            .ok_or_else(|| CoreError::not_found("session", code))?;
        let participants = self.list_participants(&session.id).await?;
        Ok(SessionView {
            session,
            participants,
        })
    }

    /// Join a session, or refresh presence if the username is already taken
    pub async fn join(
        &self,
        session_id: &SessionId,
        username: &str,
    ) -> Result<JoinOutcome, CoreError> {
        let username = Username::try_new(username, self.ctx.config.max_username_len)?;
        self.ctx.require_session(session_id).await?;
        let now = self.ctx.clock.now();

        if let Some(existing) = self
            .ctx
            .store
            .find_participant_by_username(session_id, &username)
            .await?
        {
            return self.rejoin(existing, now).await;
        }

        let participant = Participant::new(session_id.clone(), username.clone(), now);
        match self.ctx.store.insert_participant(&participant).await {
            Ok(()) => {}
            Err(StoreError::UniqueViolation(Constraint::UsernamePerSession)) => {
                // Lost a race with a concurrent join under the same name
                let existing = self
                    .ctx
                    .store
                    .find_participant_by_username(session_id, &username)
                    .await?
                    .ok_or_else(|| CoreError::not_found("participant", &username))?;
                return self.rejoin(existing, now).await;
            }
            Err(e) => return Err(e.into()),
        }

        self.ctx.store.touch_session(session_id, now).await?;
        info!(session_id = %session_id, user_id = %participant.id, "Participant joined");
        self.ctx.publish(SessionEvent::ParticipantJoined {
            session_id: session_id.clone(),
            user_id: participant.id.clone(),
            username,
        });

        Ok(JoinOutcome {
            user: participant,
            is_new: true,
        })
    }

    async fn rejoin(
        &self,
        existing: Participant,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<JoinOutcome, CoreError> {
        let user = self.ctx.store.touch_participant(&existing.id, now).await?;
        debug!(user_id = %user.id, "Participant rejoined");
        Ok(JoinOutcome {
            user,
            is_new: false,
        })
    }

    /// Whether `username` is still free in the session
    pub async fn check_username(
        &self,
        session_id: &SessionId,
        username: &str,
    ) -> Result<bool, CoreError> {
        let username = Username::try_new(username, self.ctx.config.max_username_len)?;
        self.ctx.require_session(session_id).await?;
        Ok(self
            .ctx
            .store
            .find_participant_by_username(session_id, &username)
            .await?
            .is_none())
    }

    /// Presence heartbeat
    pub async fn heartbeat(&self, user_id: &UserId) -> Result<Participant, CoreError> {
        let now = self.ctx.clock.now();
        Ok(self.ctx.store.touch_participant(user_id, now).await?)
    }

    /// Participants of a session, most recently seen first
    pub async fn list_participants(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<Participant>, CoreError> {
        self.ctx.require_session(session_id).await?;
        let mut participants = self.ctx.store.list_participants(session_id).await?;
        participants.sort_by(|a, b| {
            b.last_seen
                .cmp(&a.last_seen)
                .then_with(|| a.username.as_str().cmp(b.username.as_str()))
        });
        Ok(participants)
    }
}
