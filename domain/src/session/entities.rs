//! Session domain entities

use super::short_code::ShortCode;
use crate::core::ids::{SessionId, UserId};
use crate::core::text::{SessionName, Username};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A Lean Coffee session (Entity)
///
/// `last_interaction_at` is bumped when someone new joins; an external reaper
/// uses it to expire idle sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeanSession {
    pub id: SessionId,
    pub name: SessionName,
    pub short_code: ShortCode,
    pub created_at: DateTime<Utc>,
    pub last_interaction_at: DateTime<Utc>,
}

impl LeanSession {
    pub fn new(name: SessionName, short_code: ShortCode, now: DateTime<Utc>) -> Self {
        Self {
            id: SessionId::generate(),
            name,
            short_code,
            created_at: now,
            last_interaction_at: now,
        }
    }
}

/// A session-scoped participant (Entity)
///
/// Usernames are self-asserted and unique only within their session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: UserId,
    pub session_id: SessionId,
    pub username: Username,
    pub joined_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl Participant {
    pub fn new(session_id: SessionId, username: Username, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::generate(),
            session_id,
            username,
            joined_at: now,
            last_seen: now,
        }
    }

    /// Record a heartbeat. Never moves `last_seen` backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_seen {
            self.last_seen = now;
        }
    }
}
