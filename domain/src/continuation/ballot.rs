//! Continuation ballots

use crate::core::ids::{PollId, TicketId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a participant wants to happen to the ticket under discussion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    Continue,
    Archive,
}

impl Choice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Choice::Continue => "continue",
            Choice::Archive => "archive",
        }
    }
}

impl std::fmt::Display for Choice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Choice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "continue" => Ok(Choice::Continue),
            "archive" => Ok(Choice::Archive),
            _ => Err(format!("Unknown choice: {}. Valid: continue, archive", s)),
        }
    }
}

/// One participant's vote in an open poll
///
/// Upserted by `(poll_id, user_id)`: voting again replaces the choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationBallot {
    pub poll_id: PollId,
    pub ticket_id: TicketId,
    pub user_id: UserId,
    pub choice: Choice,
    pub cast_at: DateTime<Utc>,
}

impl ContinuationBallot {
    pub fn new(
        poll_id: PollId,
        ticket_id: TicketId,
        user_id: UserId,
        choice: Choice,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            poll_id,
            ticket_id,
            user_id,
            choice,
            cast_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&Choice::Continue).unwrap(),
            "\"continue\""
        );
        let parsed: Choice = serde_json::from_str("\"archive\"").unwrap();
        assert_eq!(parsed, Choice::Archive);
    }

    #[test]
    fn test_choice_from_str() {
        assert_eq!("Continue".parse::<Choice>().ok(), Some(Choice::Continue));
        assert!("maybe".parse::<Choice>().is_err());
    }
}
