//! Ticket spaces

use serde::{Deserialize, Serialize};

/// The queue a ticket currently occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Space {
    /// Private draft, visible only to its creator
    #[default]
    Personal,
    /// Shared queue of topics waiting for discussion
    Todo,
    /// The topic currently under discussion (at most one per session)
    Doing,
    /// Discussed topics (terminal)
    Archive,
}

impl Space {
    /// Whether every session member can see tickets in this space
    pub fn is_shared(&self) -> bool {
        !matches!(self, Space::Personal)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Space::Personal => "PERSONAL",
            Space::Todo => "TODO",
            Space::Doing => "DOING",
            Space::Archive => "ARCHIVE",
        }
    }
}

impl std::fmt::Display for Space {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Space {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PERSONAL" => Ok(Space::Personal),
            "TODO" => Ok(Space::Todo),
            "DOING" => Ok(Space::Doing),
            "ARCHIVE" => Ok(Space::Archive),
            _ => Err(format!(
                "Unknown space: {}. Valid: PERSONAL, TODO, DOING, ARCHIVE",
                s
            )),
        }
    }
}
