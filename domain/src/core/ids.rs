//! Strongly-typed identifiers.
//!
//! Every record kind gets its own newtype so a `TicketId` can never be passed
//! where a `UserId` is expected. Fresh ids are random UUID v4 strings; ids
//! coming back from a client are accepted verbatim and resolved by the store.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a fresh random identifier
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Identifier of a Lean Coffee session
    SessionId
);
string_id!(
    /// Identifier of a session-scoped participant
    UserId
);
string_id!(
    /// Identifier of a ticket (discussion topic)
    TicketId
);
string_id!(
    /// Identifier of a quadratic voting round
    RoundId
);
string_id!(
    /// Identifier of a continuation poll
    PollId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = TicketId::generate();
        let b = TicketId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = UserId::new("user-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"user-1\"");

        let parsed: UserId = serde_json::from_str("\"user-1\"").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_display_and_from() {
        let id: SessionId = "abc".into();
        assert_eq!(id.to_string(), "abc");
        assert_eq!(id.as_str(), "abc");
    }
}
