//! Short session code value object

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Human-shareable session code in the form `abc-def-ghi`
///
/// Three groups of three lowercase ASCII letters joined by dashes. Codes are
/// assigned once at session creation and never change.
///
/// # Example
///
/// ```
/// use leancup_domain::ShortCode;
///
/// let code = ShortCode::parse("evx-asd-hzo").unwrap();
/// assert_eq!(code.as_str(), "evx-asd-hzo");
/// assert!(ShortCode::parse("EVX-ASD-HZO").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortCode(String);

impl ShortCode {
    /// Letters a code is drawn from
    pub const ALPHABET: &'static [u8; 26] = b"abcdefghijklmnopqrstuvwxyz";

    /// Number of dash-separated groups
    pub const GROUPS: usize = 3;

    /// Letters per group
    pub const GROUP_LEN: usize = 3;

    /// Parse and validate a code
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let groups: Vec<&str> = s.split('-').collect();
        let well_formed = groups.len() == Self::GROUPS
            && groups.iter().all(|g| {
                g.len() == Self::GROUP_LEN && g.bytes().all(|b| b.is_ascii_lowercase())
            });

        if well_formed {
            Ok(Self(s.to_string()))
        } else {
            Err(DomainError::InvalidShortCode(s.to_string()))
        }
    }

    /// Build a code from nine alphabet indices (each taken modulo 26)
    pub fn from_indices(indices: [usize; 9]) -> Self {
        let mut code = String::with_capacity(11);
        for (i, idx) in indices.iter().enumerate() {
            if i > 0 && i % Self::GROUP_LEN == 0 {
                code.push('-');
            }
            code.push(Self::ALPHABET[idx % Self::ALPHABET.len()] as char);
        }
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ShortCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
