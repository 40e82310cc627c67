//! Short code generator port

use leancup_domain::ShortCode;

/// Source of candidate session codes
///
/// Candidates need not be unique; the store's uniqueness constraint decides
/// and the session use case retries on collision.
pub trait ShortCodeGenerator: Send + Sync {
    fn generate(&self) -> ShortCode;
}
