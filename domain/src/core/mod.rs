//! Core domain concepts shared across all subdomains.
//!
//! - [`ids`]: strongly-typed identifiers (session, user, ticket, round, poll)
//! - [`text`]: validated text value objects (description, username, session name)
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod ids;
pub mod text;
