//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod continuation;
pub mod session;
pub(crate) mod shared;
pub mod tickets;
pub mod timer;
pub mod voting;
