//! Continuation voting
//!
//! When the time box of the ticket in `DOING` runs out, each participant
//! votes to keep discussing or to move on. Ballots collect in a
//! [`poll::ContinuationPoll`]; once every frozen participant has voted (or
//! someone forces the vote to end) the poll closes and its
//! [`decision::Decision`] is applied to the ticket exactly once.
//!
//! A strict majority is needed to continue. Ties archive.

pub mod ballot;
pub mod decision;
pub mod poll;
