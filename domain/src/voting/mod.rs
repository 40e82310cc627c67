//! Quadratic prioritization voting
//!
//! Participants spread a point budget over the `TODO` queue. Placing `n`
//! votes on a single ticket costs `n²` points, so strong preferences are
//! expensive and broad support is cheap. When every participant of a round
//! has marked themselves done (or someone forces the round closed), the votes
//! are summed per ticket and written into each ticket's tally.

pub mod budget;
pub mod round;
pub mod tally;
