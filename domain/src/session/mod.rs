//! Session domain
//!
//! A Lean Coffee session groups participants and tickets and is addressed by a
//! short, human-shareable code (`abc-def-ghi`).

pub mod entities;
pub mod short_code;
