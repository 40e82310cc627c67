//! Ticket domain
//!
//! # Spaces
//!
//! ```text
//! PERSONAL ──> TODO ──> DOING ──> ARCHIVE
//!     ^          │  ^      │
//!     └──────────┘  └──────┘      (free-form, kanban style)
//! ```
//!
//! Only two rules constrain the board: a `PERSONAL` ticket may only be moved
//! by its creator, and `DOING` holds at most one ticket per session.
//! `ARCHIVE` is terminal.

pub mod entities;
pub mod space;
pub mod timer;
