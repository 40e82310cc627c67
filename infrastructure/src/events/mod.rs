//! Session event adapters.
//!
//! - [`JsonlEventLog`]: append-only activity log, one JSON object per line
//! - [`BroadcastNotifier`]: in-process push channel for live observers

mod broadcast;
mod jsonl_log;

pub use broadcast::BroadcastNotifier;
pub use jsonl_log::JsonlEventLog;
