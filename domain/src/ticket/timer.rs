//! Discussion timer
//!
//! Elapsed time is never ticked forward. It is derived on read from two
//! optional timestamps plus an accumulator:
//!
//! ```text
//! running  = started_at.is_some() && paused_at.is_none()
//! elapsed  = total_ms + (running ? now - started_at : 0)
//! ```
//!
//! All transitions take `now` from the caller, so the timer is deterministic
//! under an injected clock.

use crate::core::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored timer fields of a ticket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionTimer {
    pub started_at: Option<DateTime<Utc>>,
    pub paused_at: Option<DateTime<Utc>>,
    pub total_ms: u64,
}

/// Read-only view of a timer at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub running: bool,
    pub elapsed_ms: u64,
    pub total_ms: u64,
    pub remaining_ms: u64,
    pub expired: bool,
}

fn millis_between(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    // Clock skew between writers must never make the accumulator shrink
    u64::try_from((to - from).num_milliseconds()).unwrap_or(0)
}

impl DiscussionTimer {
    pub fn is_running(&self) -> bool {
        self.started_at.is_some() && self.paused_at.is_none()
    }

    /// Total discussion time at `now`, including the running interval
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> u64 {
        match self.started_at {
            Some(started_at) if self.paused_at.is_none() => {
                self.total_ms + millis_between(started_at, now)
            }
            _ => self.total_ms,
        }
    }

    /// (Re)start the running interval. Keeps the accumulator.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.started_at = Some(now);
        self.paused_at = None;
    }

    /// Fold the running interval into the accumulator and mark paused
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        let started_at = match self.started_at {
            Some(started_at) if self.paused_at.is_none() => started_at,
            _ => return Err(DomainError::TimerNotRunning),
        };
        self.total_ms += millis_between(started_at, now);
        self.paused_at = Some(now);
        Ok(())
    }

    /// Clear both timestamps and zero the accumulator
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Stop the timer for good when a ticket leaves DOING
    ///
    /// A running interval is folded into the accumulator; both timestamps
    /// are cleared either way.
    pub fn freeze(&mut self, now: DateTime<Utc>) {
        if let Some(started_at) = self.started_at
            && self.paused_at.is_none()
        {
            self.total_ms += millis_between(started_at, now);
        }
        self.started_at = None;
        self.paused_at = None;
    }

    /// Snapshot relative to a time box of `box_ms`
    pub fn snapshot(&self, now: DateTime<Utc>, box_ms: u64) -> TimerSnapshot {
        let elapsed_ms = self.elapsed_ms(now);
        TimerSnapshot {
            running: self.is_running(),
            elapsed_ms,
            total_ms: self.total_ms,
            remaining_ms: box_ms.saturating_sub(elapsed_ms),
            expired: elapsed_ms >= box_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    const NINE_MINUTES_MS: u64 = 9 * 60 * 1000;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()
    }

    fn at(ms: i64) -> DateTime<Utc> {
        t0() + Duration::milliseconds(ms)
    }

    #[test]
    fn test_start_pause_round_trip_accumulates() {
        let mut timer = DiscussionTimer::default();
        timer.start(at(0));
        timer.pause(at(5_000)).unwrap();
        timer.start(at(8_000));
        timer.pause(at(9_000)).unwrap();

        assert_eq!(timer.total_ms, 6_000);
        assert!(!timer.is_running());
        assert_eq!(timer.elapsed_ms(at(60_000)), 6_000);
    }

    #[test]
    fn test_elapsed_includes_running_interval() {
        let mut timer = DiscussionTimer {
            total_ms: 1_000,
            ..Default::default()
        };
        timer.start(at(0));
        assert!(timer.is_running());
        assert_eq!(timer.elapsed_ms(at(2_500)), 3_500);
        // Reading never mutates
        assert_eq!(timer.total_ms, 1_000);
    }

    #[test]
    fn test_pause_requires_running() {
        let mut timer = DiscussionTimer::default();
        assert_eq!(timer.pause(at(0)), Err(DomainError::TimerNotRunning));

        timer.start(at(0));
        timer.pause(at(1_000)).unwrap();
        assert_eq!(timer.pause(at(2_000)), Err(DomainError::TimerNotRunning));
        assert_eq!(timer.total_ms, 1_000);
    }

    #[test]
    fn test_redundant_start_restarts_interval_only() {
        let mut timer = DiscussionTimer::default();
        timer.start(at(0));
        timer.pause(at(4_000)).unwrap();
        timer.start(at(5_000));
        timer.start(at(7_000));
        assert_eq!(timer.total_ms, 4_000);
        assert_eq!(timer.elapsed_ms(at(8_000)), 5_000);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut timer = DiscussionTimer::default();
        timer.start(at(0));
        timer.pause(at(3_000)).unwrap();
        timer.reset();
        assert_eq!(timer, DiscussionTimer::default());
    }

    #[test]
    fn test_freeze_folds_running_interval() {
        let mut timer = DiscussionTimer::default();
        timer.start(at(0));
        timer.freeze(at(2_000));
        assert_eq!(timer.total_ms, 2_000);
        assert!(timer.started_at.is_none());
        assert!(timer.paused_at.is_none());
    }

    #[test]
    fn test_freeze_paused_timer_keeps_total() {
        let mut timer = DiscussionTimer::default();
        timer.start(at(0));
        timer.pause(at(2_000)).unwrap();
        timer.freeze(at(10_000));
        assert_eq!(timer.total_ms, 2_000);
    }

    #[test]
    fn test_clock_skew_never_shrinks_total() {
        let mut timer = DiscussionTimer::default();
        timer.start(at(5_000));
        timer.pause(at(4_000)).unwrap();
        assert_eq!(timer.total_ms, 0);
    }

    #[test]
    fn test_snapshot_against_time_box() {
        let mut timer = DiscussionTimer::default();
        timer.start(at(0));

        let early = timer.snapshot(at(60_000), NINE_MINUTES_MS);
        assert!(early.running);
        assert_eq!(early.remaining_ms, NINE_MINUTES_MS - 60_000);
        assert!(!early.expired);

        let late = timer.snapshot(at(NINE_MINUTES_MS as i64), NINE_MINUTES_MS);
        assert_eq!(late.remaining_ms, 0);
        assert!(late.expired);
    }
}
