//! Wall-clock adapter for the [`Clock`] port.

use chrono::{DateTime, Utc};
use leancup_application::ports::clock::Clock;

/// Clock backed by the system time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
