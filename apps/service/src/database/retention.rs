//! Sliding retention window for stored ping statistics.
//!
//! Pruning is not scheduled separately: every append deletes whatever fell
//! out of the window, so the table never holds more than one window of data
//! plus the rows written since the last append.

use chrono::{DateTime, TimeDelta, Utc};

/// How long records are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Days to keep ping statistics
    pub days: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self { days: 15 }
    }
}

impl RetentionPolicy {
    pub fn new(days: u32) -> Self {
        Self { days }
    }

    /// Length of the retention window
    pub fn window(&self) -> TimeDelta {
        TimeDelta::days(i64::from(self.days))
    }

    /// Records strictly older than this instant are expired at `now`.
    /// A window reaching past the earliest representable instant expires nothing.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.window()).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub fn is_expired(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        timestamp < self.cutoff(now)
    }
}
