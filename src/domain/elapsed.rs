//! Elapsed-time breakdown used in alert messages

use chrono::{DateTime, Utc};
use std::fmt;

/// Whole seconds split into hours, minutes and seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elapsed {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl Elapsed {
    /// Negative input clamps to zero (clock skew between block time and local time)
    pub fn from_seconds(total: i64) -> Self {
        let total = total.max(0) as u64;
        Self {
            hours: total / 3600,
            minutes: (total % 3600) / 60,
            seconds: total % 60,
        }
    }

    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::from_seconds((end - start).num_seconds())
    }

    pub fn total_seconds(&self) -> u64 {
        self.hours * 3600 + self.minutes * 60 + self.seconds
    }
}

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hours > 0 {
            write!(f, "{}h {}m {}s", self.hours, self.minutes, self.seconds)
        } else if self.minutes > 0 {
            write!(f, "{}m {}s", self.minutes, self.seconds)
        } else {
            write!(f, "{}s", self.seconds)
        }
    }
}
