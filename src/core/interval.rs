use std::fmt::{Debug, Formatter};

use chrono::{DateTime, Local, TimeDelta};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[must_use]
pub struct Interval {
    /// Inclusive.
    pub start: DateTime<Local>,

    /// Exclusive.
    pub end: DateTime<Local>,
}

impl Debug for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}..{:?}", self.start, self.end)
    }
}

impl Interval {
    pub const fn new(start: DateTime<Local>, end: DateTime<Local>) -> Self {
        Self { start, end }
    }

    pub fn hour_starting_at(start: DateTime<Local>) -> Self {
        Self { start, end: start + TimeDelta::hours(1) }
    }

    #[must_use]
    pub fn duration(self) -> TimeDelta {
        self.end - self.start
    }

    /// Whole seconds covered, never negative.
    #[must_use]
    pub fn duration_seconds(self) -> i64 {
        self.duration().num_seconds().max(0)
    }

    #[must_use]
    pub fn contains(self, other: DateTime<Local>) -> bool {
        (self.start <= other) && (other < self.end)
    }
}
