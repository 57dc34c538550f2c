use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Local, TimeDelta};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Hand-driven clock for tests and replays.
pub struct ManualClock(Mutex<DateTime<Local>>);

impl ManualClock {
    pub const fn new(now: DateTime<Local>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, by: TimeDelta) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
