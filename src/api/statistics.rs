use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::{
    core::{interval::Interval, series::EnergySample},
    prelude::*,
    quantity::energy::KilowattHours,
};

/// Recorder-style hourly statistic row, as exported by the home automation host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[must_use]
pub struct StatisticRecord {
    pub start: RawInstant,
    pub end: RawInstant,

    /// Cumulative counter value at the end of the hour.
    #[serde(default)]
    pub sum: Option<f64>,
}

/// Epoch milliseconds or an RFC 3339 string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawInstant {
    Millis(i64),
    Text(String),
}

impl RawInstant {
    #[must_use]
    pub fn to_local(&self) -> Option<DateTime<Local>> {
        match self {
            Self::Millis(millis) => Local.timestamp_millis_opt(*millis).single(),
            Self::Text(text) => {
                DateTime::parse_from_rfc3339(text).ok().map(|instant| instant.with_timezone(&Local))
            }
        }
    }
}

impl From<DateTime<Local>> for RawInstant {
    fn from(instant: DateTime<Local>) -> Self {
        Self::Millis(instant.timestamp_millis())
    }
}

impl StatisticRecord {
    /// Convert into a sample, or `None` when either bound is not a usable instant.
    pub fn to_sample(&self) -> Option<EnergySample> {
        let (Some(start), Some(end)) = (self.start.to_local(), self.end.to_local()) else {
            warn!(start = ?self.start, end = ?self.end, "skipping a record with invalid instants");
            return None;
        };
        Some(EnergySample {
            interval: Interval::new(start, end),
            cumulative: self.sum.map(KilowattHours::from),
        })
    }
}

/// Samples within the period, sorted by start.
pub fn to_samples(records: &[StatisticRecord], period: Interval) -> Vec<EnergySample> {
    let mut samples = records
        .iter()
        .filter_map(StatisticRecord::to_sample)
        .filter(|sample| period.contains(sample.interval.start))
        .collect::<Vec<_>>();
    samples.sort_by_key(|sample| sample.interval.start);
    samples
}
