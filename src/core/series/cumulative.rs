use crate::{
    core::series::{EnergySample, HourlyDelta},
    prelude::*,
    quantity::energy::KilowattHours,
};

impl<T> CumulativeDeltas for T where T: ?Sized {}

pub trait CumulativeDeltas {
    /// Turn cumulative counter readings into per-interval consumption.
    ///
    /// Every sample yields one delta. The first anchored reading yields zero. A missing reading
    /// yields zero and leaves the previous anchor in place, so the next real reading still
    /// measures from the last known value. A decreasing counter (reset or rollover) yields zero
    /// and re-anchors at the new value.
    fn cumulative_deltas(self) -> impl Iterator<Item = HourlyDelta>
    where
        Self: Iterator<Item = EnergySample> + Sized,
    {
        let mut previous_sum: Option<KilowattHours> = None;
        self.map(move |sample| {
            let energy = match (sample.cumulative, previous_sum) {
                (None, _) => KilowattHours::ZERO,
                (Some(sum), None) => {
                    previous_sum = Some(sum);
                    KilowattHours::ZERO
                }
                (Some(sum), Some(previous)) => {
                    previous_sum = Some(sum);
                    let delta = sum - previous;
                    if delta < KilowattHours::ZERO {
                        warn!(
                            start = ?sample.interval.start,
                            ?previous,
                            ?sum,
                            "counter went backwards, clamping the delta to zero",
                        );
                        KilowattHours::ZERO
                    } else {
                        delta
                    }
                }
            };
            HourlyDelta { interval: sample.interval, energy }
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Local, NaiveDate, TimeDelta};
    use itertools::Itertools;

    use super::*;
    use crate::core::interval::Interval;

    fn samples(readings: &[Option<f64>]) -> Vec<EnergySample> {
        let start = NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_local_timezone(Local)
            .unwrap();
        readings
            .iter()
            .zip(0..)
            .map(|(reading, hour)| EnergySample {
                interval: Interval::hour_starting_at(start + TimeDelta::hours(hour)),
                cumulative: reading.map(KilowattHours::from),
            })
            .collect()
    }

    fn deltas(readings: &[Option<f64>]) -> Vec<f64> {
        samples(readings).into_iter().cumulative_deltas().map(|delta| delta.energy.0).collect()
    }

    #[test]
    fn test_reset_is_clamped() {
        assert_eq!(deltas(&[Some(10.0), Some(12.0), Some(11.0), Some(15.0)]), [0.0, 2.0, 0.0, 4.0]);
    }

    #[test]
    fn test_missing_reading_keeps_anchor() {
        assert_eq!(deltas(&[Some(10.0), None, Some(13.0)]), [0.0, 0.0, 3.0]);
    }

    #[test]
    fn test_leading_missing_readings() {
        assert_eq!(deltas(&[None, None, Some(5.0), Some(6.5)]), [0.0, 0.0, 0.0, 1.5]);
    }

    #[test]
    fn test_decreasing_sequence_is_never_negative() {
        let deltas = deltas(&[Some(100.0), Some(90.0), Some(50.0), Some(0.0), Some(-3.0)]);
        assert!(deltas.iter().all(|delta| *delta >= 0.0));
    }

    #[test]
    fn test_intervals_are_carried_over() {
        let samples = samples(&[Some(1.0), Some(2.0)]);
        let intervals = samples
            .clone()
            .into_iter()
            .cumulative_deltas()
            .map(|delta| delta.interval)
            .collect_vec();
        assert_eq!(intervals, samples.iter().map(|sample| sample.interval).collect_vec());
    }
}
