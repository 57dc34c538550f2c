use crate::{
    core::{
        series::{HourlyCost, HourlyDelta},
        tariff::TariffProfile,
    },
    quantity::{cost::Cost, rate::KilowattHourRate},
};

impl<T> ProjectCost for T where T: ?Sized {}

pub trait ProjectCost {
    /// Price each delta at the rate in force at the start of its interval.
    fn project_cost(self, profile: &TariffProfile) -> impl Iterator<Item = HourlyCost>
    where
        Self: Iterator<Item = HourlyDelta> + Sized,
    {
        self.map(move |delta| {
            let rate = profile.rate_at(delta.interval.start);
            HourlyCost {
                interval: delta.interval,
                energy: delta.energy.round_to_watt_hours(),
                cost_ht: price(delta, rate.ht),
                cost_ttc: price(delta, rate.ttc),
            }
        })
    }
}

fn price(delta: HourlyDelta, rate: KilowattHourRate) -> Cost {
    (delta.energy * rate).round_to_hundredths_of_cent()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::{Local, NaiveDate, NaiveTime};
    use itertools::Itertools;

    use super::*;
    use crate::{
        core::{
            interval::Interval,
            tariff::{Contract, PeakWindow, RatePair, SubRates},
        },
        quantity::energy::KilowattHours,
    };

    fn delta(hour: u32, energy: f64) -> HourlyDelta {
        let start = NaiveDate::from_ymd_opt(2025, 4, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
            .and_local_timezone(Local)
            .unwrap();
        HourlyDelta {
            interval: Interval::hour_starting_at(start),
            energy: KilowattHours::from(energy),
        }
    }

    #[test]
    fn test_peak_and_off_peak_hours_are_priced_separately() {
        let profile = TariffProfile::builder()
            .base(RatePair { ht: KilowattHourRate::from(0.2), ttc: KilowattHourRate::from(0.25) })
            .contract(Contract::PeakOffPeak {
                window: PeakWindow {
                    start: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
                    end: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
                },
                peak: SubRates {
                    ht: Some(KilowattHourRate::from(0.3)),
                    ttc: Some(KilowattHourRate::from(0.4)),
                },
                off_peak: SubRates {
                    ht: Some(KilowattHourRate::from(0.1)),
                    ttc: Some(KilowattHourRate::from(0.15)),
                },
            })
            .build();
        let costs =
            [delta(3, 2.0), delta(12, 2.0)].into_iter().project_cost(&profile).collect_vec();
        assert_abs_diff_eq!(costs[0].cost_ht.0, 0.2);
        assert_abs_diff_eq!(costs[0].cost_ttc.0, 0.3);
        assert_abs_diff_eq!(costs[1].cost_ht.0, 0.6);
        assert_abs_diff_eq!(costs[1].cost_ttc.0, 0.8);
    }

    #[test]
    fn test_rounding() {
        let profile = TariffProfile::builder()
            .base(RatePair {
                ht: KilowattHourRate::from(0.123_456),
                ttc: KilowattHourRate::from(0.1),
            })
            .build();
        let cost = [delta(0, 1.234_56)].into_iter().project_cost(&profile).next().unwrap();
        assert_abs_diff_eq!(cost.energy.0, 1.235);
        assert_abs_diff_eq!(cost.cost_ht.0, 0.1524);
        assert_abs_diff_eq!(cost.cost_ttc.0, 0.1235);
    }
}
