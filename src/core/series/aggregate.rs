use crate::core::{
    interval::Interval,
    series::{HourlyCost, Totals},
};

impl<T> SumWithin for T where T: ?Sized {}

pub trait SumWithin {
    /// Sum the entries whose interval starts within the period.
    fn sum_within(self, period: Interval) -> Totals
    where
        Self: Iterator<Item = HourlyCost> + Sized,
    {
        self.filter(|cost| period.contains(cost.interval.start))
            .map(|cost| Totals {
                energy: cost.energy,
                cost_ht: cost.cost_ht,
                cost_ttc: cost.cost_ttc,
            })
            .fold(Totals::default(), |lhs, rhs| lhs + rhs)
            .rounded()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::{DateTime, Local, NaiveDate};

    use super::*;
    use crate::quantity::{cost::Cost, energy::KilowattHours};

    fn at(hour: u32) -> DateTime<Local> {
        NaiveDate::from_ymd_opt(2025, 8, 20)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
            .and_local_timezone(Local)
            .unwrap()
    }

    fn cost(hour: u32, energy: f64) -> HourlyCost {
        HourlyCost {
            interval: Interval::hour_starting_at(at(hour)),
            energy: KilowattHours::from(energy),
            cost_ht: Cost::from(energy * 0.1),
            cost_ttc: Cost::from(energy * 0.12),
        }
    }

    #[test]
    fn test_period_is_half_open() {
        let totals = [cost(0, 1.0), cost(1, 2.0), cost(2, 4.0), cost(3, 8.0)]
            .into_iter()
            .sum_within(Interval::new(at(1), at(3)));
        assert_abs_diff_eq!(totals.energy.0, 6.0);
        assert_abs_diff_eq!(totals.cost_ht.0, 0.6);
        assert_abs_diff_eq!(totals.cost_ttc.0, 0.72);
    }

    #[test]
    fn test_empty_period() {
        let totals = [cost(5, 1.0)].into_iter().sum_within(Interval::new(at(1), at(3)));
        assert_eq!(totals, Totals::default());
    }

    #[test]
    fn test_result_is_rounded() {
        let totals =
            [cost(1, 0.1), cost(2, 0.2)].into_iter().sum_within(Interval::new(at(0), at(4)));
        assert_abs_diff_eq!(totals.energy.0, 0.3);
        assert_abs_diff_eq!(totals.cost_ttc.0, 0.036);
    }
}
