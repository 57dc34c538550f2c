//! Elapsed-to-date share of a monthly subscription fee.

use chrono::{DateTime, Datelike, Local};

use crate::{core::granularity::Granularity, quantity::cost::Cost};

/// Nominal month length the fee is spread over.
const DAYS_PER_MONTH: f64 = 30.0;

/// Subscription fee accrued so far within the current period.
///
/// This is never a projection to the end of the period: a weekly figure on a Wednesday
/// covers three days, a yearly one on February 1st covers 32.
pub fn prorate(monthly_fee: Cost, granularity: Granularity, now: DateTime<Local>) -> Cost {
    let daily_fee = monthly_fee / DAYS_PER_MONTH;
    let prorated = match granularity {
        Granularity::Hourly => monthly_fee / (DAYS_PER_MONTH * 24.0),
        Granularity::Daily => daily_fee,
        Granularity::Weekly => daily_fee * f64::from(now.weekday().number_from_monday()),
        Granularity::Monthly => daily_fee * f64::from(now.day()),
        Granularity::Yearly => {
            monthly_fee * 12.0 / f64::from(days_in_year(now.year())) * f64::from(now.ordinal())
        }
    };
    prorated.round_to_cents()
}

#[must_use]
pub const fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0) && ((year % 100 != 0) || (year % 400 == 0))
}

#[must_use]
pub const fn days_in_year(year: i32) -> u32 {
    if is_leap_year(year) { 366 } else { 365 }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    use super::*;

    fn on(year: i32, month: u32, day: u32) -> DateTime<Local> {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_local_timezone(Local)
            .unwrap()
    }

    #[test]
    fn test_hourly() {
        assert_abs_diff_eq!(prorate(Cost::from(72.0), Granularity::Hourly, on(2025, 5, 5)).0, 0.1);
    }

    #[test]
    fn test_daily() {
        assert_abs_diff_eq!(prorate(Cost::from(30.0), Granularity::Daily, on(2025, 5, 5)).0, 1.0);
    }

    #[test]
    fn test_weekly_counts_monday_as_one_day() {
        // 2025-05-05 is a Monday.
        assert_abs_diff_eq!(prorate(Cost::from(30.0), Granularity::Weekly, on(2025, 5, 5)).0, 1.0);
        assert_abs_diff_eq!(prorate(Cost::from(30.0), Granularity::Weekly, on(2025, 5, 11)).0, 7.0);
    }

    #[test]
    fn test_monthly_uses_day_of_month() {
        assert_abs_diff_eq!(
            prorate(Cost::from(30.0), Granularity::Monthly, on(2025, 2, 14)).0,
            14.0
        );
    }

    #[test]
    fn test_yearly_non_leap_first_day() {
        assert_abs_diff_eq!(prorate(Cost::from(30.0), Granularity::Yearly, on(2025, 1, 1)).0, 0.99);
    }

    #[test]
    fn test_yearly_leap_last_day() {
        assert_abs_diff_eq!(
            prorate(Cost::from(30.0), Granularity::Yearly, on(2024, 12, 31)).0,
            360.0
        );
    }

    #[test]
    fn test_leap_rule() {
        assert!(is_leap_year(2024));
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(1900));
        assert!(!is_leap_year(2025));
        assert_eq!(days_in_year(2100), 365);
    }
}
