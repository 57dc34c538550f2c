use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::{
    core::{series::Totals, tariff::FeePair},
    quantity::{cost::Cost, energy::KilowattHours},
};

/// Energy and cost for one request, ready for presentation.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[must_use]
pub struct PeriodMetrics {
    #[serde(rename = "energy_kwh")]
    pub energy: KilowattHours,

    pub cost_ht: Cost,
    pub cost_ttc: Cost,

    /// Cost plus the prorated subscription, excluding taxes.
    pub total_ht: Cost,

    /// Cost plus the prorated subscription, including taxes.
    pub total_ttc: Cost,

    pub computed_at: DateTime<Local>,
    pub from_cache: bool,
    pub cached_age_s: u64,
}

impl PeriodMetrics {
    pub fn new(totals: Totals, subscription: FeePair, computed_at: DateTime<Local>) -> Self {
        let totals = totals.rounded();
        Self {
            energy: totals.energy,
            cost_ht: totals.cost_ht,
            cost_ttc: totals.cost_ttc,
            total_ht: (totals.cost_ht + subscription.ht).round_to_hundredths_of_cent(),
            total_ttc: (totals.cost_ttc + subscription.ttc).round_to_hundredths_of_cent(),
            computed_at,
            from_cache: false,
            cached_age_s: 0,
        }
    }

    /// Metrics without any subscription share.
    pub fn from_totals(totals: Totals, computed_at: DateTime<Local>) -> Self {
        Self::new(totals, FeePair::default(), computed_at)
    }

    /// Zero-filled metrics for when there is no data to report.
    pub fn unavailable(computed_at: DateTime<Local>) -> Self {
        Self::from_totals(Totals::default(), computed_at)
    }

    pub const fn totals(&self) -> Totals {
        Totals { energy: self.energy, cost_ht: self.cost_ht, cost_ttc: self.cost_ttc }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_totals_include_subscription() {
        let metrics = PeriodMetrics::new(
            Totals {
                energy: KilowattHours::from(10.0),
                cost_ht: Cost::from(2.0),
                cost_ttc: Cost::from(2.5),
            },
            FeePair { ht: Cost::from(0.8), ttc: Cost::from(1.0) },
            Local::now(),
        );
        assert_abs_diff_eq!(metrics.total_ht.0, 2.8);
        assert_abs_diff_eq!(metrics.total_ttc.0, 3.5);
        assert!(!metrics.from_cache);
    }

    #[test]
    fn test_serialized_field_names() -> crate::prelude::Result {
        let value = serde_json::to_value(PeriodMetrics::unavailable(Local::now()))?;
        let fields = ["energy_kwh", "cost_ht", "cost_ttc", "total_ht", "total_ttc", "cached_age_s"];
        for field in fields {
            assert!(value.get(field).is_some(), "missing `{field}`");
        }
        Ok(())
    }
}
