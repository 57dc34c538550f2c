mod aggregate;
mod cumulative;
mod project;

use serde::{Deserialize, Serialize};

pub use self::{aggregate::SumWithin, cumulative::CumulativeDeltas, project::ProjectCost};
use crate::{
    core::interval::Interval,
    quantity::{cost::Cost, energy::KilowattHours},
};

/// Cumulative counter reading covering one statistics interval.
#[derive(Copy, Clone, Debug, PartialEq)]
#[must_use]
pub struct EnergySample {
    pub interval: Interval,

    /// Missing readings are `None`.
    pub cumulative: Option<KilowattHours>,
}

#[derive(Copy, Clone, Debug, PartialEq)]
#[must_use]
pub struct HourlyDelta {
    pub interval: Interval,

    /// Never negative.
    pub energy: KilowattHours,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[must_use]
pub struct HourlyCost {
    pub interval: Interval,

    #[serde(rename = "energy_kwh")]
    pub energy: KilowattHours,

    pub cost_ht: Cost,
    pub cost_ttc: Cost,
}

/// Energy and cost summed over a period.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize, derive_more::Add)]
#[must_use]
pub struct Totals {
    #[serde(rename = "energy_kwh")]
    pub energy: KilowattHours,

    pub cost_ht: Cost,
    pub cost_ttc: Cost,
}

impl Totals {
    pub fn rounded(self) -> Self {
        Self {
            energy: self.energy.round_to_watt_hours(),
            cost_ht: self.cost_ht.round_to_hundredths_of_cent(),
            cost_ttc: self.cost_ttc.round_to_hundredths_of_cent(),
        }
    }
}
