use std::collections::HashMap;

use async_trait::async_trait;

use crate::{
    core::{granularity::Granularity, interval::Interval, series::EnergySample},
    prelude::*,
    quantity::energy::KilowattHours,
};

/// Provider answer that tells "no data" apart from an actual result.
#[must_use]
pub enum Fetched<T> {
    Available(T),
    Unavailable,
}

/// Energy consumed per entity, per reporting period.
pub type EnergySnapshot = HashMap<String, HashMap<Granularity, KilowattHours>>;

/// Hourly cumulative records per statistic id, sorted by interval start.
pub type StatisticsSeries = HashMap<String, Vec<EnergySample>>;

#[async_trait]
pub trait EnergySnapshotProvider: Sync {
    async fn get_energy_snapshot(&self, entity_ids: &[String]) -> Result<Fetched<EnergySnapshot>>;
}

#[async_trait]
pub trait StatisticsProvider: Sync {
    async fn get_statistics(
        &self,
        statistic_ids: &[String],
        period: Interval,
    ) -> Result<Fetched<StatisticsSeries>>;
}

#[async_trait]
impl<P: StatisticsProvider + ?Sized> StatisticsProvider for Box<P> {
    async fn get_statistics(
        &self,
        statistic_ids: &[String],
        period: Interval,
    ) -> Result<Fetched<StatisticsSeries>> {
        (**self).get_statistics(statistic_ids, period).await
    }
}
