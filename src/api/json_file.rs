//! Providers backed by JSON exports on disk.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::{
    api::statistics::{StatisticRecord, to_samples},
    core::{
        granularity::Granularity,
        interval::Interval,
        provider::{
            EnergySnapshot,
            EnergySnapshotProvider,
            Fetched,
            StatisticsProvider,
            StatisticsSeries,
        },
    },
    prelude::*,
    quantity::energy::KilowattHours,
};

/// Per-entity period totals: `{"sensor.x": {"daily": 4.2, "monthly": null}}`.
pub struct SnapshotFile(PathBuf);

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }
}

type RawSnapshot = HashMap<String, HashMap<String, Option<f64>>>;

#[async_trait]
impl EnergySnapshotProvider for SnapshotFile {
    #[instrument(skip_all, fields(path = %self.0.display()))]
    async fn get_energy_snapshot(&self, entity_ids: &[String]) -> Result<Fetched<EnergySnapshot>> {
        let mut raw: RawSnapshot = read_json(self.0.clone()).await?;
        let snapshot: EnergySnapshot = entity_ids
            .iter()
            .filter_map(|entity_id| raw.remove_entry(entity_id))
            .map(|(entity_id, periods)| {
                let periods = parse_periods(&entity_id, periods);
                (entity_id, periods)
            })
            .collect();
        debug!(n_requested = entity_ids.len(), n_found = snapshot.len(), "read the snapshot");
        Ok(if snapshot.is_empty() { Fetched::Unavailable } else { Fetched::Available(snapshot) })
    }
}

fn parse_periods(
    entity_id: &str,
    periods: HashMap<String, Option<f64>>,
) -> HashMap<Granularity, KilowattHours> {
    periods
        .into_iter()
        .filter_map(|(name, value)| match name.parse::<Granularity>() {
            Ok(period) => Some((period, KilowattHours::from(value?))),
            Err(_) => {
                debug!(entity_id, period = name, "skipping an unknown period");
                None
            }
        })
        .collect()
}

/// Hourly statistic records per id: `{"sensor.x": [{"start": …, "end": …, "sum": …}]}`.
pub struct StatisticsFile(PathBuf);

impl StatisticsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }
}

#[async_trait]
impl StatisticsProvider for StatisticsFile {
    #[instrument(skip_all, fields(path = %self.0.display(), period = ?period))]
    async fn get_statistics(
        &self,
        statistic_ids: &[String],
        period: Interval,
    ) -> Result<Fetched<StatisticsSeries>> {
        let records: HashMap<String, Vec<StatisticRecord>> = read_json(self.0.clone()).await?;
        let series: StatisticsSeries = statistic_ids
            .iter()
            .filter_map(|statistic_id| {
                let samples = to_samples(records.get(statistic_id)?, period);
                Some((statistic_id.clone(), samples))
            })
            .filter(|(_, samples)| !samples.is_empty())
            .collect();
        debug!(n_requested = statistic_ids.len(), n_found = series.len(), "read the statistics");
        Ok(if series.is_empty() { Fetched::Unavailable } else { Fetched::Available(series) })
    }
}

async fn read_json<T: DeserializeOwned + Send + 'static>(path: PathBuf) -> Result<T> {
    tokio::task::spawn_blocking(move || parse_file(&path)).await?
}

fn parse_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read `{}`", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse `{}`", path.display()))
}
