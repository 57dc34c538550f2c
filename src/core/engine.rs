use std::sync::Arc;

use crate::{
    core::{
        cache::{CacheStats, CacheStore, CachedMetrics, Fingerprint},
        clock::Clock,
        granularity::Granularity,
        metrics::PeriodMetrics,
        proration::prorate,
        provider::{EnergySnapshot, EnergySnapshotProvider, Fetched},
        series::Totals,
        tariff::{FeePair, TariffProfile},
    },
    prelude::*,
    quantity::energy::KilowattHours,
};

/// Cache-first period metrics for groups of entities.
///
/// The whole period sum is priced at the rate in force right now. This is coarser than the
/// hourly integration done for comparisons, and peak/off-peak costs may differ between the two.
pub struct CalculationEngine<P> {
    snapshots: P,
    cache: Arc<CacheStore>,
    clock: Arc<dyn Clock>,
}

impl<P: EnergySnapshotProvider> CalculationEngine<P> {
    pub fn new(snapshots: P, cache: Arc<CacheStore>, clock: Arc<dyn Clock>) -> Self {
        Self { snapshots, cache, clock }
    }

    #[instrument(skip_all, fields(group_key = group_key, period = %period))]
    pub async fn get_group_metrics(
        &self,
        group_key: &str,
        period: Granularity,
        profile: &TariffProfile,
        entity_ids: &[String],
    ) -> PeriodMetrics {
        let fingerprint = Fingerprint::of(entity_ids, period, profile);
        if let Some(metrics) = self.cache.get(&fingerprint) {
            debug!(%fingerprint, age_s = metrics.cached_age_s, "cache hit");
            return metrics;
        }
        debug!(%fingerprint, "cache miss");

        let snapshot = match self.snapshots.get_energy_snapshot(entity_ids).await {
            Ok(Fetched::Available(snapshot)) => snapshot,
            Ok(Fetched::Unavailable) => {
                warn!(n_entities = entity_ids.len(), "no energy data available");
                return PeriodMetrics::unavailable(self.clock.now());
            }
            Err(error) => {
                warn!(error = %format!("{error:#}"), "failed to fetch the energy snapshot");
                return PeriodMetrics::unavailable(self.clock.now());
            }
        };

        let now = self.clock.now();
        let energy = sum_positive(&snapshot, entity_ids, period);
        let rate = profile.rate_at(now);
        let totals = Totals { energy, cost_ht: energy * rate.ht, cost_ttc: energy * rate.ttc };
        let subscription = FeePair {
            ht: prorate(profile.subscription.ht, period, now),
            ttc: prorate(profile.subscription.ttc, period, now),
        };
        let metrics = PeriodMetrics::new(totals, subscription, now);
        info!(energy = ?metrics.energy, total_ttc = ?metrics.total_ttc, "computed");

        self.cache.set(
            fingerprint,
            period,
            CachedMetrics {
                group_key: group_key.to_string(),
                entity_ids: entity_ids.to_vec(),
                metrics,
            },
        );
        metrics
    }

    pub fn invalidate_entity(&self, entity_id: &str) -> usize {
        self.cache.invalidate_entity(entity_id)
    }

    pub fn invalidate_all(&self) -> usize {
        self.cache.invalidate_all()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

/// Sum the period's energy over the entities, ignoring missing and non-positive values.
fn sum_positive(
    snapshot: &EnergySnapshot,
    entity_ids: &[String],
    period: Granularity,
) -> KilowattHours {
    entity_ids
        .iter()
        .filter_map(|entity_id| {
            let Some(energy) = snapshot.get(entity_id).and_then(|periods| periods.get(&period))
            else {
                debug!(entity_id, %period, "no value");
                return None;
            };
            if energy.is_positive() {
                Some(*energy)
            } else {
                if *energy < KilowattHours::ZERO {
                    warn!(entity_id, %period, ?energy, "negative energy value, excluding");
                }
                None
            }
        })
        .sum()
}
