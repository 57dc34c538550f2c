//! Before/after comparison of two consumption windows, priced hour by hour.

use std::{cmp::Reverse, collections::HashMap, sync::Arc};

use chrono::TimeDelta;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::{
    core::{
        clock::Clock,
        interval::Interval,
        metrics::PeriodMetrics,
        provider::{Fetched, StatisticsProvider},
        series::{CumulativeDeltas, ProjectCost, SumWithin, Totals},
        tariff::TariffProfile,
    },
    prelude::*,
    quantity::round_to,
};

pub const MAX_TOP_ENTITIES: usize = 50;

const SECONDS_PER_HOUR: f64 = 3600.0;
const SECONDS_PER_DAY: f64 = 86400.0;

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[must_use]
pub struct ComparisonResult {
    pub baseline: PeriodMetrics,
    pub event: PeriodMetrics,

    pub baseline_per_hour: Totals,
    pub baseline_per_day: Totals,
    pub event_per_hour: Totals,
    pub event_per_day: Totals,

    /// Event minus baseline, both per hour.
    pub delta: Totals,

    pub percent_change: PercentChange,
}

impl ComparisonResult {
    #[must_use]
    pub const fn delta_of(&self, metric: RankBy) -> f64 {
        match metric {
            RankBy::EnergyKwh => self.delta.energy.0,
            RankBy::CostTtc => self.delta.cost_ttc.0,
        }
    }
}

/// Relative change in percent, zero whenever the baseline is zero.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub struct PercentChange {
    pub energy_kwh: f64,
    pub cost_ht: f64,
    pub cost_ttc: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntityComparison {
    pub entity_id: String,

    #[serde(flatten)]
    pub comparison: ComparisonResult,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RankBy {
    EnergyKwh,
    CostTtc,
}

/// Put the two windows on the same footing and tell how the event differs from the baseline.
///
/// Deltas and percents come from the exact per-hour quotients. Only the reported figures
/// are rounded.
pub fn normalize_comparison(
    baseline: PeriodMetrics,
    event: PeriodMetrics,
    baseline_duration_s: i64,
    event_duration_s: i64,
) -> ComparisonResult {
    let baseline_per_hour = normalize(baseline.totals(), baseline_duration_s, SECONDS_PER_HOUR);
    let event_per_hour = normalize(event.totals(), event_duration_s, SECONDS_PER_HOUR);
    ComparisonResult {
        baseline,
        event,
        baseline_per_hour: baseline_per_hour.rounded(),
        baseline_per_day: normalize(baseline.totals(), baseline_duration_s, SECONDS_PER_DAY)
            .rounded(),
        event_per_hour: event_per_hour.rounded(),
        event_per_day: normalize(event.totals(), event_duration_s, SECONDS_PER_DAY).rounded(),
        delta: Totals {
            energy: event_per_hour.energy - baseline_per_hour.energy,
            cost_ht: event_per_hour.cost_ht - baseline_per_hour.cost_ht,
            cost_ttc: event_per_hour.cost_ttc - baseline_per_hour.cost_ttc,
        }
        .rounded(),
        percent_change: PercentChange {
            energy_kwh: percent_change(baseline_per_hour.energy.0, event_per_hour.energy.0),
            cost_ht: percent_change(baseline_per_hour.cost_ht.0, event_per_hour.cost_ht.0),
            cost_ttc: percent_change(baseline_per_hour.cost_ttc.0, event_per_hour.cost_ttc.0),
        },
    }
}

/// Largest changes first, by absolute delta of the metric.
///
/// The limit is clamped into `1..=50` whatever the caller asks for.
pub fn compute_top_entities(
    mut comparisons: Vec<EntityComparison>,
    sort_by: RankBy,
    limit: usize,
) -> Vec<EntityComparison> {
    comparisons
        .sort_by_key(|entity| Reverse(OrderedFloat(entity.comparison.delta_of(sort_by).abs())));
    comparisons.truncate(limit.clamp(1, MAX_TOP_ENTITIES));
    comparisons
}

/// Unrounded totals per unit of time, zero for an empty window.
#[expect(clippy::cast_precision_loss)]
fn normalize(totals: Totals, duration_s: i64, unit_s: f64) -> Totals {
    if duration_s <= 0 {
        return Totals::default();
    }
    let n_units = duration_s as f64 / unit_s;
    Totals {
        energy: totals.energy / n_units,
        cost_ht: totals.cost_ht / n_units,
        cost_ttc: totals.cost_ttc / n_units,
    }
}

fn percent_change(baseline: f64, event: f64) -> f64 {
    if baseline.abs() < f64::EPSILON {
        0.0
    } else {
        round_to((event - baseline) / baseline * 100.0, 2)
    }
}

/// Runs the hourly pipeline over a baseline and an event window.
pub struct ComparisonAnalyzer<S> {
    statistics: S,
    clock: Arc<dyn Clock>,
}

impl<S: StatisticsProvider> ComparisonAnalyzer<S> {
    pub fn new(statistics: S, clock: Arc<dyn Clock>) -> Self {
        Self { statistics, clock }
    }

    /// One comparison per entity, in the order of `entity_ids`.
    #[instrument(skip_all, fields(n_entities = entity_ids.len()))]
    pub async fn compare_entities(
        &self,
        entity_ids: &[String],
        baseline: Interval,
        event: Interval,
        profile: &TariffProfile,
    ) -> Vec<EntityComparison> {
        let (baseline_totals, event_totals) = tokio::join!(
            self.window_totals(entity_ids, baseline, profile),
            self.window_totals(entity_ids, event, profile),
        );
        let now = self.clock.now();
        entity_ids
            .iter()
            .map(|entity_id| {
                let lookup = |totals: &HashMap<String, Totals>| {
                    let totals = totals.get(entity_id).copied().unwrap_or_default();
                    PeriodMetrics::from_totals(totals, now)
                };
                EntityComparison {
                    entity_id: entity_id.clone(),
                    comparison: normalize_comparison(
                        lookup(&baseline_totals),
                        lookup(&event_totals),
                        baseline.duration_seconds(),
                        event.duration_seconds(),
                    ),
                }
            })
            .collect()
    }

    /// The entities summed up as a single consumer.
    #[instrument(skip_all, fields(n_entities = entity_ids.len()))]
    pub async fn compare_group(
        &self,
        entity_ids: &[String],
        baseline: Interval,
        event: Interval,
        profile: &TariffProfile,
    ) -> ComparisonResult {
        let (baseline_totals, event_totals) = tokio::join!(
            self.window_totals(entity_ids, baseline, profile),
            self.window_totals(entity_ids, event, profile),
        );
        let now = self.clock.now();
        let sum = |totals: HashMap<String, Totals>| {
            PeriodMetrics::from_totals(
                totals.into_values().fold(Totals::default(), |lhs, rhs| lhs + rhs),
                now,
            )
        };
        normalize_comparison(
            sum(baseline_totals),
            sum(event_totals),
            baseline.duration_seconds(),
            event.duration_seconds(),
        )
    }

    /// Priced totals per entity within the window.
    ///
    /// One extra hour is fetched before the window so that its first hour has a reading
    /// to measure from. That lead-in hour itself is left out of the sum.
    async fn window_totals(
        &self,
        entity_ids: &[String],
        window: Interval,
        profile: &TariffProfile,
    ) -> HashMap<String, Totals> {
        let lead_in = Interval::new(window.start - TimeDelta::hours(1), window.end);
        let series = match self.statistics.get_statistics(entity_ids, lead_in).await {
            Ok(Fetched::Available(series)) => series,
            Ok(Fetched::Unavailable) => {
                warn!(?window, "no statistics available");
                return HashMap::new();
            }
            Err(error) => {
                warn!(?window, error = %format!("{error:#}"), "failed to fetch the statistics");
                return HashMap::new();
            }
        };
        series
            .into_iter()
            .map(|(entity_id, samples)| {
                let totals = samples
                    .into_iter()
                    .cumulative_deltas()
                    .project_cost(profile)
                    .sum_within(window);
                debug!(entity_id, energy = ?totals.energy, cost_ttc = ?totals.cost_ttc, "priced");
                (entity_id, totals)
            })
            .collect()
    }
}
