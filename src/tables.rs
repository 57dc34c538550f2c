use chrono::{DateTime, Local};
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};
use tariffed::core::{
    cache::CacheStats,
    comparison::{ComparisonResult, EntityComparison},
    granularity::Granularity,
    metrics::PeriodMetrics,
    series::Totals,
    tariff::{Contract, RatePair, TariffProfile},
};

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table
}

fn right(content: impl ToString) -> Cell {
    Cell::new(content).set_alignment(CellAlignment::Right)
}

/// Red for an increase, green for a decrease.
fn signed(value: f64, content: impl ToString) -> Cell {
    right(content).fg(if value > 0.0 {
        Color::Red
    } else if value < 0.0 {
        Color::Green
    } else {
        Color::Reset
    })
}

#[must_use]
pub fn build_metrics_table(group_key: &str, rows: &[(Granularity, PeriodMetrics)]) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        group_key,
        "Energy",
        "Cost HT",
        "Cost TTC",
        "Total HT",
        "Total TTC",
        "Computed at",
        "Cached",
    ]);
    for (period, metrics) in rows {
        table.add_row(vec![
            Cell::new(period).add_attribute(Attribute::Bold),
            right(metrics.energy),
            right(metrics.cost_ht),
            right(metrics.cost_ttc),
            right(metrics.total_ht),
            right(metrics.total_ttc).add_attribute(Attribute::Bold),
            Cell::new(metrics.computed_at.format("%Y-%m-%d %H:%M:%S"))
                .add_attribute(Attribute::Dim),
            if metrics.from_cache {
                right(format!("{} s", metrics.cached_age_s)).fg(Color::DarkYellow)
            } else {
                right("no").add_attribute(Attribute::Dim)
            },
        ]);
    }
    table
}

#[must_use]
pub fn build_cache_stats_table(stats: CacheStats) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Entries", "Fresh", "Recent", "Old", "Size"]);
    table.add_row(vec![
        right(stats.total_entries),
        right(stats.fresh_entries).fg(Color::Green),
        right(stats.recent_entries).fg(Color::DarkYellow),
        right(stats.old_entries).fg(Color::Red),
        right(format!("{} B", stats.approximate_size_bytes)),
    ]);
    table
}

#[must_use]
pub fn build_comparison_table(comparisons: &[EntityComparison]) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Entity",
        "Baseline",
        "Event",
        "Per hour before",
        "Per hour after",
        "Δ energy/h",
        "Δ energy, %",
        "Δ TTC/h",
        "Δ TTC, %",
    ]);
    for EntityComparison { entity_id, comparison } in comparisons {
        let mut row = vec![Cell::new(entity_id)];
        row.extend(comparison_cells(comparison));
        table.add_row(row);
    }
    table
}

#[must_use]
pub fn build_group_table(comparison: &ComparisonResult) -> Table {
    let mut table = new_table();
    table.set_header(vec!["", "Energy", "Cost HT", "Cost TTC"]);
    let mut add_totals = |label: &str, totals: Totals| {
        table.add_row(vec![
            Cell::new(label),
            right(totals.energy),
            right(totals.cost_ht),
            right(totals.cost_ttc),
        ]);
    };
    add_totals("Baseline", comparison.baseline.totals());
    add_totals("Event", comparison.event.totals());
    add_totals("Baseline per hour", comparison.baseline_per_hour);
    add_totals("Event per hour", comparison.event_per_hour);
    add_totals("Baseline per day", comparison.baseline_per_day);
    add_totals("Event per day", comparison.event_per_day);
    let delta = comparison.delta;
    let change = comparison.percent_change;
    table.add_row(vec![
        Cell::new("Δ per hour").add_attribute(Attribute::Bold),
        signed(delta.energy.0, format!("{} ({:+.2}%)", delta.energy, change.energy_kwh)),
        signed(delta.cost_ht.0, format!("{} ({:+.2}%)", delta.cost_ht, change.cost_ht)),
        signed(delta.cost_ttc.0, format!("{} ({:+.2}%)", delta.cost_ttc, change.cost_ttc)),
    ]);
    table
}

fn comparison_cells(comparison: &ComparisonResult) -> Vec<Cell> {
    let change = comparison.percent_change;
    vec![
        right(comparison.baseline.energy),
        right(comparison.event.energy),
        right(comparison.baseline_per_hour.energy).add_attribute(Attribute::Dim),
        right(comparison.event_per_hour.energy).add_attribute(Attribute::Dim),
        signed(comparison.delta.energy.0, comparison.delta.energy),
        signed(change.energy_kwh, format!("{:+.2}%", change.energy_kwh)),
        signed(comparison.delta.cost_ttc.0, comparison.delta.cost_ttc),
        signed(change.cost_ttc, format!("{:+.2}%", change.cost_ttc)),
    ]
}

#[must_use]
pub fn build_tariff_table(profile: &TariffProfile, now: DateTime<Local>) -> Table {
    let mut table = new_table();
    table.set_header(vec!["", "HT", "TTC"]);
    let mut add_rates = |label: &str, rates: RatePair| {
        table.add_row(vec![Cell::new(label), right(rates.ht), right(rates.ttc)]);
    };
    match &profile.contract {
        Contract::Flat => add_rates("Flat", profile.base),
        Contract::PeakOffPeak { window, .. } => {
            add_rates("Base", profile.base);
            add_rates(
                &format!("Peak {}–{}", window.start.format("%H:%M"), window.end.format("%H:%M")),
                profile.rate_for(true),
            );
            add_rates("Off-peak", profile.rate_for(false));
        }
    }
    let current = profile.rate_at(now);
    table.add_row(vec![
        Cell::new(format!("In force at {}", now.format("%H:%M"))).add_attribute(Attribute::Bold),
        right(current.ht).add_attribute(Attribute::Bold),
        right(current.ttc).add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![
        Cell::new("Subscription per month"),
        right(profile.subscription.ht),
        right(profile.subscription.ttc),
    ]);
    table
}
