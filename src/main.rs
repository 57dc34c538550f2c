#![allow(clippy::doc_markdown)]
#![doc = include_str!("../README.md")]

mod cli;
mod tables;

use std::sync::Arc;

use clap::{Parser, crate_version};
use tariffed::{
    api::json_file::SnapshotFile,
    config::read_tariff,
    core::{
        cache::CacheStore,
        clock::{Clock, SystemClock},
        comparison::{ComparisonAnalyzer, compute_top_entities},
        engine::CalculationEngine,
    },
    prelude::*,
};

use crate::{
    cli::{Args, Command, CompareArgs, MetricsArgs},
    tables::{
        build_cache_stats_table,
        build_comparison_table,
        build_group_table,
        build_metrics_table,
        build_tariff_table,
    },
};

#[tokio::main]
async fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().with_writer(std::io::stderr).init();
    info!(version = crate_version!(), "starting…");

    match Args::parse().command {
        Command::Metrics(args) => metrics(&args).await?,
        Command::Compare(args) => compare(&args).await?,
        Command::Tariff(args) => {
            let profile = read_tariff(&args.path)?;
            println!("{}", build_tariff_table(&profile, SystemClock.now()));
        }
    }

    info!("done!");
    Ok(())
}

async fn metrics(args: &MetricsArgs) -> Result {
    let profile = read_tariff(&args.tariff.path)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache = Arc::new(CacheStore::new(clock.clone()));
    let engine = CalculationEngine::new(SnapshotFile::new(&args.snapshot_path), cache, clock);

    let mut rows = Vec::with_capacity(args.periods.len());
    for period in &args.periods {
        let metrics =
            engine.get_group_metrics(&args.group_key, *period, &profile, &args.entity_ids).await;
        rows.push((*period, metrics));
    }

    if args.json {
        let report = rows
            .iter()
            .map(|(period, metrics)| serde_json::json!({ "period": period, "metrics": metrics }))
            .collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", build_metrics_table(&args.group_key, &rows));
        println!("{}", build_cache_stats_table(engine.cache_stats()));
    }
    Ok(())
}

async fn compare(args: &CompareArgs) -> Result {
    let profile = read_tariff(&args.tariff.path)?;
    let (baseline, event) = (args.baseline()?, args.event()?);
    let analyzer = ComparisonAnalyzer::new(args.source.try_new_provider()?, Arc::new(SystemClock));

    let comparisons = analyzer.compare_entities(&args.entity_ids, baseline, event, &profile).await;
    let top_entities = compute_top_entities(comparisons, args.rank_by, args.limit);
    let group = if args.group {
        Some(analyzer.compare_group(&args.entity_ids, baseline, event, &profile).await)
    } else {
        None
    };

    if args.json {
        let report = serde_json::json!({ "top_entities": top_entities, "group": group });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", build_comparison_table(&top_entities));
        if let Some(group) = &group {
            println!("{}", build_group_table(group));
        }
    }
    Ok(())
}
