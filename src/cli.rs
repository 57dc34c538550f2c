use std::path::PathBuf;

use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use reqwest::Url;
use tariffed::{
    api::{home_assistant, json_file::StatisticsFile},
    core::{
        comparison::RankBy,
        granularity::Granularity,
        interval::Interval,
        provider::StatisticsProvider,
    },
    prelude::*,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Energy and cost of an entity group over one or more reporting periods.
    #[clap(name = "metrics")]
    Metrics(Box<MetricsArgs>),

    /// Compare the consumption in an event window against a baseline window.
    #[clap(name = "compare")]
    Compare(Box<CompareArgs>),

    /// Show the resolved tariff profile.
    #[clap(name = "tariff")]
    Tariff(TariffArgs),
}

#[derive(Parser)]
pub struct TariffArgs {
    /// Tariff configuration in TOML. Several spellings of each setting are accepted.
    #[clap(long = "tariff", env = "TARIFF_PATH", default_value = "tariff.toml")]
    pub path: PathBuf,
}

#[derive(Parser)]
pub struct MetricsArgs {
    #[clap(flatten)]
    pub tariff: TariffArgs,

    /// JSON snapshot of the per-period energy totals of each entity.
    #[clap(long = "snapshot", env = "ENERGY_SNAPSHOT_PATH")]
    pub snapshot_path: PathBuf,

    #[clap(
        long = "periods",
        env = "PERIODS",
        value_delimiter = ',',
        num_args = 1..,
        default_value = "daily",
    )]
    pub periods: Vec<Granularity>,

    /// Name under which the group is reported.
    #[clap(long = "group", default_value = "default")]
    pub group_key: String,

    /// Print JSON instead of a table.
    #[clap(long)]
    pub json: bool,

    #[clap(required = true)]
    pub entity_ids: Vec<String>,
}

#[derive(Parser)]
pub struct CompareArgs {
    #[clap(flatten)]
    pub tariff: TariffArgs,

    #[clap(flatten)]
    pub source: StatisticsSourceArgs,

    /// Baseline window start, for example: `2025-03-01T00:00:00+01:00`.
    #[clap(long)]
    pub baseline_start: DateTime<Local>,

    #[clap(long)]
    pub baseline_end: DateTime<Local>,

    #[clap(long)]
    pub event_start: DateTime<Local>,

    #[clap(long)]
    pub event_end: DateTime<Local>,

    #[clap(long, value_enum, default_value = "energy-kwh")]
    pub rank_by: RankBy,

    /// Number of entities to show, between 1 and 50.
    #[clap(long, default_value = "10")]
    pub limit: usize,

    /// Also compare the entities summed up as one consumer.
    #[clap(long)]
    pub group: bool,

    /// Print JSON instead of tables.
    #[clap(long)]
    pub json: bool,

    #[clap(required = true)]
    pub entity_ids: Vec<String>,
}

impl CompareArgs {
    pub fn baseline(&self) -> Result<Interval> {
        window("baseline", self.baseline_start, self.baseline_end)
    }

    pub fn event(&self) -> Result<Interval> {
        window("event", self.event_start, self.event_end)
    }
}

fn window(name: &str, start: DateTime<Local>, end: DateTime<Local>) -> Result<Interval> {
    ensure!(start < end, "the {name} window must start before it ends");
    Ok(Interval::new(start, end))
}

/// Where hourly statistics come from: a JSON export or a live Home Assistant instance.
#[derive(Parser)]
pub struct StatisticsSourceArgs {
    /// JSON export of hourly statistic records.
    #[clap(long = "statistics", env = "STATISTICS_PATH", conflicts_with = "base_url")]
    pub statistics_path: Option<PathBuf>,

    /// Home Assistant API base URL. For example: `http://localhost:8123/api`.
    #[clap(
        long = "home-assistant-api-base-url",
        env = "HOME_ASSISTANT_API_BASE_URL",
        requires = "access_token"
    )]
    pub base_url: Option<Url>,

    /// Home Assistant API access token.
    #[clap(long = "home-assistant-access-token", env = "HOME_ASSISTANT_ACCESS_TOKEN")]
    pub access_token: Option<String>,
}

impl StatisticsSourceArgs {
    pub fn try_new_provider(&self) -> Result<Box<dyn StatisticsProvider>> {
        match (&self.statistics_path, &self.base_url, &self.access_token) {
            (Some(path), _, _) => Ok(Box::new(StatisticsFile::new(path))),
            (None, Some(base_url), Some(access_token)) => {
                Ok(Box::new(home_assistant::Api::try_new(access_token, base_url.clone())?))
            }
            _ => bail!("either `--statistics` or the Home Assistant connection is required"),
        }
    }
}
