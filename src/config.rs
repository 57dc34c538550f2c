//! Tariff configuration ingestion.
//!
//! Configuration snapshots come with several spellings for the same setting. They are resolved
//! here, once, into a canonical [`TariffProfile`]: the rest of the crate never sees an alias.

use std::path::Path;

use chrono::NaiveTime;
use toml::{Table, Value};

use crate::{
    core::tariff::{Contract, FeePair, PeakWindow, RatePair, SubRates, TariffProfile},
    prelude::*,
    quantity::{cost::Cost, rate::KilowattHourRate},
};

const CONTRACT_TYPE: &[&str] = &["contract_type", "type_contrat", "contract", "mode"];
const RATE_HT: &[&str] = &["rate_ht", "prix_kwh_ht", "price_ht", "prix_base_ht"];
const RATE_TTC: &[&str] = &["rate_ttc", "prix_kwh_ttc", "price_ttc", "prix_base_ttc"];
const PEAK_RATE_HT: &[&str] = &["peak_rate_ht", "prix_hp_ht", "hp_price_ht"];
const PEAK_RATE_TTC: &[&str] = &["peak_rate_ttc", "prix_hp_ttc", "hp_price_ttc"];
const OFF_PEAK_RATE_HT: &[&str] =
    &["offpeak_rate_ht", "off_peak_rate_ht", "prix_hc_ht", "hc_price_ht"];
const OFF_PEAK_RATE_TTC: &[&str] =
    &["offpeak_rate_ttc", "off_peak_rate_ttc", "prix_hc_ttc", "hc_price_ttc"];
const PEAK_START: &[&str] = &["peak_start", "hp_start", "heure_debut_hp"];
const PEAK_END: &[&str] = &["peak_end", "hp_end", "heure_fin_hp"];
const SUBSCRIPTION_HT: &[&str] = &["subscription_fee_ht", "subscription_ht", "abonnement_ht"];
const SUBSCRIPTION_TTC: &[&str] = &["subscription_fee_ttc", "subscription_ttc", "abonnement_ttc"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("malformed time `{value}` for `{key}`, expected `HH:MM` or `HH:MM:SS`")]
    MalformedTime { key: &'static str, value: String },

    #[error("malformed number `{value}` for `{key}`")]
    MalformedNumber { key: &'static str, value: String },

    #[error("a peak/off-peak contract needs both `peak_start` and `peak_end`")]
    MissingPeakWindow,

    #[error("invalid tariff configuration document")]
    Syntax(#[from] toml::de::Error),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum ContractKind {
    Flat,
    PeakOffPeak,
}

impl ContractKind {
    /// Unknown values fall back to flat pricing: a bad setting must not break reads.
    fn normalize(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Flat;
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "flat" | "base" | "fixe" | "fixed" => Self::Flat,
            "peak_offpeak" | "peak_off_peak" | "peak-offpeak" | "hp_hc" | "hphc" | "hp/hc" => {
                Self::PeakOffPeak
            }
            _ => {
                warn!(contract_type = raw, "unknown contract type, falling back to flat pricing");
                Self::Flat
            }
        }
    }
}

#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_tariff(path: &Path) -> Result<TariffProfile> {
    let text = std::fs::read_to_string(path).context("failed to read the tariff configuration")?;
    let profile = parse_tariff(&text)?;
    info!(?profile.contract, "loaded the tariff");
    Ok(profile)
}

pub fn parse_tariff(text: &str) -> Result<TariffProfile, ConfigurationError> {
    tariff_from_table(&toml::from_str::<Table>(text)?)
}

pub fn tariff_from_table(table: &Table) -> Result<TariffProfile, ConfigurationError> {
    let base = RatePair {
        ht: rate(table, RATE_HT)?.unwrap_or_default(),
        ttc: rate(table, RATE_TTC)?.unwrap_or_default(),
    };
    let subscription = FeePair {
        ht: Cost::from(number(table, SUBSCRIPTION_HT)?.unwrap_or_default()),
        ttc: Cost::from(number(table, SUBSCRIPTION_TTC)?.unwrap_or_default()),
    };
    let contract_type = lookup(table, CONTRACT_TYPE).and_then(Value::as_str);
    let contract = match ContractKind::normalize(contract_type) {
        ContractKind::Flat => Contract::Flat,
        ContractKind::PeakOffPeak => {
            let (Some(start), Some(end)) = (time(table, PEAK_START)?, time(table, PEAK_END)?)
            else {
                return Err(ConfigurationError::MissingPeakWindow);
            };
            Contract::PeakOffPeak {
                window: PeakWindow { start, end },
                peak: SubRates { ht: rate(table, PEAK_RATE_HT)?, ttc: rate(table, PEAK_RATE_TTC)? },
                off_peak: SubRates {
                    ht: rate(table, OFF_PEAK_RATE_HT)?,
                    ttc: rate(table, OFF_PEAK_RATE_TTC)?,
                },
            }
        }
    };
    Ok(TariffProfile::builder().contract(contract).base(base).subscription(subscription).build())
}

/// First set value among the aliases, skipping empty strings and zeros.
fn lookup<'a>(table: &'a Table, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().filter_map(|alias| table.get(*alias)).find(|value| is_set(value))
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::String(text) => !text.trim().is_empty(),
        Value::Integer(integer) => *integer != 0,
        Value::Float(float) => float.abs() > f64::EPSILON,
        Value::Boolean(flag) => *flag,
        Value::Array(array) => !array.is_empty(),
        Value::Table(table) => !table.is_empty(),
        Value::Datetime(_) => true,
    }
}

#[expect(clippy::cast_precision_loss)]
fn number(
    table: &Table,
    aliases: &'static [&'static str],
) -> Result<Option<f64>, ConfigurationError> {
    let Some(value) = lookup(table, aliases) else {
        return Ok(None);
    };
    match value {
        Value::Float(float) => Ok(Some(*float)),
        Value::Integer(integer) => Ok(Some(*integer as f64)),
        Value::String(text) => text.trim().replace(',', ".").parse().map(Some).map_err(|_| {
            ConfigurationError::MalformedNumber { key: aliases[0], value: text.clone() }
        }),
        other => {
            Err(ConfigurationError::MalformedNumber { key: aliases[0], value: other.to_string() })
        }
    }
}

fn rate(
    table: &Table,
    aliases: &'static [&'static str],
) -> Result<Option<KilowattHourRate>, ConfigurationError> {
    Ok(number(table, aliases)?.map(KilowattHourRate::from))
}

fn time(
    table: &Table,
    aliases: &'static [&'static str],
) -> Result<Option<NaiveTime>, ConfigurationError> {
    let Some(value) = lookup(table, aliases) else {
        return Ok(None);
    };
    let parsed = match value {
        Value::String(text) => parse_time(text.trim()),
        Value::Datetime(datetime) if datetime.date.is_none() => parse_time(&datetime.to_string()),
        _ => None,
    };
    parsed.map(Some).ok_or_else(|| ConfigurationError::MalformedTime {
        key: aliases[0],
        value: value.to_string(),
    })
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    ["%H:%M:%S", "%H:%M:%S%.f", "%H:%M"]
        .into_iter()
        .find_map(|format| NaiveTime::parse_from_str(text, format).ok())
}
