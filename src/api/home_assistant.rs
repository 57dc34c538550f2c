use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta};
use itertools::Itertools;
use reqwest::{
    Client,
    Url,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::Deserialize;
use serde_with::serde_as;

use crate::{
    core::{
        interval::Interval,
        provider::{Fetched, StatisticsProvider, StatisticsSeries},
        series::EnergySample,
    },
    prelude::*,
    quantity::energy::KilowattHours,
};

/// Home Assistant REST client, used as a source of cumulative energy counters.
pub struct Api {
    client: Client,
    base_url: Url,
}

impl Api {
    #[instrument(skip_all, fields(base_url = %base_url))]
    pub fn try_new(access_token: &str, base_url: Url) -> Result<Self> {
        let mut authorization = HeaderValue::from_str(&format!("Bearer {access_token}"))?;
        authorization.set_sensitive(true);
        let client = Client::builder()
            .default_headers(HeaderMap::from_iter([(AUTHORIZATION, authorization)]))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client, base_url })
    }

    #[instrument(skip_all, fields(n_entities = entity_ids.len(), period = ?period))]
    pub async fn get_history(
        &self,
        entity_ids: &[String],
        period: Interval,
    ) -> Result<EntitiesHistory> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("invalid base URL"))?
            .push("history")
            .push("period")
            .push(&period.start.to_rfc3339());
        url.query_pairs_mut()
            .append_pair("filter_entity_id", &entity_ids.join(","))
            .append_pair("end_time", &period.end.to_rfc3339())
            .append_pair("no_attributes", "true");
        let history: EntitiesHistory = self
            .client
            .get(url)
            .send()
            .await
            .context("failed to request the entity history")?
            .error_for_status()?
            .json()
            .await
            .context("failed to deserialize the entity history")?;
        info!(n_entities = history.0.len(), "fetched");
        Ok(history)
    }
}

#[async_trait]
impl StatisticsProvider for Api {
    async fn get_statistics(
        &self,
        statistic_ids: &[String],
        period: Interval,
    ) -> Result<Fetched<StatisticsSeries>> {
        let history = self.get_history(statistic_ids, period).await?;
        let series: StatisticsSeries = history
            .into_iter()
            .filter_map(|entity_history| {
                let entity_id = entity_history.0.first()?.entity_id.clone();
                Some((entity_id, resample_hourly(&entity_history.0, period)))
            })
            .collect();
        Ok(if series.is_empty() { Fetched::Unavailable } else { Fetched::Available(series) })
    }
}

#[must_use]
#[derive(Deserialize, derive_more::IntoIterator)]
pub struct EntitiesHistory(pub Vec<EntityHistory>);

#[must_use]
#[serde_as]
#[derive(Deserialize)]
pub struct EntityHistory(#[serde_as(as = "serde_with::VecSkipError<_>")] pub Vec<State>);

#[must_use]
#[serde_as]
#[derive(Clone, Deserialize)]
pub struct State {
    pub entity_id: String,

    #[serde(rename = "last_changed")]
    pub last_changed_at: DateTime<Local>,

    #[serde_as(as = "serde_with::DisplayFromStr")]
    #[serde(rename = "state")]
    pub value: f64,
}

/// Turn raw state changes into hourly cumulative samples.
///
/// Each hour of the period takes the last reading that changed within it. Hours without
/// any change get no reading.
pub fn resample_hourly(states: &[State], period: Interval) -> Vec<EnergySample> {
    let mut last_readings: HashMap<DateTime<Local>, (DateTime<Local>, f64)> = HashMap::new();
    let hours = hours_of(period).collect_vec();
    for state in states {
        let Some(hour) = hours.iter().find(|hour| hour.contains(state.last_changed_at)) else {
            continue;
        };
        let reading = (state.last_changed_at, state.value);
        last_readings
            .entry(hour.start)
            .and_modify(|last| {
                if reading.0 >= last.0 {
                    *last = reading;
                }
            })
            .or_insert(reading);
    }
    hours
        .into_iter()
        .map(|interval| EnergySample {
            interval,
            cumulative: last_readings
                .get(&interval.start)
                .map(|(_, value)| KilowattHours::from(*value)),
        })
        .collect()
}

/// Consecutive hours starting at the period start, the last one possibly cut short.
fn hours_of(period: Interval) -> impl Iterator<Item = Interval> {
    std::iter::successors(Some(period.start), |start| Some(*start + TimeDelta::hours(1)))
        .take_while(move |start| *start < period.end)
        .map(move |start| Interval::new(start, (start + TimeDelta::hours(1)).min(period.end)))
}
