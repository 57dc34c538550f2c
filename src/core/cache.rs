//! In-memory memo of computed period metrics.
//!
//! Entries expire lazily: an entry older than its period's TTL is dropped the next time
//! it is looked up. There is no background sweep.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, Local};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    core::{clock::Clock, granularity::Granularity, metrics::PeriodMetrics, tariff::TariffProfile},
    prelude::*,
};

/// Stable hash of a canonicalized metrics request.
#[derive(Clone, Debug, Eq, Hash, PartialEq, derive_more::Display)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Entities are sorted and the tariff profile is rendered with sorted keys, so logically
    /// identical requests map to the same key regardless of the caller's ordering.
    pub fn of<S: AsRef<str>>(
        entity_ids: &[S],
        period: Granularity,
        profile: &TariffProfile,
    ) -> Self {
        let entities = entity_ids.iter().map(AsRef::as_ref).sorted_unstable().collect_vec();
        let payload = serde_json::json!({
            "entities": entities,
            "period": period,
            "tariff_profile": profile.canonical(),
        });
        Self(format!("{:x}", md5::compute(payload.to_string())))
    }
}

/// What gets memoized for a fingerprint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CachedMetrics {
    pub group_key: String,
    pub entity_ids: Vec<String>,
    pub metrics: PeriodMetrics,
}

struct CacheEntry {
    payload: CachedMetrics,

    /// JSON rendering of the payload, for entity matching and size estimates.
    serialized: String,

    cached_at: DateTime<Local>,
    granularity: Granularity,
}

impl CacheEntry {
    fn age_seconds(&self, now: DateTime<Local>) -> u64 {
        u64::try_from((now - self.cached_at).num_seconds()).unwrap_or(0)
    }

    fn is_expired(&self, now: DateTime<Local>) -> bool {
        self.age_seconds(now) >= self.granularity.cache_ttl().as_secs()
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[must_use]
pub struct CacheStats {
    pub total_entries: usize,

    /// Younger than a minute.
    pub fresh_entries: usize,

    /// Between one and five minutes old.
    pub recent_entries: usize,

    /// Older than five minutes.
    pub old_entries: usize,

    /// Rough footprint of the stored payloads and keys.
    pub approximate_size_bytes: usize,
}

pub struct CacheStore {
    entries: Mutex<HashMap<Fingerprint, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { entries: Mutex::default(), clock }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<Fingerprint, CacheEntry>> {
        // Entries are plain values, a panic elsewhere cannot leave one half-written.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fresh metrics for the key, marked as coming from the cache.
    pub fn get(&self, key: &Fingerprint) -> Option<PeriodMetrics> {
        let now = self.clock.now();
        let mut entries = self.entries();
        let entry = entries.get(key)?;
        if entry.is_expired(now) {
            debug!(%key, granularity = %entry.granularity, "expired");
            entries.remove(key);
            return None;
        }
        let mut metrics = entry.payload.metrics;
        metrics.from_cache = true;
        metrics.cached_age_s = entry.age_seconds(now);
        Some(metrics)
    }

    /// Store the payload, replacing any previous entry for the key.
    pub fn set(&self, key: Fingerprint, granularity: Granularity, payload: CachedMetrics) {
        let serialized = serde_json::to_string(&payload).unwrap_or_default();
        let entry = CacheEntry { payload, serialized, cached_at: self.clock.now(), granularity };
        self.entries().insert(key, entry);
    }

    /// Drop everything and tell how many entries were removed.
    pub fn invalidate_all(&self) -> usize {
        let mut entries = self.entries();
        let n_removed = entries.len();
        entries.clear();
        info!(n_removed, "invalidated the cache");
        n_removed
    }

    /// Drop the entries whose payload mentions the entity.
    ///
    /// Matching is textual over the serialized payload. Entries do not carry an entity index,
    /// so an id that only contributed to the fingerprint is not found.
    pub fn invalidate_entity(&self, entity_id: &str) -> usize {
        let needle = serde_json::Value::from(entity_id).to_string();
        let mut entries = self.entries();
        let n_before = entries.len();
        entries.retain(|_, entry| !entry.serialized.contains(&needle));
        let n_removed = n_before - entries.len();
        info!(entity_id, n_removed, "invalidated the entity");
        n_removed
    }

    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let entries = self.entries();
        let mut stats = CacheStats { total_entries: entries.len(), ..CacheStats::default() };
        for (key, entry) in entries.iter() {
            match entry.age_seconds(now) {
                0..60 => stats.fresh_entries += 1,
                60..=300 => stats.recent_entries += 1,
                _ => stats.old_entries += 1,
            }
            stats.approximate_size_bytes += key.0.len() + entry.serialized.len();
        }
        stats
    }
}
