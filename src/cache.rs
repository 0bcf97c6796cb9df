//! Result cache keyed by evaluation fingerprints.
//!
//! Entries are bounded by count and by age. When full, the entry inserted
//! earliest is evicted (insertion order, not access order). An entry older
//! than the configured age is a miss on its next read and is dropped.
//!
//! Reads and writes are not coordinated across concurrent evaluations: two
//! evaluations racing on the same fingerprint both run the operator and the
//! last write wins.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use serde_json::{json, Map, Value};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub max_entries: usize,
    pub max_age: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 50,
            max_age: Duration::from_secs(1800),
        }
    }
}

/// A settled result. Never mutated; a new write replaces it.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub result: Value,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    fn new(result: Value) -> Self {
        Self {
            result,
            created_at: Utc::now(),
        }
    }

    fn is_expired(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        let max_age = TimeDelta::from_std(max_age).unwrap_or(TimeDelta::MAX);
        now.signed_duration_since(self.created_at) > max_age
    }
}

#[derive(Debug, Default)]
pub struct EvaluatorCache {
    entries: DashMap<String, Arc<CacheEntry>>,
    order: Mutex<VecDeque<String>>,
    config: RwLock<CacheConfig>,
}

impl EvaluatorCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            order: Mutex::new(VecDeque::new()),
            config: RwLock::new(config),
        }
    }

    pub fn config(&self) -> CacheConfig {
        *self.config.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply new limits, evicting the oldest entries if the cache shrank.
    pub fn configure(&self, config: CacheConfig) {
        *self.config.write().unwrap_or_else(|e| e.into_inner()) = config;
        let mut order = self.order();
        self.evict_to(&mut order, config.max_entries);
    }

    pub fn get(&self, fingerprint: &str) -> Option<Value> {
        let entry = self.entries.get(fingerprint).map(|e| Arc::clone(e.value()))?;
        if entry.is_expired(self.config().max_age, Utc::now()) {
            debug!("cache entry expired");
            self.remove(fingerprint);
            return None;
        }
        trace!("cache hit");
        Some(entry.result.clone())
    }

    pub fn set(&self, fingerprint: String, result: Value) {
        let max_entries = self.config().max_entries;
        if max_entries == 0 {
            return;
        }
        let mut order = self.order();
        if self.entries.contains_key(&fingerprint) {
            order.retain(|key| key != &fingerprint);
        }
        self.evict_to(&mut order, max_entries - 1);
        self.entries
            .insert(fingerprint.clone(), Arc::new(CacheEntry::new(result)));
        order.push_back(fingerprint);
    }

    pub fn remove(&self, fingerprint: &str) {
        let mut order = self.order();
        order.retain(|key| key != fingerprint);
        self.entries.remove(fingerprint);
    }

    pub fn clear(&self) {
        let mut order = self.order();
        order.clear();
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, fingerprint: &str) -> bool {
        self.entries.contains_key(fingerprint)
    }

    fn order(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.order.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn evict_to(&self, order: &mut VecDeque<String>, capacity: usize) {
        while order.len() > capacity {
            if let Some(oldest) = order.pop_front() {
                debug!("evicting cache entry");
                self.entries.remove(&oldest);
            }
        }
    }
}

/// Stable cache key for one operator invocation.
///
/// serde_json objects keep keys sorted, so the serialization is canonical.
pub fn fingerprint(
    operator: &str,
    properties: &Map<String, Value>,
    data: &Map<String, Value>,
    environment: &Value,
) -> String {
    json!({
        "operator": operator,
        "properties": properties,
        "data": data,
        "environment": environment,
    })
    .to_string()
}
