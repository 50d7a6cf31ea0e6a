// SPDX-License-Identifier: MIT
// Copyright (c) 2026 fleet-collector contributors

//! Short-TTL cache for derived artifacts
//!
//! Shields expensive or external-tool-backed computations (scan reports,
//! speed samples, chart artifacts) from request-rate bursts. Capacity
//! bounded with LRU eviction; entries also expire after a fixed TTL or can
//! be invalidated early by write-side events.
//!
//! Error results are stored and served exactly like successes until TTL
//! expiry or explicit invalidation, which bounds the retry rate against
//! failing external tools.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::speed::SpeedOutcome;

/// Opaque derived payload held by the cache
#[derive(Debug, Clone)]
pub enum Artifact {
    Text(String),
    Binary(Vec<u8>),
    Speed(SpeedOutcome),
}

struct CacheEntry {
    value: Artifact,
    inserted: Instant,
    last_used: Instant,
}

impl CacheEntry {
    fn new(value: Artifact) -> Self {
        let now = Instant::now();
        Self {
            value,
            inserted: now,
            last_used: now,
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.inserted.elapsed() > ttl
    }
}

/// Capacity-bounded, time-to-live keyed cache of derived artifacts
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    capacity: usize,
    ttl: Duration,
}

impl ResponseCache {
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    /// Returns the cached artifact, or `None` if never set or past TTL.
    pub fn get(&self, key: &str) -> Option<Artifact> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get_mut(key) {
            Some(entry) if entry.is_expired(self.ttl) => {
                entries.remove(key);
                None
            }
            Some(entry) => {
                entry.last_used = Instant::now();
                Some(entry.value.clone())
            }
            None => None,
        }
    }

    /// Stores an artifact, evicting the least-recently-used entry when at
    /// capacity.
    pub fn put(&self, key: &str, value: Artifact) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if !entries.contains_key(key) && entries.len() >= self.capacity {
            let lru = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(k, _)| k.clone());
            if let Some(lru_key) = lru {
                tracing::debug!("Cache at capacity, evicting LRU entry {}", lru_key);
                entries.remove(&lru_key);
            }
        }
        entries.insert(key.to_string(), CacheEntry::new(value));
    }

    /// Removes one entry immediately, bypassing TTL.
    pub fn invalidate(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
    }

    /// Removes every entry whose key matches the predicate.
    pub fn invalidate_where<F>(&self, pred: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|key, _| !pred(key));
        before - entries.len()
    }

    /// Returns the cached artifact if present and fresh, otherwise runs the
    /// producer and stores its result (success or error marker alike).
    ///
    /// The producer runs outside the cache lock; concurrent misses on the
    /// same key may race and the last write wins. Callers needing
    /// single-flight semantics (the scan coordinator) hold their own lock
    /// around this.
    pub async fn get_or_compute<F, Fut>(&self, key: &str, producer: F) -> Artifact
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Artifact>,
    {
        if let Some(value) = self.get(key) {
            tracing::trace!("Cache hit for {}", key);
            return value;
        }
        tracing::debug!("Cache miss for {}, computing", key);
        let value = producer().await;
        self.put(key, value.clone());
        value
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
