// SPDX-License-Identifier: MIT
// Copyright (c) 2026 fleet-collector contributors

//! In-memory registry of reporting clients
//!
//! Single source of truth for "who is online". Records are created and
//! overwritten by heartbeats, read through point-in-time snapshots, and
//! removed only by the background eviction task once stale.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use secrecy::SecretString;
use tokio::sync::RwLock;

/// One tracked client, keyed by its reported network address.
///
/// All identity fields are stored verbatim as the client reported them.
/// The credential is wrapped in [`SecretString`] so raw values never reach
/// logs or the admin listing.
#[derive(Debug, Clone)]
pub struct ClientRecord {
    pub last_seen: Instant,
    pub user: String,
    pub credential: SecretString,
    pub platform: String,
}

/// Point-in-time copy of a record handed out to readers.
///
/// Carries the record age at snapshot time so listings can render it
/// without re-reading the registry.
#[derive(Debug, Clone)]
pub struct ClientSnapshot {
    pub user: String,
    pub platform: String,
    pub age: Duration,
}

/// Mapping from client id to last-seen record
#[derive(Clone, Default)]
pub struct ClientRegistry {
    clients: Arc<RwLock<HashMap<String, ClientRecord>>>,
}

impl ClientRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert from a heartbeat. Always succeeds; any prior fields for the
    /// id are overwritten (last write wins).
    pub async fn record_heartbeat(
        &self,
        id: &str,
        user: &str,
        credential: SecretString,
        platform: &str,
    ) {
        let mut clients = self.clients.write().await;
        clients.insert(
            id.to_string(),
            ClientRecord {
                last_seen: Instant::now(),
                user: user.to_string(),
                credential,
                platform: platform.to_string(),
            },
        );
    }

    /// Snapshot of every record seen within `active_window`.
    pub async fn active_clients(
        &self,
        active_window: Duration,
    ) -> HashMap<String, ClientSnapshot> {
        let now = Instant::now();
        let clients = self.clients.read().await;
        clients
            .iter()
            .filter_map(|(id, record)| {
                let age = now.duration_since(record.last_seen);
                (age < active_window).then(|| {
                    (
                        id.clone(),
                        ClientSnapshot {
                            user: record.user.clone(),
                            platform: record.platform.clone(),
                            age,
                        },
                    )
                })
            })
            .collect()
    }

    /// Removes every record stale past `inactivity_window`, returning the
    /// number evicted. Invoked only by the background eviction task.
    pub async fn evict_stale(&self, inactivity_window: Duration) -> usize {
        let now = Instant::now();
        let mut clients = self.clients.write().await;
        let before = clients.len();
        clients.retain(|_, record| now.duration_since(record.last_seen) <= inactivity_window);
        before - clients.len()
    }

    /// Number of tracked records (active or not) reporting the given user.
    pub async fn count_user(&self, user: &str) -> usize {
        let clients = self.clients.read().await;
        clients.values().filter(|r| r.user == user).count()
    }

    /// Per-user occurrence counts over all tracked records, skipping
    /// records with an empty user field.
    pub async fn user_counts(&self) -> std::collections::BTreeMap<String, usize> {
        let clients = self.clients.read().await;
        let mut counts = std::collections::BTreeMap::new();
        for record in clients.values() {
            if !record.user.is_empty() {
                *counts.entry(record.user.clone()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Raw dump of the registry for the admin listing. Credentials stay
    /// redacted through `SecretString`'s Debug impl.
    pub async fn all_clients(&self) -> Vec<(String, ClientRecord)> {
        let clients = self.clients.read().await;
        clients
            .iter()
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }
}
