// SPDX-License-Identifier: MIT
// Copyright (c) 2026 fleet-collector contributors

//! Application state shared across HTTP handlers and background tasks

use std::sync::Arc;

use crate::cache::ResponseCache;
use crate::config::Config;
use crate::registry::ClientRegistry;
use crate::scan::{ScanCoordinator, ScanOptions};
use crate::speed::SpeedSampler;
use crate::storage::Storage;

/// Shared application state. All mutable pieces are explicitly owned here
/// and injected into the router and tasks at construction time.
pub struct AppState {
    pub config: Config,
    pub registry: ClientRegistry,
    pub cache: Arc<ResponseCache>,
    pub scanner: ScanCoordinator,
    pub sampler: SpeedSampler,
    pub storage: Arc<Storage>,
}

impl AppState {
    /// Wires registry, cache, storage and the external-tool coordinators
    /// from one configuration. Tool availability is probed here, once.
    pub fn from_config(config: Config) -> Arc<Self> {
        let cache = Arc::new(ResponseCache::new(config.cache_capacity, config.cache_ttl));
        let storage = Arc::new(Storage::new(&config.data_dir));
        let scanner = ScanCoordinator::new(cache.clone(), ScanOptions::from_config(&config));
        let sampler = SpeedSampler::new(cache.clone(), storage.clone(), &config);
        Arc::new(Self {
            config,
            registry: ClientRegistry::new(),
            cache,
            scanner,
            sampler,
            storage,
        })
    }
}
