// SPDX-License-Identifier: MIT
// Copyright (c) 2026 fleet-collector contributors

//! Configuration module for the fleet collector
//!
//! Loads and parses configuration from environment variables.

use std::path::PathBuf;
use std::time::Duration;


/// Default configuration values
pub mod defaults {
    pub const SERVER_ADDR: &str = "0.0.0.0:8080";
    pub const DATA_DIR: &str = "./data";
    pub const SCAN_COMMAND: &str = "iw";
    pub const SCAN_INTERFACE: &str = "wlan0";
    pub const SPEED_CLI: &str = "./librespeed-cli";

    pub const CACHE_TTL_SECS: u64 = 300;
    pub const CACHE_CAPACITY: usize = 100;
    /// Records younger than this count as online.
    pub const ACTIVE_WINDOW_SECS: u64 = 60;
    /// Records older than this are dropped from the registry entirely.
    /// Intentionally distinct from the active window: a client can be
    /// tracked while no longer counted as online.
    pub const EVICTION_WINDOW_SECS: u64 = 20;
    pub const EVICTION_INTERVAL_SECS: u64 = 10;
    pub const SCAN_TIMEOUT_SECS: u64 = 30;
    pub const SPEED_TIMEOUT_SECS: u64 = 120;
}

/// Environment variable names used by the application
pub mod env_vars {
    pub const SERVER_ADDR: &str = "SERVER_ADDR";
    pub const DATA_DIR: &str = "DATA_DIR";
    pub const SCAN_COMMAND: &str = "SCAN_COMMAND";
    pub const SCAN_INTERFACE: &str = "SCAN_INTERFACE";
    pub const SPEED_CLI: &str = "SPEED_CLI";
    pub const SPEED_ENDPOINT: &str = "SPEED_ENDPOINT";
    pub const CACHE_TTL_SECONDS: &str = "CACHE_TTL_SECONDS";
}

/// Application-wide configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub data_dir: PathBuf,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    pub active_window: Duration,
    pub eviction_window: Duration,
    pub eviction_interval: Duration,
    pub scan_command: String,
    pub scan_interface: String,
    pub scan_timeout: Duration,
    pub speed_cli: PathBuf,
    pub speed_endpoint: String,
    pub speed_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_addr: defaults::SERVER_ADDR.to_string(),
            data_dir: PathBuf::from(defaults::DATA_DIR),
            cache_ttl: Duration::from_secs(defaults::CACHE_TTL_SECS),
            cache_capacity: defaults::CACHE_CAPACITY,
            active_window: Duration::from_secs(defaults::ACTIVE_WINDOW_SECS),
            eviction_window: Duration::from_secs(defaults::EVICTION_WINDOW_SECS),
            eviction_interval: Duration::from_secs(defaults::EVICTION_INTERVAL_SECS),
            scan_command: defaults::SCAN_COMMAND.to_string(),
            scan_interface: defaults::SCAN_INTERFACE.to_string(),
            scan_timeout: Duration::from_secs(defaults::SCAN_TIMEOUT_SECS),
            speed_cli: PathBuf::from(defaults::SPEED_CLI),
            speed_endpoint: String::new(),
            speed_timeout: Duration::from_secs(defaults::SPEED_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Config::default();

        if let Ok(addr) = std::env::var(env_vars::SERVER_ADDR) {
            config.server_addr = addr;
        }
        if let Ok(dir) = std::env::var(env_vars::DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(cmd) = std::env::var(env_vars::SCAN_COMMAND) {
            config.scan_command = cmd;
        }
        if let Ok(iface) = std::env::var(env_vars::SCAN_INTERFACE) {
            config.scan_interface = iface;
        }
        if let Ok(cli) = std::env::var(env_vars::SPEED_CLI) {
            config.speed_cli = PathBuf::from(cli);
        }
        if let Ok(endpoint) = std::env::var(env_vars::SPEED_ENDPOINT) {
            config.speed_endpoint = endpoint;
        }
        if let Some(ttl) = env_duration(env_vars::CACHE_TTL_SECONDS) {
            config.cache_ttl = ttl;
        }

        if config.speed_endpoint.is_empty() {
            tracing::warn!(
                "No speed test endpoint configured ({}). Speed sampling will report failures.",
                env_vars::SPEED_ENDPOINT
            );
        }

        config
    }
}

fn env_duration(name: &str) -> Option<Duration> {
    let raw = std::env::var(name).ok()?;
    match raw.parse::<u64>() {
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(e) => {
            tracing::warn!("Ignoring invalid {}={:?}: {}", name, raw, e);
            None
        }
    }
}
