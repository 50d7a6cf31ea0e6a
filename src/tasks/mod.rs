// SPDX-License-Identifier: MIT
// Copyright (c) 2026 fleet-collector contributors

//! Background periodic tasks
//!
//! Three independent loops: registry eviction, hourly occupancy
//! snapshotting and hourly speed sampling. Each task is isolated so a
//! failure in one never stops the others, and each observes the shutdown
//! watch channel.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Timelike};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::api::AppState;
use crate::speed::{SPEED_CHART_KEY, SpeedOutcome};

/// Retry delay after a failed hourly speed sample (5 minutes)
const SPEED_RETRY_DELAY: Duration = Duration::from_secs(300);
/// Backoff after a failed occupancy snapshot before re-anchoring
const SNAPSHOT_RETRY_DELAY: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);

/// Spawns all periodic tasks. Handles are returned for tests; the binary
/// just lets them run until shutdown.
pub fn start_background_tasks(
    shutdown_rx: watch::Receiver<bool>,
    state: Arc<AppState>,
) -> Vec<JoinHandle<()>> {
    vec![
        start_eviction_loop(shutdown_rx.clone(), state.clone()),
        start_occupancy_snapshot_loop(shutdown_rx.clone(), state.clone()),
        start_speed_sampling_loop(shutdown_rx, state),
    ]
}

/// Evicts registry records stale past the eviction window.
fn start_eviction_loop(
    mut shutdown_rx: watch::Receiver<bool>,
    state: Arc<AppState>,
) -> JoinHandle<()> {
    let interval = state.config.eviction_interval;
    let window = state.config.eviction_window;
    tracing::info!(
        "Starting registry eviction loop every {:?} (window {:?})",
        interval,
        window
    );
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so a fresh start does
        // not evict before clients had a chance to report.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = state.registry.evict_stale(window).await;
                    if evicted > 0 {
                        tracing::debug!("Evicted {} stale client(s)", evicted);
                    }
                },
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::debug!("Stopping eviction loop");
                        break;
                    }
                }
            }
        }
    })
}

/// Appends one active-count sample at every top of the hour and
/// invalidates the trend artifacts.
fn start_occupancy_snapshot_loop(
    mut shutdown_rx: watch::Receiver<bool>,
    state: Arc<AppState>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            // Re-anchored to the wall clock on every iteration so a missed
            // or delayed wakeup does not accumulate drift.
            let wait = until_next_hour(Local::now());
            tokio::select! {
                _ = tokio::time::sleep(wait) => {},
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::debug!("Stopping occupancy snapshot loop");
                        break;
                    }
                    // Spurious wakeup; the hour boundary has not passed.
                    continue;
                }
            }

            let count = state
                .registry
                .active_clients(state.config.active_window)
                .await
                .len();
            match state.storage.append_occupancy(count).await {
                Ok(()) => {
                    let removed = state
                        .cache
                        .invalidate_where(|k| k.contains("plot") || k.contains("pie"));
                    tracing::info!(
                        "Occupancy snapshot: {} active client(s), {} trend artifact(s) invalidated",
                        count,
                        removed
                    );
                }
                Err(e) => {
                    tracing::error!("Failed to append occupancy sample: {}", e);
                    tokio::select! {
                        _ = tokio::time::sleep(SNAPSHOT_RETRY_DELAY) => {},
                        _ = shutdown_rx.changed() => {
                            if *shutdown_rx.borrow() {
                                break;
                            }
                        }
                    }
                }
            }
        }
    })
}

/// Runs one fresh speed sample per hour; a failed run is retried after
/// five minutes instead of waiting the full hour.
fn start_speed_sampling_loop(
    mut shutdown_rx: watch::Receiver<bool>,
    state: Arc<AppState>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut delay = HOUR;
        loop {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {},
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::debug!("Stopping speed sampling loop");
                        break;
                    }
                    continue;
                }
            }

            // Force a fresh run; a cached outcome from request traffic
            // would defeat the hourly measurement.
            state.sampler.invalidate_cached();
            match state.sampler.sample().await {
                SpeedOutcome::Sample(sample) => {
                    tracing::info!(
                        "Hourly speed sample: ping {:.1}ms, down {:.2}Mbps, up {:.2}Mbps",
                        sample.ping_ms,
                        sample.download_mbps,
                        sample.upload_mbps
                    );
                    state.cache.invalidate(SPEED_CHART_KEY);
                    delay = HOUR;
                }
                SpeedOutcome::Failed(msg) => {
                    tracing::warn!("Hourly speed sample failed: {}", msg);
                    delay = SPEED_RETRY_DELAY;
                }
            }
        }
    })
}

/// Duration until the next top-of-hour boundary from `now`.
pub fn until_next_hour(now: DateTime<Local>) -> Duration {
    let anchored = (now + chrono::Duration::hours(1))
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0));
    match anchored {
        Some(next) => (next - now).to_std().unwrap_or(HOUR),
        None => HOUR,
    }
}
