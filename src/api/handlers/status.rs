// SPDX-License-Identifier: MIT
// Copyright (c) 2026 fleet-collector contributors

use std::sync::Arc;
use std::time::Duration;

use axum::{Json, extract::State};
use serde::Serialize;

use crate::api::AppState;
use crate::speed::SpeedOutcome;
use crate::system;

/// Interval between the two CPU samples for the polled status endpoint.
/// Short on purpose; this endpoint is hit every few seconds by dashboards.
const STATUS_CPU_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub total_devices: usize,
    pub online: usize,
    pub cpu: f64,
    pub mem_used: u64,
    pub mem_total: u64,
    pub ping_ms: Option<f64>,
    pub down_mbps: Option<f64>,
    pub up_mbps: Option<f64>,
    pub users: Vec<ActiveUser>,
}

#[derive(Debug, Serialize)]
pub struct ActiveUser {
    pub ip: String,
    pub pt: String,
}

#[derive(Debug, Serialize)]
pub struct SpeedTestInfo {
    pub status: &'static str,
    pub message: &'static str,
}

/// GET /speedtest_now
///
/// On-demand speed tests are disabled; measurements run on the hourly
/// schedule only. Kept so legacy clients get an explanation instead of a
/// 404.
pub async fn speedtest_now() -> Json<SpeedTestInfo> {
    Json(SpeedTestInfo {
        status: "info",
        message: "manual speed tests are disabled; samples run on the hourly schedule",
    })
}

/// GET /api/status
///
/// Aggregated fleet view for polling consumers. Always well-formed:
/// numbers that could not be computed come back as zero or null, never as
/// an error response.
pub async fn api_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let active = state
        .registry
        .active_clients(state.config.active_window)
        .await;

    let (cpu, mem_used, mem_total) = match system::sample(STATUS_CPU_INTERVAL).await {
        Ok(status) => (
            (status.cpu_percent * 10.0).round() / 10.0,
            status.mem_used_mb,
            status.mem_total_mb,
        ),
        Err(e) => {
            tracing::warn!("Host status unavailable: {}", e);
            (0.0, 0, 0)
        }
    };

    let (ping_ms, down_mbps, up_mbps) = match state.sampler.sample().await {
        SpeedOutcome::Sample(s) => (Some(s.ping_ms), Some(s.download_mbps), Some(s.upload_mbps)),
        SpeedOutcome::Failed(_) => (None, None, None),
    };

    let total_devices = state.storage.total_devices().await.unwrap_or_else(|e| {
        tracing::error!("Failed to read device log: {}", e);
        0
    });

    let mut users: Vec<ActiveUser> = active
        .iter()
        .map(|(ip, snap)| ActiveUser {
            ip: ip.clone(),
            pt: if snap.platform.is_empty() {
                "unknown".to_string()
            } else {
                snap.platform.clone()
            },
        })
        .collect();
    users.sort_by(|a, b| a.ip.cmp(&b.ip));

    Json(StatusResponse {
        total_devices,
        online: active.len(),
        cpu,
        mem_used,
        mem_total,
        ping_ms,
        down_mbps,
        up_mbps,
        users,
    })
}
