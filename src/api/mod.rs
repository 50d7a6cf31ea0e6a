// SPDX-License-Identifier: MIT
// Copyright (c) 2026 fleet-collector contributors

//! HTTP API module for the fleet collector
//!
//! # Endpoints
//! - `GET /heartbeat` — client liveness report (upsert)
//! - `GET /api/status` — aggregated JSON fleet view
//! - `GET /` — HTML dashboard
//! - `GET /clients`, `GET /admin/admin` — active / raw registry listings
//! - `GET /rs` — active client count, plain text
//! - `GET /gg` — static tips
//! - `GET /line_plot.png`, `/user_pie.png`, `/speed_chart.png` — chart artifacts
//! - `GET /speedtest_now` — static notice that speed tests are scheduled-only
//! - `GET /server` — network scan report
//! - `POST /feedback` — free-text feedback log

pub mod handlers;
mod state;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

pub use state::AppState;

/// Creates the main Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/heartbeat", get(handlers::heartbeat))
        .route("/api/status", get(handlers::api_status))
        .route("/clients", get(handlers::client_listing))
        .route("/admin/admin", get(handlers::admin_listing))
        .route("/rs", get(handlers::active_count))
        .route("/gg", get(handlers::tips))
        .route("/line_plot.png", get(handlers::occupancy_chart))
        .route("/user_pie.png", get(handlers::user_pie))
        .route("/speed_chart.png", get(handlers::speed_chart))
        .route("/speedtest_now", get(handlers::speedtest_now))
        .route("/server", get(handlers::scan_report))
        .route("/feedback", post(handlers::submit_feedback))
        .fallback(handlers::not_found)
        .with_state(state)
}
