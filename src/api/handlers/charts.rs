// SPDX-License-Identifier: MIT
// Copyright (c) 2026 fleet-collector contributors

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::AppState;
use crate::cache::Artifact;
use crate::charts::{self, CHART_CONTENT_TYPE, OCCUPANCY_CHART_KEY, USER_PIE_KEY};
use crate::speed::SPEED_CHART_KEY;

fn artifact_response(artifact: Artifact) -> Response {
    match artifact {
        Artifact::Binary(bytes) => {
            (StatusCode::OK, [("Content-Type", CHART_CONTENT_TYPE)], bytes).into_response()
        }
        // Chart keys only ever hold binary artifacts; anything else means
        // a cache key collision.
        other => {
            tracing::error!("Unexpected artifact type for chart key: {:?}", other);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET /line_plot.png — occupancy trend over the full hourly log
pub async fn occupancy_chart(State(state): State<Arc<AppState>>) -> Response {
    let artifact = state
        .cache
        .get_or_compute(OCCUPANCY_CHART_KEY, || async {
            let samples = state.storage.read_occupancy().await.unwrap_or_else(|e| {
                tracing::error!("Failed to read occupancy log: {}", e);
                Vec::new()
            });
            Artifact::Binary(charts::occupancy_chart(&samples))
        })
        .await;
    artifact_response(artifact)
}

/// GET /user_pie.png — identity distribution over tracked clients
pub async fn user_pie(State(state): State<Arc<AppState>>) -> Response {
    let artifact = state
        .cache
        .get_or_compute(USER_PIE_KEY, || async {
            let counts = state.registry.user_counts().await;
            Artifact::Binary(charts::user_pie(&counts))
        })
        .await;
    artifact_response(artifact)
}

/// GET /speed_chart.png — speed trend over the last 12 hours
pub async fn speed_chart(State(state): State<Arc<AppState>>) -> Response {
    let artifact = state
        .cache
        .get_or_compute(SPEED_CHART_KEY, || async {
            let samples = state
                .storage
                .read_recent_speed(chrono::Duration::hours(12))
                .await
                .unwrap_or_else(|e| {
                    tracing::error!("Failed to read speed log: {}", e);
                    Vec::new()
                });
            Artifact::Binary(charts::speed_chart(&samples))
        })
        .await;
    artifact_response(artifact)
}
