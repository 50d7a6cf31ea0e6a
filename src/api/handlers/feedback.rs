// SPDX-License-Identifier: MIT
// Copyright (c) 2026 fleet-collector contributors

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{ConnectInfo, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::api::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedbackForm {
    #[serde(default)]
    feedback: String,
}

#[derive(Debug, Serialize)]
struct FeedbackResponse {
    status: &'static str,
    message: &'static str,
}

/// POST /feedback
///
/// Appends the submitted text to the feedback log keyed by the submitter's
/// address. Empty content is a client error and leaves the log untouched.
pub async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Form(form): Form<FeedbackForm>,
) -> Response {
    let text = form.feedback.trim();
    if text.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(FeedbackResponse {
                status: "error",
                message: "feedback must not be empty",
            }),
        )
            .into_response();
    }

    match state.storage.append_feedback(&addr.ip().to_string(), text).await {
        Ok(()) => (
            StatusCode::OK,
            Json(FeedbackResponse {
                status: "success",
                message: "feedback recorded",
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to append feedback: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(FeedbackResponse {
                    status: "error",
                    message: "server error",
                }),
            )
                .into_response()
        }
    }
}
