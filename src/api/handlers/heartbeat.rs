// SPDX-License-Identifier: MIT
// Copyright (c) 2026 fleet-collector contributors

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Html,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::api::AppState;

/// Query parameters of a heartbeat. Everything is optional and stored
/// verbatim; the reporting clients are not authenticated.
#[derive(Debug, Deserialize)]
pub struct HeartbeatParams {
    ip: Option<String>,
    user: Option<String>,
    pwd: Option<String>,
    pt: Option<String>,
}

/// GET /heartbeat
///
/// Upserts the reporting client's registry record, appends its id to the
/// device log on first contact and invalidates the identity-distribution
/// artifacts. The response echoes the stored identity plus the number of
/// tracked clients reporting the same user, wrapped in `%%` markers for
/// the client-side parser.
pub async fn heartbeat(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HeartbeatParams>,
) -> Html<String> {
    let id = params.ip.unwrap_or_else(|| "unknown".to_string());
    let user = params.user.unwrap_or_default();
    let pwd = params.pwd.unwrap_or_default();
    let platform = params.pt.unwrap_or_default();

    tracing::debug!("Heartbeat from {} (user {:?})", id, user);

    let credential = SecretString::new(pwd.into());
    state
        .registry
        .record_heartbeat(&id, &user, credential.clone(), &platform)
        .await;

    if let Err(e) = state.storage.record_device(&id).await {
        tracing::error!("Failed to record device id {}: {}", id, e);
    }

    // A new heartbeat changes the identity distribution; trend charts over
    // the hourly log are unaffected.
    state
        .cache
        .invalidate_where(|k| k.contains("pie") || k.contains("homepage"));

    let same_user = state.registry.count_user(&user).await;
    Html(format!(
        "<html><head><title>Heartbeat</title></head><body>\
         <h1>Heartbeat Received</h1>\
         <p>ip: {}</p><p>user: {}</p><p>pwd: {}</p>\
         <p>%%{}%%</p></body></html>",
        super::escape_html(&id),
        super::escape_html(&user),
        super::escape_html(credential.expose_secret()),
        same_user
    ))
}
