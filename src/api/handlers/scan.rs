// SPDX-License-Identifier: MIT
// Copyright (c) 2026 fleet-collector contributors

use std::sync::Arc;

use axum::{extract::State, response::Html};

use crate::api::AppState;

use super::escape_html;

/// GET /server
///
/// Text rendering of the scan coordinator's latest report. The report is
/// plain text (table, failure message or timeout notice); it is escaped
/// here and newlines become line breaks.
pub async fn scan_report(State(state): State<Arc<AppState>>) -> Html<String> {
    let report = state.scanner.scan().await;
    Html(escape_html(&report).replace('\n', "<br>\n"))
}
