// SPDX-License-Identifier: MIT
// Copyright (c) 2026 fleet-collector contributors

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use fleet_collector::{AppState, Config, create_router};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

/// State with both external tools unavailable and logs in a tempdir.
fn make_state(dir: &TempDir) -> Arc<AppState> {
    let config = Config {
        data_dir: dir.path().to_path_buf(),
        scan_command: "/nonexistent/scan-tool".to_string(),
        speed_cli: dir.path().join("no-such-cli"),
        ..Config::default()
    };
    AppState::from_config(config)
}

async fn body_string(resp: axum::response::Response) -> String {
    String::from_utf8(resp.into_body().collect().await.unwrap().to_bytes().to_vec()).unwrap()
}

fn peer() -> ConnectInfo<SocketAddr> {
    ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000)))
}

// --- /heartbeat ---

#[tokio::test]
async fn heartbeat_registers_client_and_echoes_identity() {
    let dir = TempDir::new().unwrap();
    let state = make_state(&dir);
    let app = create_router(state.clone());

    let resp = app
        .oneshot(
            Request::get("/heartbeat?ip=10.0.0.5&user=alice&pwd=pw&pt=pc")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(body.contains("ip: 10.0.0.5"));
    assert!(body.contains("user: alice"));
    assert!(body.contains("%%1%%"));

    let active = state
        .registry
        .active_clients(state.config.active_window)
        .await;
    assert_eq!(active.len(), 1);
    assert_eq!(active["10.0.0.5"].user, "alice");
    assert_eq!(active["10.0.0.5"].platform, "pc");
}

#[tokio::test]
async fn heartbeat_same_user_count_grows_across_ids() {
    let dir = TempDir::new().unwrap();
    let state = make_state(&dir);

    let resp = create_router(state.clone())
        .oneshot(
            Request::get("/heartbeat?ip=10.0.0.5&user=alice&pwd=pw&pt=pc")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(body_string(resp).await.contains("%%1%%"));

    let resp = create_router(state.clone())
        .oneshot(
            Request::get("/heartbeat?ip=10.0.0.9&user=alice&pwd=pw&pt=phone")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(body_string(resp).await.contains("%%2%%"));
}

#[tokio::test]
async fn heartbeat_appends_device_id_once() {
    let dir = TempDir::new().unwrap();
    let state = make_state(&dir);

    for _ in 0..3 {
        let resp = create_router(state.clone())
            .oneshot(
                Request::get("/heartbeat?ip=10.0.0.5&user=alice&pwd=pw&pt=pc")
                    .body(String::new())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    assert_eq!(state.storage.total_devices().await.unwrap(), 1);
}

// --- /api/status ---

#[tokio::test]
async fn api_status_returns_well_formed_json() {
    let dir = TempDir::new().unwrap();
    let state = make_state(&dir);

    let resp = create_router(state.clone())
        .oneshot(
            Request::get("/heartbeat?ip=10.0.0.5&user=alice&pwd=pw&pt=pc")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = create_router(state)
        .oneshot(Request::get("/api/status").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_string(resp).await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["online"], 1);
    assert_eq!(json["total_devices"], 1);
    // Speed tool is unavailable: fields are null, never omitted.
    assert!(json["ping_ms"].is_null());
    assert!(json["down_mbps"].is_null());
    assert!(json["up_mbps"].is_null());
    assert_eq!(json["users"][0]["ip"], "10.0.0.5");
    assert_eq!(json["users"][0]["pt"], "pc");
}

// --- listings ---

#[tokio::test]
async fn rs_returns_active_count_as_plain_text() {
    let dir = TempDir::new().unwrap();
    let state = make_state(&dir);

    let resp = create_router(state.clone())
        .oneshot(Request::get("/rs").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_string(resp).await, "0");

    state
        .registry
        .record_heartbeat(
            "10.0.0.5",
            "alice",
            secrecy::SecretString::new("pw".into()),
            "pc",
        )
        .await;

    let resp = create_router(state)
        .oneshot(Request::get("/rs").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_string(resp).await, "1");
}

#[tokio::test]
async fn clients_listing_contains_active_ids() {
    let dir = TempDir::new().unwrap();
    let state = make_state(&dir);
    state
        .registry
        .record_heartbeat(
            "10.0.0.5",
            "alice",
            secrecy::SecretString::new("pw".into()),
            "pc",
        )
        .await;

    let resp = create_router(state)
        .oneshot(Request::get("/clients").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(body.contains("<li>10.0.0.5 (seen 0s ago)</li>"), "got: {body}");
}

#[tokio::test]
async fn admin_listing_never_leaks_credentials() {
    let dir = TempDir::new().unwrap();
    let state = make_state(&dir);
    state
        .registry
        .record_heartbeat(
            "10.0.0.5",
            "alice",
            secrecy::SecretString::new("hunter2".into()),
            "pc",
        )
        .await;

    let resp = create_router(state)
        .oneshot(Request::get("/admin/admin").body(String::new()).unwrap())
        .await
        .unwrap();
    let body = body_string(resp).await;
    assert!(body.contains("10.0.0.5"));
    assert!(!body.contains("hunter2"));
}

// --- dashboard ---

#[tokio::test]
async fn dashboard_renders_with_placeholders_when_tools_missing() {
    let dir = TempDir::new().unwrap();
    let state = make_state(&dir);

    let resp = create_router(state)
        .oneshot(Request::get("/").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(body.contains("Fleet Monitor"));
    // Speed values degrade to an explicit placeholder.
    assert!(body.contains("--"));
    assert!(body.contains("/speed_chart.png"));
}

// --- chart artifacts ---

#[tokio::test]
async fn chart_endpoints_return_svg_artifacts() {
    let dir = TempDir::new().unwrap();
    let state = make_state(&dir);

    for path in ["/line_plot.png", "/user_pie.png", "/speed_chart.png"] {
        let resp = create_router(state.clone())
            .oneshot(Request::get(path).body(String::new()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
        let ct = resp
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(ct.contains("image/svg+xml"), "{path}: {ct}");
        let body = body_string(resp).await;
        assert!(body.starts_with("<svg"), "{path}");
    }
}

#[tokio::test]
async fn speedtest_now_reports_scheduled_only() {
    let dir = TempDir::new().unwrap();
    let state = make_state(&dir);

    let resp = create_router(state)
        .oneshot(Request::get("/speedtest_now").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(json["status"], "info");
    assert!(json["message"].as_str().unwrap().contains("hourly"));
}

// --- /server ---

#[tokio::test]
async fn scan_report_degrades_when_tool_missing() {
    let dir = TempDir::new().unwrap();
    let state = make_state(&dir);

    let resp = create_router(state)
        .oneshot(Request::get("/server").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp).await.contains("scan tool unavailable"));
}

// --- /feedback ---

#[tokio::test]
async fn feedback_empty_is_rejected_without_log_write() {
    let dir = TempDir::new().unwrap();
    let state = make_state(&dir);

    let resp = create_router(state)
        .oneshot(
            Request::post("/feedback")
                .header("content-type", "application/x-www-form-urlencoded")
                .extension(peer())
                .body("feedback=+++".to_string())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let feedback_log = dir.path().join("feedback.txt");
    assert!(
        !feedback_log.exists() || std::fs::read_to_string(&feedback_log).unwrap().is_empty()
    );
}

#[tokio::test]
async fn feedback_with_content_is_appended() {
    let dir = TempDir::new().unwrap();
    let state = make_state(&dir);

    let resp = create_router(state)
        .oneshot(
            Request::post("/feedback")
                .header("content-type", "application/x-www-form-urlencoded")
                .extension(peer())
                .body("feedback=scan+page+is+slow".to_string())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let content = std::fs::read_to_string(dir.path().join("feedback.txt")).unwrap();
    assert!(content.contains("scan page is slow"));
    assert!(content.contains("127.0.0.1"));
}

// --- fallback ---

#[tokio::test]
async fn unmatched_path_returns_404() {
    let dir = TempDir::new().unwrap();
    let state = make_state(&dir);

    let resp = create_router(state)
        .oneshot(Request::get("/no/such/path").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_string(resp).await.contains("/no/such/path"));
}
