// SPDX-License-Identifier: MIT
// Copyright (c) 2026 fleet-collector contributors

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::Html,
};

use crate::api::AppState;
use crate::speed::SpeedOutcome;
use crate::system;

use super::escape_html;

/// GET /
///
/// Aggregated HTML dashboard. Sources every number from the same registry,
/// cache and storage reads as `/api/status`; values that could not be
/// computed render as an explicit `--` placeholder.
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let active = state
        .registry
        .active_clients(state.config.active_window)
        .await;
    let total_devices = state.storage.total_devices().await.unwrap_or(0);

    let resources = match system::sample(Duration::from_millis(100)).await {
        Ok(status) => format!(
            "CPU: {:.1}%<br>Mem: {}/{}MB",
            status.cpu_percent, status.mem_used_mb, status.mem_total_mb
        ),
        Err(_) => "CPU: --<br>Mem: --".to_string(),
    };

    let (ping, down, up) = match state.sampler.sample().await {
        SpeedOutcome::Sample(s) => (
            format!("{:.1}ms", s.ping_ms),
            format!("{:.1}", s.download_mbps),
            format!("{:.1}", s.upload_mbps),
        ),
        SpeedOutcome::Failed(_) => ("--".to_string(), "--".to_string(), "--".to_string()),
    };

    let mut user_cards = String::new();
    let mut ids: Vec<&String> = active.keys().collect();
    ids.sort();
    for id in ids {
        let platform = match active[id].platform.as_str() {
            "" => "unknown",
            p => p,
        };
        user_cards.push_str(&format!(
            r#"<div class="user-card"><div class="user-ip">{}</div><span class="user-status">{}</span></div>"#,
            escape_html(id),
            escape_html(platform)
        ));
    }

    let stat_card = |value: &str, label: &str, id: &str| {
        format!(
            r#"<div class="stat-card"><div class="stat-number" id="{id}">{value}</div><div class="stat-label">{label}</div></div>"#
        )
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Fleet Monitor</title>
<style>
body{{font-family:sans-serif;background:#203a43;color:#e0f7fa;padding:20px}}
.stats{{display:flex;flex-wrap:wrap;gap:16px;margin-bottom:24px}}
.stat-card{{background:rgba(255,255,255,.1);padding:20px;border-radius:10px;min-width:160px;text-align:center}}
.stat-number{{font-size:2em;font-weight:700;color:#4fc3f7}}
.stat-label{{color:#b3e5fc}}
.users{{display:grid;grid-template-columns:repeat(auto-fill,minmax(220px,1fr));gap:12px;margin-bottom:24px}}
.user-card{{background:rgba(255,255,255,.08);border-left:4px solid #4fc3f7;border-radius:8px;padding:12px}}
.charts img{{max-width:100%;background:#fff;border-radius:8px;margin-bottom:16px}}
textarea{{width:100%;min-height:100px}}
</style>
</head>
<body>
<h1>Fleet Monitor</h1>
<div class="stats" id="stats">
{total_card}{online_card}{resource_card}{ping_card}{down_card}{up_card}
</div>
<h2>Active clients</h2>
<div class="users" id="users">{user_cards}</div>
<div class="charts">
<h2>Trends</h2>
<img src="/line_plot.png" alt="occupancy trend">
<img src="/user_pie.png" alt="user share">
<img src="/speed_chart.png" alt="speed trend">
</div>
<h2>Feedback</h2>
<form action="/feedback" method="post">
<textarea name="feedback" placeholder="Suggestions or problems..."></textarea>
<button type="submit">Submit</button>
</form>
<script>
setInterval(async () => {{
  try {{
    const d = await (await fetch('/api/status')).json();
    document.getElementById('total-devices').textContent = d.total_devices;
    document.getElementById('online-count').textContent = d.online;
    document.getElementById('cpu-mem').innerHTML = `CPU: ${{d.cpu}}%<br>Mem: ${{d.mem_used}}/${{d.mem_total}}MB`;
    document.getElementById('ping-ms').textContent = d.ping_ms == null ? '--' : d.ping_ms.toFixed(1) + 'ms';
    document.getElementById('down-mbps').textContent = d.down_mbps == null ? '--' : d.down_mbps.toFixed(1);
    document.getElementById('up-mbps').textContent = d.up_mbps == null ? '--' : d.up_mbps.toFixed(1);
  }} catch (e) {{}}
}}, 5000);
</script>
</body>
</html>"#,
        total_card = stat_card(&total_devices.to_string(), "Devices ever seen", "total-devices"),
        online_card = stat_card(&active.len().to_string(), "Online now", "online-count"),
        resource_card = stat_card(&resources, "Host resources", "cpu-mem"),
        ping_card = stat_card(&ping, "Latency", "ping-ms"),
        down_card = stat_card(&down, "Download (Mbps)", "down-mbps"),
        up_card = stat_card(&up, "Upload (Mbps)", "up-mbps"),
    );
    Html(html)
}

/// GET /clients — plain listing of active client ids
pub async fn client_listing(State(state): State<Arc<AppState>>) -> Html<String> {
    let active = state
        .registry
        .active_clients(state.config.active_window)
        .await;
    let mut entries: Vec<(&String, &crate::registry::ClientSnapshot)> = active.iter().collect();
    entries.sort_by_key(|(id, _)| *id);
    let items: String = entries
        .iter()
        .map(|(id, snap)| {
            format!(
                "<li>{} (seen {}s ago)</li>",
                escape_html(id),
                snap.age.as_secs()
            )
        })
        .collect();
    Html(format!(
        "<html><head><title>Active clients</title></head>\
         <body><h1>Active clients</h1><ul>{items}</ul></body></html>"
    ))
}

/// GET /admin/admin — raw registry dump. Records are rendered via Debug,
/// which keeps credentials redacted.
pub async fn admin_listing(State(state): State<Arc<AppState>>) -> Html<String> {
    let mut clients = state.registry.all_clients().await;
    clients.sort_by(|a, b| a.0.cmp(&b.0));
    let items: String = clients
        .iter()
        .map(|(id, record)| format!("<ul>{}: {}</ul>", escape_html(id), escape_html(&format!("{record:?}"))))
        .collect();
    Html(format!(
        "<html><head><title>Registry (admin)</title></head>\
         <body><h1>Registry</h1>{items}</body></html>"
    ))
}

/// GET /rs — active client count as plain text
pub async fn active_count(State(state): State<Arc<AppState>>) -> String {
    let active = state
        .registry
        .active_clients(state.config.active_window)
        .await;
    active.len().to_string()
}

/// GET /gg — static tip text
pub async fn tips() -> Html<&'static str> {
    Html("Tip: clients report every few seconds; a device missing for a minute drops off the dashboard.")
}

/// Fallback for unmatched paths
pub async fn not_found(uri: Uri) -> (StatusCode, Html<String>) {
    (
        StatusCode::NOT_FOUND,
        Html(format!(
            "<html><head><title>404 Not Found</title></head>\
             <body><h1>404 Not Found</h1><p>The requested path {} was not found.</p></body></html>",
            escape_html(uri.path())
        )),
    )
}
