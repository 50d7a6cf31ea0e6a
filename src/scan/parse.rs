// SPDX-License-Identifier: MIT
// Copyright (c) 2026 fleet-collector contributors

//! Best-effort parsing of the scan tool's line-oriented output
//!
//! Records are recognized by fixed prefixes and substrings, not a formal
//! grammar. Missing fields are tolerated; a block without a signal or
//! channel still yields an access point.

/// One access point pulled out of the scan output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessPoint {
    pub bssid: String,
    pub ssid: Option<String>,
    pub signal_dbm: Option<i32>,
    pub channel: Option<u32>,
}

/// Splits raw tool output into access point records.
pub fn parse_scan_output(raw: &str) -> Vec<AccessPoint> {
    let mut aps = Vec::new();
    let mut current: Option<AccessPoint> = None;

    for line in raw.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("BSS ") {
            if let Some(ap) = current.take() {
                aps.push(ap);
            }
            let bssid = rest
                .split_whitespace()
                .next()
                .unwrap_or("")
                .split('(')
                .next()
                .unwrap_or("")
                .trim_end_matches(':')
                .to_string();
            current = Some(AccessPoint {
                bssid,
                ..AccessPoint::default()
            });
        }
        let Some(ap) = current.as_mut() else {
            continue;
        };
        if line.contains("SSID:") && !line.starts_with("Supported") {
            if let Some((_, value)) = line.split_once(':') {
                ap.ssid = Some(value.trim().to_string());
            }
        }
        if let Some(rest) = line.strip_prefix("signal:") {
            ap.signal_dbm = rest
                .split_whitespace()
                .next()
                .and_then(|tok| tok.parse::<f64>().ok())
                .map(|dbm| dbm as i32);
        }
        if let Some(rest) = line.strip_prefix("DS Parameter set: channel ") {
            ap.channel = rest.split_whitespace().next_back().and_then(|t| t.parse().ok());
        }
    }
    if let Some(ap) = current {
        aps.push(ap);
    }
    aps
}

/// Four-bucket signal bar glyph keyed on dBm thresholds.
pub fn signal_bar(dbm: i32) -> &'static str {
    if dbm >= -50 {
        "▂▄▆█"
    } else if dbm >= -60 {
        "▂▄▆ "
    } else if dbm >= -70 {
        "▂▄  "
    } else {
        "▂   "
    }
}

/// Fixed-width textual table of scan results, prefixed by the host status
/// line.
pub fn render_report(aps: &[AccessPoint], status_line: &str) -> String {
    let mut out = vec![
        "=".repeat(60),
        status_line.to_string(),
        "=".repeat(60),
        format!("Nearby access points: {}", aps.len()),
        "SIG   SSID                       CHAN  BSSID".to_string(),
        "-".repeat(65),
    ];
    for ap in aps {
        let bar = signal_bar(ap.signal_dbm.unwrap_or(-999));
        let ssid = ap.ssid.as_deref().unwrap_or("Hidden");
        let channel = ap
            .channel
            .map(|c| c.to_string())
            .unwrap_or_default();
        out.push(format!("{bar}  {ssid:<25}  {channel:>4}  {}", ap.bssid));
    }
    out.join("\n")
}
