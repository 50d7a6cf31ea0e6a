// SPDX-License-Identifier: MIT
// Copyright (c) 2026 fleet-collector contributors

//! Derived chart artifacts
//!
//! Pure builders from stored samples to opaque artifact bytes, cached by
//! the caller. Artifacts are self-contained SVG documents served under the
//! legacy chart paths; callers use [`CHART_CONTENT_TYPE`] when responding.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::speed::SpeedSample;
use crate::storage::OccupancySample;

pub const CHART_CONTENT_TYPE: &str = "image/svg+xml";

pub const OCCUPANCY_CHART_KEY: &str = "line_plot";
pub const USER_PIE_KEY: &str = "user_pie";

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 400.0;
const MARGIN: f64 = 50.0;

const SERIES_COLORS: [&str; 6] = [
    "#2E8B57", "#1F77B4", "#FF6F00", "#9467BD", "#D62728", "#7F7F7F",
];

/// Online-count-over-time polyline
pub fn occupancy_chart(samples: &[OccupancySample]) -> Vec<u8> {
    if samples.len() < 2 {
        return placeholder("no occupancy data yet");
    }
    let values: Vec<f64> = samples.iter().map(|s| s.user_count as f64).collect();
    let labels: Vec<&str> = samples.iter().map(|s| s.timestamp.as_str()).collect();
    line_chart(&[("online", &values)], &labels, "online clients per hour")
}

/// Per-user share pie over currently tracked clients
pub fn user_pie(counts: &BTreeMap<String, usize>) -> Vec<u8> {
    let total: usize = counts.values().sum();
    if total == 0 {
        return placeholder("no named users online");
    }

    let size = 400.0;
    let (cx, cy, r) = (size / 2.0, size / 2.0, size / 2.0 - 60.0);
    let mut svg = svg_open(size, size);

    if counts.len() == 1 {
        // A single slice is a full circle; the arc path degenerates.
        let _ = write!(
            svg,
            r#"<circle cx="{cx}" cy="{cy}" r="{r}" fill="{}"/>"#,
            SERIES_COLORS[0]
        );
    } else {
        let mut angle = -std::f64::consts::FRAC_PI_2;
        for (i, count) in counts.values().enumerate() {
            let sweep = (*count as f64 / total as f64) * std::f64::consts::TAU;
            let (x1, y1) = (cx + r * angle.cos(), cy + r * angle.sin());
            let end = angle + sweep;
            let (x2, y2) = (cx + r * end.cos(), cy + r * end.sin());
            let large = i32::from(sweep > std::f64::consts::PI);
            let _ = write!(
                svg,
                r#"<path d="M{cx:.1} {cy:.1} L{x1:.1} {y1:.1} A{r:.1} {r:.1} 0 {large} 1 {x2:.1} {y2:.1} Z" fill="{}"/>"#,
                SERIES_COLORS[i % SERIES_COLORS.len()]
            );
            angle = end;
        }
    }

    for (i, (user, count)) in counts.iter().enumerate() {
        let share = 100.0 * *count as f64 / total as f64;
        let y = 20.0 + 16.0 * i as f64;
        let _ = write!(
            svg,
            r#"<text x="8" y="{y:.0}" font-size="12" fill="{}">{} {share:.1}%</text>"#,
            SERIES_COLORS[i % SERIES_COLORS.len()],
            escape_text(user)
        );
    }

    svg.push_str("</svg>");
    svg.into_bytes()
}

/// Download/upload/ping trend over the recent window
pub fn speed_chart(samples: &[SpeedSample]) -> Vec<u8> {
    if samples.len() < 2 {
        return placeholder("not enough speed samples yet");
    }
    let downs: Vec<f64> = samples.iter().map(|s| s.download_mbps).collect();
    let ups: Vec<f64> = samples.iter().map(|s| s.upload_mbps).collect();
    let pings: Vec<f64> = samples.iter().map(|s| s.ping_ms).collect();
    let labels: Vec<&str> = samples.iter().map(|s| s.timestamp.as_str()).collect();
    line_chart(
        &[
            ("download (Mbps)", &downs),
            ("upload (Mbps)", &ups),
            ("ping (ms)", &pings),
        ],
        &labels,
        "network speed, last 12h",
    )
}

fn line_chart(series: &[(&str, &[f64])], labels: &[&str], title: &str) -> Vec<u8> {
    let points = series.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
    let max_value = series
        .iter()
        .flat_map(|(_, values)| values.iter().copied())
        .fold(1.0_f64, f64::max);

    let x_at = |i: usize| {
        MARGIN + (WIDTH - 2.0 * MARGIN) * i as f64 / (points.saturating_sub(1).max(1)) as f64
    };
    let y_at = |v: f64| HEIGHT - MARGIN - (HEIGHT - 2.0 * MARGIN) * (v / max_value);

    let mut svg = svg_open(WIDTH, HEIGHT);
    let _ = write!(
        svg,
        r#"<text x="{:.0}" y="24" font-size="14" text-anchor="middle">{}</text>"#,
        WIDTH / 2.0,
        escape_text(title)
    );
    // Axes
    let _ = write!(
        svg,
        r##"<line x1="{m}" y1="{b}" x2="{right}" y2="{b}" stroke="#999"/><line x1="{m}" y1="{t}" x2="{m}" y2="{b}" stroke="#999"/>"##,
        m = MARGIN,
        t = MARGIN,
        b = HEIGHT - MARGIN,
        right = WIDTH - MARGIN,
    );
    let _ = write!(
        svg,
        r##"<text x="{:.0}" y="{:.0}" font-size="10" fill="#666">{max_value:.0}</text>"##,
        8.0,
        MARGIN + 4.0
    );
    if let (Some(first), Some(last)) = (labels.first(), labels.last()) {
        let _ = write!(
            svg,
            r##"<text x="{m:.0}" y="{y:.0}" font-size="10" fill="#666">{}</text><text x="{r:.0}" y="{y:.0}" font-size="10" fill="#666" text-anchor="end">{}</text>"##,
            escape_text(first),
            escape_text(last),
            m = MARGIN,
            r = WIDTH - MARGIN,
            y = HEIGHT - MARGIN + 16.0,
        );
    }

    for (i, (name, values)) in series.iter().enumerate() {
        let color = SERIES_COLORS[i % SERIES_COLORS.len()];
        let path: String = values
            .iter()
            .enumerate()
            .map(|(j, v)| format!("{:.1},{:.1}", x_at(j), y_at(*v)))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = write!(
            svg,
            r#"<polyline points="{path}" fill="none" stroke="{color}" stroke-width="1.5"/>"#
        );
        let _ = write!(
            svg,
            r#"<text x="{:.0}" y="{:.0}" font-size="11" fill="{color}">{}</text>"#,
            MARGIN + 6.0,
            MARGIN + 14.0 + 14.0 * i as f64,
            escape_text(name)
        );
    }

    svg.push_str("</svg>");
    svg.into_bytes()
}

fn placeholder(message: &str) -> Vec<u8> {
    let mut svg = svg_open(WIDTH, HEIGHT);
    let _ = write!(
        svg,
        r##"<text x="{:.0}" y="{:.0}" font-size="16" fill="#666" text-anchor="middle">{}</text>"##,
        WIDTH / 2.0,
        HEIGHT / 2.0,
        escape_text(message)
    );
    svg.push_str("</svg>");
    svg.into_bytes()
}

fn svg_open(width: f64, height: f64) -> String {
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width:.0}" height="{height:.0}" viewBox="0 0 {width:.0} {height:.0}"><rect width="100%" height="100%" fill="#ffffff"/>"##
    )
}

fn escape_text(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
