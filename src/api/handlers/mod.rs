// SPDX-License-Identifier: MIT
// Copyright (c) 2026 fleet-collector contributors

mod charts;
mod dashboard;
mod feedback;
mod heartbeat;
mod scan;
mod status;

pub use charts::{occupancy_chart, speed_chart, user_pie};
pub use dashboard::{active_count, admin_listing, client_listing, index, not_found, tips};
pub use feedback::submit_feedback;
pub use heartbeat::heartbeat;
pub use scan::scan_report;
pub use status::{api_status, speedtest_now};

/// Escapes text for embedding in an HTML document.
pub(crate) fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
