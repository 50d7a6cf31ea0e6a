// SPDX-License-Identifier: MIT
// Copyright (c) 2026 fleet-collector contributors

//! Serialized network scanning behind a single-flight lock
//!
//! The scan tool is expensive and possibly privileged, so at most one scan
//! runs process-wide: the mutex is the correctness mechanism against
//! duplicate concurrent invocations, the response cache is the throughput
//! mechanism against re-invocation within the TTL window.

pub mod parse;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tokio::sync::Mutex;

use crate::cache::{Artifact, ResponseCache};
use crate::config::Config;
use crate::system;

pub const SCAN_CACHE_KEY: &str = "wifi_scan";

const UNAVAILABLE_REPORT: &str = "scan tool unavailable";

/// Construction-time knobs for the coordinator
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub command: String,
    pub interface: String,
    pub timeout: Duration,
    /// Gap between the two CPU samples in the report header.
    pub status_interval: Duration,
    pub available: bool,
}

impl ScanOptions {
    pub fn from_config(config: &Config) -> Self {
        let available = binary_available(&config.scan_command);
        if !available {
            tracing::warn!(
                "Scan tool {:?} not found, scan reports disabled",
                config.scan_command
            );
        }
        Self {
            command: config.scan_command.clone(),
            interface: config.scan_interface.clone(),
            timeout: config.scan_timeout,
            status_interval: Duration::from_secs(1),
            available,
        }
    }
}

/// Serializes and caches the external scan operation
pub struct ScanCoordinator {
    cache: Arc<ResponseCache>,
    lock: Mutex<()>,
    opts: ScanOptions,
}

impl ScanCoordinator {
    pub fn new(cache: Arc<ResponseCache>, opts: ScanOptions) -> Self {
        Self {
            cache,
            lock: Mutex::new(()),
            opts,
        }
    }

    /// Produces the scan report. Concurrent callers block on the lock and
    /// re-check the cache once inside, so an in-flight scan is shared
    /// rather than repeated. Every outcome (success, failure, timeout) is
    /// returned as readable text and cached.
    pub async fn scan(&self) -> String {
        if !self.opts.available {
            return UNAVAILABLE_REPORT.to_string();
        }

        let _guard = self.lock.lock().await;
        if let Some(Artifact::Text(report)) = self.cache.get(SCAN_CACHE_KEY) {
            return report;
        }

        let report = self.run_scan().await;
        self.cache.put(SCAN_CACHE_KEY, Artifact::Text(report.clone()));
        report
    }

    async fn run_scan(&self) -> String {
        let deadline = Instant::now() + self.opts.timeout;

        let output = match self.invoke_tool(true, deadline).await {
            Ok(output) => output,
            Err(report) => return report,
        };
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        // Some drivers reject passive scans; retry once actively within
        // the remaining timeout budget.
        let output = if !stderr.is_empty() && stderr.contains("passive") {
            tracing::debug!("Passive scan unsupported, retrying active scan");
            match self.invoke_tool(false, deadline).await {
                Ok(output) => output,
                Err(report) => return report,
            }
        } else {
            output
        };

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
            return format!("scan failed: {stderr}");
        }
        let raw = String::from_utf8_lossy(&output.stdout);
        if raw.trim().is_empty() {
            return "scan failed: no output from tool".to_string();
        }

        let aps = parse::parse_scan_output(&raw);
        let status_line = match system::sample(self.opts.status_interval).await {
            Ok(status) => status.summary_line(),
            Err(e) => format!("host status unavailable: {e}"),
        };
        parse::render_report(&aps, &status_line)
    }

    async fn invoke_tool(
        &self,
        passive: bool,
        deadline: Instant,
    ) -> std::result::Result<std::process::Output, String> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err("scan timed out".to_string());
        }

        let mut command = Command::new(&self.opts.command);
        command.args(["dev", &self.opts.interface, "scan"]);
        if passive {
            command.arg("passive");
        }
        command.kill_on_drop(true);

        match tokio::time::timeout(remaining, command.output()).await {
            Err(_) => Err("scan timed out".to_string()),
            Ok(Err(e)) => Err(format!("scan failed: {e}")),
            Ok(Ok(output)) => Ok(output),
        }
    }
}

/// True when the command names an existing file or resolves on PATH.
pub fn binary_available(command: &str) -> bool {
    let path = std::path::Path::new(command);
    if path.components().count() > 1 {
        return path.exists();
    }
    std::env::var_os("PATH")
        .map(|paths| {
            std::env::split_paths(&paths).any(|dir| dir.join(command).is_file())
        })
        .unwrap_or(false)
}
