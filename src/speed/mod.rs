// SPDX-License-Identifier: MIT
// Copyright (c) 2026 fleet-collector contributors

//! Network speed sampling via an external measurement tool
//!
//! Spawns the librespeed CLI against a single self-hosted endpoint, feeding
//! it the server list as JSON on stdin and reading one CSV result line from
//! stdout. Samples are appended to the durable speed log and the latest
//! outcome (success or failure) is exposed through the response cache.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::cache::{Artifact, ResponseCache};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::storage::Storage;

pub const SPEED_CACHE_KEY: &str = "speed_test";
pub const SPEED_CHART_KEY: &str = "speed_chart";

/// One measurement from the speed tool
#[derive(Debug, Clone, Serialize)]
pub struct SpeedSample {
    pub timestamp: String,
    pub ping_ms: f64,
    pub download_mbps: f64,
    pub upload_mbps: f64,
}

/// Result of a sampling attempt. Failures are first-class values: they are
/// cached for the full TTL like successes to bound the retry rate.
#[derive(Debug, Clone)]
pub enum SpeedOutcome {
    Sample(SpeedSample),
    Failed(String),
}

/// Invokes the external speed tool and persists samples
pub struct SpeedSampler {
    cache: Arc<ResponseCache>,
    storage: Arc<Storage>,
    cli_path: PathBuf,
    endpoint: String,
    timeout: Duration,
    available: bool,
}

impl SpeedSampler {
    pub fn new(cache: Arc<ResponseCache>, storage: Arc<Storage>, config: &Config) -> Self {
        let available = config.speed_cli.exists();
        if !available {
            tracing::warn!(
                "Speed tool {} not found, speed sampling disabled",
                config.speed_cli.display()
            );
        }
        Self {
            cache,
            storage,
            cli_path: config.speed_cli.clone(),
            endpoint: config.speed_endpoint.clone(),
            timeout: config.speed_timeout,
            available,
        }
    }

    /// Returns a fresh or cached sample. Never panics past this boundary:
    /// tool failures and malformed output map to [`SpeedOutcome::Failed`].
    pub async fn sample(&self) -> SpeedOutcome {
        if !self.available {
            return SpeedOutcome::Failed("speed tool unavailable".to_string());
        }
        if let Some(Artifact::Speed(outcome)) = self.cache.get(SPEED_CACHE_KEY) {
            return outcome;
        }

        let outcome = match self.run_tool().await {
            Ok(line) => {
                let sample = parse_csv_line(&line);
                if let Err(e) = self.storage.append_speed(&sample).await {
                    tracing::error!("Failed to persist speed sample: {}", e);
                }
                SpeedOutcome::Sample(sample)
            }
            Err(e) => {
                tracing::warn!("Speed test failed: {}", e);
                SpeedOutcome::Failed(format!("speed test failed: {e}"))
            }
        };
        self.cache
            .put(SPEED_CACHE_KEY, Artifact::Speed(outcome.clone()));
        outcome
    }

    /// Drops any cached outcome so the next `sample()` runs the tool.
    /// Used by the hourly task to force a fresh measurement.
    pub fn invalidate_cached(&self) {
        self.cache.invalidate(SPEED_CACHE_KEY);
    }

    async fn run_tool(&self) -> Result<String> {
        let server_list = serde_json::json!([{
            "id": 1,
            "name": "self",
            "server": self.endpoint,
            "dlURL": "backend/garbage.php",
            "ulURL": "backend/empty.php",
            "pingURL": "backend/empty.php",
            "getIpURL": "backend/getIP.php",
        }]);

        let mut child = Command::new(&self.cli_path)
            .args(["--local-json", "-", "--csv"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AppError::Tool(format!("spawn failed: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(server_list.to_string().as_bytes())
                .await
                .map_err(AppError::Io)?;
            drop(stdin);
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| AppError::Tool("timed out".to_string()))?
            .map_err(AppError::Io)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let brief: String = stderr.chars().take(100).collect();
            return Err(AppError::Tool(brief));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Parses one CSV result line from the tool.
///
/// Fields: 0 timestamp, 4 ping, 5 download, 6 upload. Parsing is
/// defensive: missing or unparseable numeric fields default to zero, a
/// missing timestamp falls back to the current time, and any `+offset`
/// suffix on the timestamp is dropped.
pub fn parse_csv_line(line: &str) -> SpeedSample {
    let fields: Vec<&str> = line.split(',').collect();

    let timestamp = fields
        .first()
        .map(|f| f.split('+').next().unwrap_or(f).to_string())
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| format!("{}Z", chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S")));

    let number = |idx: usize| -> f64 {
        fields
            .get(idx)
            .and_then(|f| f.trim().parse().ok())
            .unwrap_or(0.0)
    };

    SpeedSample {
        timestamp,
        ping_ms: number(4),
        download_mbps: number(5),
        upload_mbps: number(6),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_formed_line() {
        let line = "2024-06-01T10:00:00+02:00,self,1.2.3.4,isp,12.5,95.2,40.1,0,0";
        let sample = parse_csv_line(line);
        assert_eq!(sample.timestamp, "2024-06-01T10:00:00");
        assert!((sample.ping_ms - 12.5).abs() < f64::EPSILON);
        assert!((sample.download_mbps - 95.2).abs() < f64::EPSILON);
        assert!((sample.upload_mbps - 40.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_degenerate_line_maps_to_zeroed_fields() {
        let sample = parse_csv_line("2024-06-01T10:00:00");
        assert_eq!(sample.timestamp, "2024-06-01T10:00:00");
        assert_eq!(sample.ping_ms, 0.0);
        assert_eq!(sample.download_mbps, 0.0);
        assert_eq!(sample.upload_mbps, 0.0);
    }

    #[test]
    fn test_unparseable_numbers_default_to_zero() {
        let line = "2024-06-01T10:00:00,self,host,isp,fast,??,";
        let sample = parse_csv_line(line);
        assert_eq!(sample.ping_ms, 0.0);
        assert_eq!(sample.download_mbps, 0.0);
        assert_eq!(sample.upload_mbps, 0.0);
    }

    #[test]
    fn test_empty_line_gets_fallback_timestamp() {
        let sample = parse_csv_line("");
        assert!(!sample.timestamp.is_empty());
        assert!(sample.timestamp.ends_with('Z'));
    }

    #[tokio::test]
    async fn missing_tool_reports_unavailable_without_spawn() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let cache = Arc::new(ResponseCache::new(10, Duration::from_secs(60)));
        let storage = Arc::new(Storage::new(dir.path()));
        let config = Config {
            speed_cli: dir.path().join("no-such-cli"),
            ..Config::default()
        };
        let sampler = SpeedSampler::new(cache.clone(), storage, &config);

        match sampler.sample().await {
            SpeedOutcome::Failed(msg) => assert!(msg.contains("unavailable")),
            SpeedOutcome::Sample(_) => panic!("tool cannot have produced a sample"),
        }
        // Permanent degradation does not churn the cache.
        assert!(cache.get(SPEED_CACHE_KEY).is_none());
    }
}
