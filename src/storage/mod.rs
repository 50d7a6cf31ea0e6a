// SPDX-License-Identifier: MIT
// Copyright (c) 2026 fleet-collector contributors

//! Append-only persisted logs
//!
//! Four durable files live under the data directory: the device-identifier
//! log (comma separated, one entry per new id ever seen), the hourly
//! occupancy log (one JSON object per line), the speed sample log (headered
//! CSV) and the free-text feedback log. Entries are never mutated; readers
//! only scan.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::speed::SpeedSample;

const DEVICES_FILE: &str = "devices.txt";
const OCCUPANCY_FILE: &str = "occupancy.jsonl";
const SPEED_FILE: &str = "speedlog.csv";
const FEEDBACK_FILE: &str = "feedback.txt";

const SPEED_CSV_HEADER: &str = "timestamp,ping_ms,download_mbps,upload_mbps";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Hourly active-client count, one JSON object per log line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccupancySample {
    pub timestamp: String,
    pub user_count: usize,
}

/// Owner of the append-only logs
pub struct Storage {
    data_dir: PathBuf,
}

impl Storage {
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Creates the data directory and every log file that does not exist
    /// yet. Called once at startup.
    pub async fn ensure_files(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.data_dir).await?;
        for name in [DEVICES_FILE, OCCUPANCY_FILE, SPEED_FILE, FEEDBACK_FILE] {
            let path = self.data_dir.join(name);
            if !path.exists() {
                tokio::fs::write(&path, b"").await?;
            }
        }
        Ok(())
    }

    fn path(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    async fn append(&self, name: &str, content: &str) -> Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(name))
            .await?;
        file.write_all(content.as_bytes()).await?;
        // write_all only buffers; the append must be on disk before the
        // caller reports success or re-reads the file.
        file.flush().await?;
        Ok(())
    }

    /// Appends the id to the device log unless already present.
    pub async fn record_device(&self, id: &str) -> Result<()> {
        let existing = read_or_empty(&self.path(DEVICES_FILE)).await?;
        if existing.split(',').any(|entry| entry.trim() == id) {
            return Ok(());
        }
        self.append(DEVICES_FILE, &format!("{id},")).await
    }

    /// Count of distinct device ids ever seen.
    pub async fn total_devices(&self) -> Result<usize> {
        let content = read_or_empty(&self.path(DEVICES_FILE)).await?;
        Ok(content
            .split(',')
            .filter(|entry| !entry.trim().is_empty())
            .count())
    }

    /// Appends one occupancy sample stamped with the current local time.
    pub async fn append_occupancy(&self, user_count: usize) -> Result<()> {
        let sample = OccupancySample {
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            user_count,
        };
        let line = serde_json::to_string(&sample)
            .map_err(|e| crate::error::AppError::Parse(e.to_string()))?;
        self.append(OCCUPANCY_FILE, &format!("{line}\n")).await
    }

    /// Full occupancy history. Malformed lines are skipped, never fatal.
    pub async fn read_occupancy(&self) -> Result<Vec<OccupancySample>> {
        let content = read_or_empty(&self.path(OCCUPANCY_FILE)).await?;
        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }

    /// Appends one speed sample, writing the CSV header exactly once.
    pub async fn append_speed(&self, sample: &SpeedSample) -> Result<()> {
        let existing = read_or_empty(&self.path(SPEED_FILE)).await?;
        let mut out = String::new();
        if existing.trim().is_empty() {
            out.push_str(SPEED_CSV_HEADER);
            out.push('\n');
        }
        out.push_str(&format!(
            "{},{},{},{}\n",
            sample.timestamp, sample.ping_ms, sample.download_mbps, sample.upload_mbps
        ));
        self.append(SPEED_FILE, &out).await
    }

    /// Speed samples newer than `window`, oldest first. Malformed rows are
    /// skipped.
    pub async fn read_recent_speed(&self, window: chrono::Duration) -> Result<Vec<SpeedSample>> {
        let content = read_or_empty(&self.path(SPEED_FILE)).await?;
        let cutoff = Local::now().naive_local() - window;
        Ok(content
            .lines()
            .skip_while(|line| line.starts_with("timestamp"))
            .filter_map(|line| {
                let fields: Vec<&str> = line.split(',').collect();
                if fields.len() < 4 {
                    return None;
                }
                let at = parse_sample_time(fields[0])?;
                if at < cutoff {
                    return None;
                }
                Some(SpeedSample {
                    timestamp: fields[0].to_string(),
                    ping_ms: fields[1].parse().ok()?,
                    download_mbps: fields[2].parse().ok()?,
                    upload_mbps: fields[3].parse().ok()?,
                })
            })
            .collect())
    }

    /// Appends one feedback block keyed by submitter address and timestamp.
    pub async fn append_feedback(&self, submitter: &str, text: &str) -> Result<()> {
        let ts = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let block = format!("[{ts}] from: {submitter}\n{text}\n{}\n", "-".repeat(50));
        self.append(FEEDBACK_FILE, &block).await
    }
}

async fn read_or_empty(path: &Path) -> Result<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e.into()),
    }
}

/// Best-effort timestamp parsing for speed log rows. Tools emit ISO-8601
/// with or without fractional seconds and a trailing Z.
fn parse_sample_time(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim().trim_end_matches('Z');
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage() -> (TempDir, Storage) {
        let dir = TempDir::new().expect("tempdir");
        let storage = Storage::new(dir.path());
        (dir, storage)
    }

    fn sample_at(ts: &str) -> SpeedSample {
        SpeedSample {
            timestamp: ts.to_string(),
            ping_ms: 12.5,
            download_mbps: 95.2,
            upload_mbps: 40.1,
        }
    }

    #[tokio::test]
    async fn ensure_files_creates_all_logs() {
        let (dir, storage) = storage();
        storage.ensure_files().await.expect("ensure files");
        for name in [DEVICES_FILE, OCCUPANCY_FILE, SPEED_FILE, FEEDBACK_FILE] {
            assert!(dir.path().join(name).exists(), "{name} should exist");
        }
    }

    #[tokio::test]
    async fn record_device_is_write_once_per_id() {
        let (dir, storage) = storage();
        storage.record_device("10.0.0.5").await.expect("record");
        storage.record_device("10.0.0.5").await.expect("record");
        storage.record_device("10.0.0.9").await.expect("record");

        let content = tokio::fs::read_to_string(dir.path().join(DEVICES_FILE))
            .await
            .expect("read");
        assert_eq!(content, "10.0.0.5,10.0.0.9,");
        assert_eq!(storage.total_devices().await.expect("count"), 2);
    }

    #[tokio::test]
    async fn total_devices_on_missing_file_is_zero() {
        let (_dir, storage) = storage();
        assert_eq!(storage.total_devices().await.expect("count"), 0);
    }

    #[tokio::test]
    async fn occupancy_roundtrip_skips_malformed_lines() {
        let (dir, storage) = storage();
        storage.append_occupancy(3).await.expect("append");
        storage.append_occupancy(5).await.expect("append");

        // Simulate a torn write in the middle of the log.
        let path = dir.path().join(OCCUPANCY_FILE);
        let mut content = tokio::fs::read_to_string(&path).await.expect("read");
        content.push_str("{not json\n");
        tokio::fs::write(&path, content).await.expect("write");
        storage.append_occupancy(7).await.expect("append");

        let samples = storage.read_occupancy().await.expect("read");
        let counts: Vec<usize> = samples.iter().map(|s| s.user_count).collect();
        assert_eq!(counts, vec![3, 5, 7]);
    }

    #[tokio::test]
    async fn speed_log_header_written_exactly_once() {
        let (dir, storage) = storage();
        let now = Local::now().format("%Y-%m-%dT%H:%M:%S").to_string();
        storage.append_speed(&sample_at(&now)).await.expect("append");
        storage.append_speed(&sample_at(&now)).await.expect("append");

        let content = tokio::fs::read_to_string(dir.path().join(SPEED_FILE))
            .await
            .expect("read");
        let headers = content
            .lines()
            .filter(|l| l.starts_with("timestamp"))
            .count();
        assert_eq!(headers, 1);
        assert_eq!(content.lines().count(), 3);
    }

    #[tokio::test]
    async fn read_recent_speed_filters_old_and_malformed_rows() {
        let (_dir, storage) = storage();
        let now = Local::now().format("%Y-%m-%dT%H:%M:%S").to_string();
        storage.append_speed(&sample_at(&now)).await.expect("append");
        storage
            .append_speed(&sample_at("2000-01-01T00:00:00"))
            .await
            .expect("append");
        storage
            .append_speed(&sample_at("garbage-timestamp"))
            .await
            .expect("append");

        let recent = storage
            .read_recent_speed(chrono::Duration::hours(12))
            .await
            .expect("read");
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].timestamp, now);
        assert!((recent[0].download_mbps - 95.2).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn append_is_durable_before_returning() {
        let (dir, storage) = storage();
        storage
            .append_feedback("10.0.0.5", "first")
            .await
            .expect("append");

        // The block must be readable through a fresh handle immediately,
        // not after some later background flush.
        let content = std::fs::read_to_string(dir.path().join(FEEDBACK_FILE)).expect("read");
        assert!(content.contains("first"));

        // Back-to-back device writes re-read the file each time; a buffered
        // append would let the second call miss the first id.
        for _ in 0..10 {
            storage.record_device("10.0.0.7").await.expect("record");
        }
        assert_eq!(storage.total_devices().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn feedback_blocks_carry_submitter_and_rule() {
        let (dir, storage) = storage();
        storage
            .append_feedback("10.0.0.5", "scan page is slow")
            .await
            .expect("append");

        let content = tokio::fs::read_to_string(dir.path().join(FEEDBACK_FILE))
            .await
            .expect("read");
        assert!(content.contains("from: 10.0.0.5"));
        assert!(content.contains("scan page is slow"));
        assert!(content.contains(&"-".repeat(50)));
    }

    #[test]
    fn test_parse_sample_time_variants() {
        assert!(parse_sample_time("2024-06-01T10:00:00Z").is_some());
        assert!(parse_sample_time("2024-06-01T10:00:00.123").is_some());
        assert!(parse_sample_time("2024-06-01 10:00:00").is_some());
        assert!(parse_sample_time("not-a-time").is_none());
    }
}
