// SPDX-License-Identifier: MIT
// Copyright (c) 2026 fleet-collector contributors

//! Point-in-time host resource sampling
//!
//! Reads CPU, memory, load and uptime straight from /proc. CPU utilization
//! is derived from two aggregate /proc/stat samples taken a caller-chosen
//! interval apart.

use std::time::Duration;

use crate::error::{AppError, Result};

/// Snapshot of host resource usage
#[derive(Debug, Clone)]
pub struct SystemStatus {
    pub cpu_percent: f64,
    pub mem_used_mb: u64,
    pub mem_total_mb: u64,
    pub load_avg: f64,
    pub uptime_secs: u64,
}

impl SystemStatus {
    /// One-line rendering used as the scan report header.
    pub fn summary_line(&self) -> String {
        let hours = self.uptime_secs / 3600;
        let minutes = (self.uptime_secs % 3600) / 60;
        format!(
            "CPU:{:4.1}%  Mem:{}/{}MB  Load:{:.2}  Up:{}h{}m",
            self.cpu_percent, self.mem_used_mb, self.mem_total_mb, self.load_avg, hours, minutes
        )
    }
}

/// Samples host status, spending `cpu_interval` between the two CPU reads.
pub async fn sample(cpu_interval: Duration) -> Result<SystemStatus> {
    let first = read_cpu_counters().await?;
    tokio::time::sleep(cpu_interval).await;
    let second = read_cpu_counters().await?;
    let cpu_percent = cpu_usage_percent(first, second);

    let meminfo = tokio::fs::read_to_string("/proc/meminfo").await?;
    let (mem_total_mb, mem_used_mb) = parse_meminfo(&meminfo)
        .ok_or_else(|| AppError::Parse("missing MemTotal/MemAvailable in /proc/meminfo".into()))?;

    let loadavg = tokio::fs::read_to_string("/proc/loadavg").await?;
    let load_avg = parse_loadavg(&loadavg)
        .ok_or_else(|| AppError::Parse("malformed /proc/loadavg".into()))?;

    let uptime = tokio::fs::read_to_string("/proc/uptime").await?;
    let uptime_secs =
        parse_uptime(&uptime).ok_or_else(|| AppError::Parse("malformed /proc/uptime".into()))?;

    Ok(SystemStatus {
        cpu_percent,
        mem_used_mb,
        mem_total_mb,
        load_avg,
        uptime_secs,
    })
}

/// Idle and total jiffies from the aggregate cpu line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuCounters {
    pub idle: u64,
    pub total: u64,
}

async fn read_cpu_counters() -> Result<CpuCounters> {
    let stat = tokio::fs::read_to_string("/proc/stat").await?;
    let line = stat
        .lines()
        .next()
        .ok_or_else(|| AppError::Parse("empty /proc/stat".into()))?;
    parse_cpu_line(line).ok_or_else(|| AppError::Parse("malformed /proc/stat cpu line".into()))
}

/// Parses the aggregate `cpu ...` line. Idle time counts the idle, iowait,
/// irq and softirq fields.
pub fn parse_cpu_line(line: &str) -> Option<CpuCounters> {
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map_while(|tok| tok.parse().ok())
        .collect();
    if fields.len() < 7 {
        return None;
    }
    let idle = fields[3..7].iter().sum();
    let total = fields.iter().sum();
    Some(CpuCounters { idle, total })
}

/// Utilization between two counter samples, clamped to 0..=100.
pub fn cpu_usage_percent(first: CpuCounters, second: CpuCounters) -> f64 {
    let total_delta = second.total.saturating_sub(first.total);
    if total_delta == 0 {
        return 0.0;
    }
    let idle_delta = second.idle.saturating_sub(first.idle);
    let busy = 100.0 * (1.0 - idle_delta as f64 / total_delta as f64);
    busy.clamp(0.0, 100.0)
}

/// (total, used) in megabytes from /proc/meminfo
pub fn parse_meminfo(raw: &str) -> Option<(u64, u64)> {
    let mut total_kb = None;
    let mut avail_kb = None;
    for line in raw.lines() {
        if let Some(rest) = line.strip_prefix("MemTotal:") {
            total_kb = rest.split_whitespace().next()?.parse::<u64>().ok();
        } else if let Some(rest) = line.strip_prefix("MemAvailable:") {
            avail_kb = rest.split_whitespace().next()?.parse::<u64>().ok();
        }
    }
    let total = total_kb? / 1024;
    let avail = avail_kb? / 1024;
    Some((total, total.saturating_sub(avail)))
}

/// One-minute load average from /proc/loadavg
pub fn parse_loadavg(raw: &str) -> Option<f64> {
    raw.split_whitespace().next()?.parse().ok()
}

/// Whole seconds of uptime from /proc/uptime
pub fn parse_uptime(raw: &str) -> Option<u64> {
    raw.split_whitespace()
        .next()?
        .parse::<f64>()
        .ok()
        .map(|secs| secs as u64)
}
