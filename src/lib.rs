// SPDX-License-Identifier: MIT
// Copyright (c) 2026 fleet-collector contributors

//! # Fleet Collector
//!
//! Central collector for a fleet of unattended reporting clients.
//!
//! Clients report liveness over plain HTTP heartbeats; operators and
//! consumers query aggregated near-real-time views of the fleet plus
//! periodic network-health samples. Expensive derived data (scan reports,
//! speed samples, charts) sits behind a short-TTL cache so external tools
//! are never invoked per request.
//!
//! ## Main modules
//! - `api`: HTTP router and handlers
//! - `cache`: TTL + LRU cache of derived artifacts
//! - `charts`: chart artifact builders
//! - `config`: configuration management
//! - `error`: error types
//! - `registry`: in-memory client registry
//! - `scan`: serialized external network scanning
//! - `speed`: speed sampling via an external tool
//! - `storage`: append-only persisted logs
//! - `system`: /proc-based host status sampling
//! - `tasks`: periodic background jobs
//! - `prelude`: commonly used types and traits

mod api;
mod cache;
mod charts;
mod config;
mod error;
mod registry;
mod scan;
mod speed;
mod storage;
mod system;
mod tasks;
pub mod prelude;

// Re-export commonly used types
/// Application configuration
pub use config::Config;

/// Application error and result type
pub use error::{AppError, Result};

/// HTTP API router and state
pub use api::{AppState, create_router};

/// Client registry and record types
pub use registry::{ClientRecord, ClientRegistry, ClientSnapshot};

/// Derived-artifact cache
pub use cache::{Artifact, ResponseCache};

/// Network scan coordination
pub use scan::{ScanCoordinator, ScanOptions};

/// Speed sampling
pub use speed::{SpeedOutcome, SpeedSample, SpeedSampler};

/// Append-only logs
pub use storage::{OccupancySample, Storage};

/// Background periodic tasks
pub use tasks::start_background_tasks;
