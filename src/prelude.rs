// SPDX-License-Identifier: MIT
// Copyright (c) 2026 fleet-collector contributors

//! Prelude module for convenient imports
//!
//! Re-exports commonly used types and traits so consumers can pull in
//! everything they need with:
//!
//! ```rust
//! use fleet_collector::prelude::*;
//! ```

// Core types
pub use crate::config::Config;
pub use crate::error::{AppError, Result};

// HTTP surface
pub use crate::api::{AppState, create_router};

// Registry and cache
pub use crate::cache::{Artifact, ResponseCache};
pub use crate::registry::{ClientRecord, ClientRegistry, ClientSnapshot};

// External-tool coordinators and persisted state
pub use crate::scan::{ScanCoordinator, ScanOptions};
pub use crate::speed::{SpeedOutcome, SpeedSample, SpeedSampler};
pub use crate::storage::{OccupancySample, Storage};

// Background jobs
pub use crate::tasks::start_background_tasks;
