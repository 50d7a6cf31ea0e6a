// SPDX-License-Identifier: MIT
// Copyright (c) 2026 fleet-collector contributors

//! Error types for the fleet collector application

use thiserror::Error;

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Network or IO error
    #[error("IO error")]
    Io(#[from] std::io::Error),

    /// Malformed data from an external source (/proc, tool output, logs)
    #[error("Parse error: {0}")]
    Parse(String),

    /// External tool invocation failure
    #[error("External tool error: {0}")]
    Tool(String),

    /// Address parsing error
    #[error("Address parse error")]
    AddrParse(#[from] std::net::AddrParseError),
}

/// Convenient alias for Result with application error
pub type Result<T> = std::result::Result<T, AppError>;
