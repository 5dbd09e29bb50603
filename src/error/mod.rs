//! Error types for the agent orchestrator.
//!
//! This module defines a hierarchical error system:
//! - [`AppError`]: Top-level application errors
//! - [`ConfigError`]: Configuration errors
//! - [`SetupError`]: Workspace snapshot persistence errors
//! - [`OrchestratorError`]: The closed taxonomy of orchestration failures
//!
//! Probe failures, unknown-entity metric events and validation failures are
//! not errors here; they are recovered or reported as data.
//!
//! All errors implement `Send + Sync` for async compatibility.

mod taxonomy;

pub use taxonomy::{ErrorCategory, ErrorReport, OrchestratorError};

use thiserror::Error;

/// Top-level application error.
///
/// This is the main error type returned by the binary entry points.
/// It wraps all subsystem errors for unified error handling.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Setup error.
    #[error("Setup error: {0}")]
    Setup(#[from] SetupError),

    /// Orchestration error.
    #[error("Orchestration error: {0}")]
    Orchestrator(#[from] OrchestratorError),
}

/// Configuration errors.
///
/// These errors represent failures in configuration loading and validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Configuration value is invalid.
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue {
        /// The variable name.
        var: String,
        /// Why the value is invalid.
        reason: String,
    },
}

/// Workspace snapshot persistence errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SetupError {
    /// Reading or writing the snapshot file failed.
    #[error("I/O error on {path}: {message}")]
    Io {
        /// The file path involved.
        path: String,
        /// Description of the I/O failure.
        message: String,
    },

    /// The snapshot could not be encoded or decoded.
    #[error("Invalid workspace snapshot {path}: {message}")]
    Serialization {
        /// The file path involved.
        path: String,
        /// Description of the (de)serialization failure.
        message: String,
    },
}

impl SetupError {
    /// Build an I/O error for a path.
    #[must_use]
    pub fn io(path: &std::path::Path, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    /// Build a serialization error for a path.
    #[must_use]
    pub fn serialization(path: &std::path::Path, err: &serde_json::Error) -> Self {
        Self::Serialization {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}
