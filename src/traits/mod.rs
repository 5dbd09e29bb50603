//! Trait definitions for mockable dependencies.
//!
//! This module defines traits for:
//! - [`ToolProbe`]: Detection of external developer tools
//! - [`Agent`]: An executor of orchestrated tasks
//! - [`TimeProvider`]: Time abstraction for testing
//!
//! # Mocking
//!
//! All traits are annotated with `#[cfg_attr(test, mockall::automock)]`
//! which generates mock implementations automatically for testing.
//!
//! # Example
//!
//! ```
//! use agent_orchestrator::traits::{TimeProvider, RealTimeProvider};
//!
//! let time_provider = RealTimeProvider;
//! let now = time_provider.now();
//! println!("Current time: {now}");
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::OrchestratorError;

/// External tool whose presence is recorded in a system snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    /// `git`.
    Git,
    /// `node`.
    Node,
    /// The `code` editor launcher.
    Editor,
}

impl Tool {
    /// All probed tools, in snapshot field order.
    pub const ALL: [Self; 3] = [Self::Git, Self::Node, Self::Editor];

    /// Program name to spawn.
    #[must_use]
    pub const fn program(self) -> &'static str {
        match self {
            Self::Git => "git",
            Self::Node => "node",
            Self::Editor => "code",
        }
    }

    /// Arguments that make the program print its version and exit.
    #[must_use]
    pub const fn version_args(self) -> &'static [&'static str] {
        &["--version"]
    }
}

/// Tool detection trait for mocking.
///
/// Implementations must never fail: a missing, broken or hanging tool
/// reports `false`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ToolProbe: Send + Sync {
    /// Returns true if the tool runs and exits successfully.
    async fn is_available(&self, tool: Tool) -> bool;
}

/// Agent trait for mocking.
///
/// An agent executes one task description at a time and returns its output.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Agent: Send + Sync {
    /// Display name of the agent.
    fn name(&self) -> String;

    /// Role the agent plays (e.g. "Researcher").
    fn role(&self) -> String;

    /// Execute a task.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] if the task cannot be completed.
    async fn execute(&self, task: &str) -> Result<String, OrchestratorError>;
}

/// Time provider trait for mocking.
///
/// This trait abstracts time access to allow for deterministic testing.
#[cfg_attr(test, mockall::automock)]
pub trait TimeProvider: Send + Sync {
    /// Get the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Real time provider using system clock.
///
/// This is the production implementation that returns the actual current time.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealTimeProvider;

impl TimeProvider for RealTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
