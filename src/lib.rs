//! Agent Orchestrator
//!
//! Resource planning and metrics for a multi-agent orchestration workspace.
//!
//! # Features
//!
//! - One-shot host capture (CPU, RAM, disk, installed tools)
//! - Deterministic resource limits derived from that capture
//! - Workspace validation and optimization recommendations
//! - Thread-safe metrics aggregation for agents, tasks, resources, the
//!   tool/skill/MCP library and costs
//! - A persisted workspace snapshot that later runs load as config overrides
//!
//! # Quick Start
//!
//! ```bash
//! agent-orchestrator setup --project-path . --create-dirs
//! agent-orchestrator orchestrate
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐  snapshot  ┌─────────┐  constraints  ┌────────┐
//! │ SnapshotReader │───────────▶│ planner │──────────────▶│ report │
//! └────────────────┘            └────┬────┘               └────────┘
//!                                    │ workspace_config.json
//!                                    ▼
//!                            ┌──────────────┐  events  ┌───────────────────┐
//!                            │ AgentManager │─────────▶│ MetricsAggregator │
//!                            └──────────────┘          └───────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod agents;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod planner;
pub mod report;
pub mod setup;
pub mod system;
pub mod traits;

#[cfg(test)]
mod test_utils;
