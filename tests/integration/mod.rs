//! Integration tests for the agent orchestrator.
//!
//! These tests verify end-to-end workflows including:
//! - Lost-update freedom of the metrics aggregator under contention
//! - The default researcher/coder workflow and concurrency limits
//! - Error reports emitted by failing workflows

mod error_reports;
mod metrics_concurrency;
mod orchestration;
