//! Concurrent metrics aggregation.
//!
//! This module provides:
//! - Per-agent execution, token, cost and quality statistics
//! - Task lifecycle counters with a conservation invariant
//! - Host resource readings
//! - Tool/skill/MCP catalog statistics and an improvement log
//! - Cost tracking per agent and per model
//! - Free-form named metric series
//!
//! Each family sits behind its own [`RwLock`]; every read-modify-write is a
//! single critical section on one family.
//!
//! # Example
//!
//! ```
//! use agent_orchestrator::metrics::MetricsAggregator;
//!
//! let metrics = MetricsAggregator::new();
//! metrics.record_task_created();
//! metrics.record_task_started();
//! metrics.record_task_completed(2.5);
//! metrics.record_agent_task_completion("a1", "researcher", 2.5, true);
//!
//! let summary = metrics.summary();
//! assert_eq!(summary.tasks.completed_tasks, 1);
//! assert!(summary.tasks.is_consistent());
//! assert_eq!(summary.agents["a1"].tasks_completed, 1);
//! ```

#![allow(clippy::cast_precision_loss)]

mod types;

pub use types::{
    AgentMetrics, CostMetrics, ImprovementRecord, LibraryKind, LibraryMetrics, MetricValue,
    MetricsSummary, ResourceMetrics, ResourceUpdate, TaskMetrics,
};

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::Value;

/// Take a read guard, recovering the data if a writer panicked.
fn read_family<'a, T>(lock: &'a RwLock<T>, family: &'static str) -> RwLockReadGuard<'a, T> {
    lock.read().unwrap_or_else(|poison_error| {
        tracing::warn!(
            family,
            error = %poison_error,
            "Reading metrics from poisoned lock, using recovered data"
        );
        poison_error.into_inner()
    })
}

/// Take a write guard, recovering the data if a writer panicked.
fn write_family<'a, T>(lock: &'a RwLock<T>, family: &'static str) -> RwLockWriteGuard<'a, T> {
    lock.write().unwrap_or_else(|poison_error| {
        tracing::error!(
            family,
            error = %poison_error,
            "Writing metrics through poisoned lock, using recovered data"
        );
        poison_error.into_inner()
    })
}

/// Which terminal counter a draining transition feeds.
#[derive(Debug, Clone, Copy)]
enum Outcome {
    Completed,
    Failed,
    Cancelled,
}

impl Outcome {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Thread-safe metrics aggregator.
///
/// Shared across tasks behind an `Arc`; all recording methods take `&self`.
#[derive(Debug)]
pub struct MetricsAggregator {
    started: RwLock<Instant>,
    agents: RwLock<HashMap<String, AgentMetrics>>,
    tasks: RwLock<TaskMetrics>,
    resources: RwLock<ResourceMetrics>,
    library: RwLock<LibraryMetrics>,
    costs: RwLock<CostMetrics>,
    custom: RwLock<HashMap<String, Vec<MetricValue>>>,
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self {
            started: RwLock::new(Instant::now()),
            agents: RwLock::default(),
            tasks: RwLock::default(),
            resources: RwLock::default(),
            library: RwLock::default(),
            costs: RwLock::default(),
            custom: RwLock::default(),
        }
    }
}

impl MetricsAggregator {
    /// Create an empty aggregator; uptime starts now.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Agents
    // ========================================================================

    /// Record one finished execution for an agent, creating its record on
    /// first sight.
    pub fn record_agent_task_completion(
        &self,
        agent_id: &str,
        agent_type: &str,
        execution_time: f64,
        success: bool,
    ) {
        let mut agents = write_family(&self.agents, "agents");
        let agent = agents
            .entry(agent_id.to_string())
            .or_insert_with(|| AgentMetrics::new(agent_id, agent_type));

        if success {
            agent.tasks_completed += 1;
        } else {
            agent.tasks_failed += 1;
        }
        agent.total_execution_time += execution_time;
        agent.average_execution_time = agent.total_execution_time / agent.total_tasks() as f64;
        agent.last_active = Some(Utc::now());
    }

    /// Add token usage and spend to a known agent and count one API call.
    pub fn record_agent_tokens(&self, agent_id: &str, tokens: u64, cost_usd: f64) {
        let mut agents = write_family(&self.agents, "agents");
        match agents.get_mut(agent_id) {
            Some(agent) => {
                agent.tokens_used += tokens;
                agent.cost_usd += cost_usd;
                agent.api_calls += 1;
            }
            None => tracing::debug!(agent_id, "Ignoring token usage for unknown agent"),
        }
    }

    /// Set the quality score of a known agent, clamped to `[0, 1]`.
    pub fn record_agent_quality_score(&self, agent_id: &str, score: f64) {
        let mut agents = write_family(&self.agents, "agents");
        match agents.get_mut(agent_id) {
            Some(agent) => agent.quality_score = score.clamp(0.0, 1.0),
            None => tracing::debug!(agent_id, "Ignoring quality score for unknown agent"),
        }
    }

    // ========================================================================
    // Tasks
    // ========================================================================

    /// A task entered the queue.
    pub fn record_task_created(&self) {
        let mut tasks = write_family(&self.tasks, "tasks");
        tasks.total_tasks += 1;
        tasks.pending_tasks += 1;
    }

    /// A pending task started. Ignored when nothing is pending.
    pub fn record_task_started(&self) {
        let mut tasks = write_family(&self.tasks, "tasks");
        if tasks.pending_tasks == 0 {
            tracing::warn!("Task start recorded with no pending task, ignoring");
            return;
        }
        tasks.pending_tasks -= 1;
        tasks.in_progress_tasks += 1;
    }

    /// A running task completed after `duration` seconds.
    pub fn record_task_completed(&self, duration: f64) {
        let mut tasks = write_family(&self.tasks, "tasks");
        Self::drain(&mut tasks, Outcome::Completed);
        tasks.completed_tasks += 1;
        tasks.total_duration += duration;
        tasks.average_duration = tasks.total_duration / tasks.completed_tasks as f64;
    }

    /// A running task failed.
    pub fn record_task_failed(&self) {
        let mut tasks = write_family(&self.tasks, "tasks");
        Self::drain(&mut tasks, Outcome::Failed);
        tasks.failed_tasks += 1;
    }

    /// A running or pending task was cancelled.
    pub fn record_task_cancelled(&self) {
        let mut tasks = write_family(&self.tasks, "tasks");
        Self::drain(&mut tasks, Outcome::Cancelled);
        tasks.cancelled_tasks += 1;
    }

    /// Take one task out of `in_progress`, else out of `pending`.
    fn drain(tasks: &mut TaskMetrics, outcome: Outcome) {
        if tasks.in_progress_tasks > 0 {
            tasks.in_progress_tasks -= 1;
        } else if tasks.pending_tasks > 0 {
            tasks.pending_tasks -= 1;
        } else {
            tracing::warn!(
                outcome = outcome.as_str(),
                total = tasks.total_tasks,
                "Task transition with no pending or running task; counters no longer balance"
            );
        }
    }

    /// Record a quality-control verdict.
    ///
    /// The rates are derived from the completed/failed task counters, so an
    /// approval only refreshes the approval rate and a rejection only the
    /// rejection rate.
    pub fn record_qc_result(&self, approved: bool) {
        let mut tasks = write_family(&self.tasks, "tasks");
        let resolved = tasks.completed_tasks + tasks.failed_tasks;
        if resolved == 0 {
            return;
        }
        if approved {
            tasks.qc_approval_rate = tasks.completed_tasks as f64 / resolved as f64;
        } else {
            tasks.qc_rejection_rate = tasks.failed_tasks as f64 / resolved as f64;
        }
    }

    // ========================================================================
    // Resources
    // ========================================================================

    /// Overwrite the fields present in `update`.
    pub fn update_resource_metrics(&self, update: ResourceUpdate) {
        let mut resources = write_family(&self.resources, "resources");
        update.apply(&mut resources);
    }

    // ========================================================================
    // Library
    // ========================================================================

    /// Count a newly created tool, skill or MCP server.
    pub fn record_library_creation(&self, kind: &str, item_id: &str) {
        let Some(kind) = Self::library_kind(kind, item_id) else {
            return;
        };
        let mut library = write_family(&self.library, "library");
        *library.created_mut(kind) += 1;
    }

    /// Count one use of a tool, skill or MCP server.
    pub fn record_library_usage(&self, kind: &str, item_id: &str) {
        let Some(kind) = Self::library_kind(kind, item_id) else {
            return;
        };
        let mut library = write_family(&self.library, "library");
        *library.used_mut(kind) += 1;
    }

    /// Set the latest effectiveness score of a catalog item.
    pub fn record_library_effectiveness(&self, kind: &str, item_id: &str, score: f64) {
        let Some(kind) = Self::library_kind(kind, item_id) else {
            return;
        };
        let mut library = write_family(&self.library, "library");
        library
            .effectiveness_mut(kind)
            .insert(item_id.to_string(), score);
    }

    fn library_kind(kind: &str, item_id: &str) -> Option<LibraryKind> {
        match kind.parse() {
            Ok(kind) => Some(kind),
            Err(e) => {
                tracing::debug!(kind, item_id, error = %e, "Ignoring library event");
                None
            }
        }
    }

    /// Append a measured improvement to the log.
    pub fn record_improvement(
        &self,
        improvement_type: &str,
        baseline: f64,
        new_value: f64,
        metadata: HashMap<String, Value>,
    ) {
        let record = ImprovementRecord::new(improvement_type, baseline, new_value, metadata);
        tracing::info!(
            improvement_type,
            improvement_percent = record.improvement_percent,
            "Improvement measured"
        );
        write_family(&self.library, "library")
            .improvements_measured
            .push(record);
    }

    // ========================================================================
    // Costs
    // ========================================================================

    /// Add spend, optionally attributed to an agent and a model.
    ///
    /// `average_cost_per_task` uses the completed task count as of this call.
    pub fn record_cost(
        &self,
        cost_usd: f64,
        agent_id: Option<&str>,
        model: Option<&str>,
        tokens: u64,
    ) {
        let completed = read_family(&self.tasks, "tasks").completed_tasks;

        let mut costs = write_family(&self.costs, "costs");
        costs.total_cost_usd += cost_usd;
        costs.tokens_used += tokens;
        costs.api_calls += 1;
        if let Some(agent_id) = agent_id {
            *costs.cost_by_agent.entry(agent_id.to_string()).or_default() += cost_usd;
        }
        if let Some(model) = model {
            *costs.cost_by_model.entry(model.to_string()).or_default() += cost_usd;
        }
        costs.average_cost_per_task = if completed > 0 {
            costs.total_cost_usd / completed as f64
        } else {
            0.0
        };
    }

    // ========================================================================
    // Custom series
    // ========================================================================

    /// Append a sample to the named series.
    pub fn record_metric(&self, name: &str, value: f64, labels: Option<HashMap<String, String>>) {
        write_family(&self.custom, "custom")
            .entry(name.to_string())
            .or_default()
            .push(MetricValue::new(value, labels.unwrap_or_default()));
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Copy of one agent's record.
    #[must_use]
    pub fn agent(&self, agent_id: &str) -> Option<AgentMetrics> {
        read_family(&self.agents, "agents").get(agent_id).cloned()
    }

    /// Copy of every agent record.
    #[must_use]
    pub fn agents(&self) -> HashMap<String, AgentMetrics> {
        read_family(&self.agents, "agents").clone()
    }

    /// Copy of the task counters.
    #[must_use]
    pub fn tasks(&self) -> TaskMetrics {
        read_family(&self.tasks, "tasks").clone()
    }

    /// Copy of the resource readings.
    #[must_use]
    pub fn resources(&self) -> ResourceMetrics {
        read_family(&self.resources, "resources").clone()
    }

    /// Copy of the catalog statistics.
    #[must_use]
    pub fn library(&self) -> LibraryMetrics {
        read_family(&self.library, "library").clone()
    }

    /// Copy of the spend tracking.
    #[must_use]
    pub fn costs(&self) -> CostMetrics {
        read_family(&self.costs, "costs").clone()
    }

    /// Copy of one custom series (empty if never recorded).
    #[must_use]
    pub fn metric(&self, name: &str) -> Vec<MetricValue> {
        read_family(&self.custom, "custom")
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Time since creation or the last [`reset`](Self::reset).
    #[must_use]
    pub fn uptime(&self) -> Duration {
        read_family(&self.started, "started").elapsed()
    }

    /// Deep copy of every family.
    ///
    /// Families are copied one at a time, so a summary taken during heavy
    /// recording may mix states from slightly different instants.
    #[must_use]
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            uptime_seconds: self.uptime().as_secs_f64(),
            timestamp: Utc::now(),
            agents: self.agents(),
            tasks: self.tasks(),
            resources: self.resources(),
            library: self.library(),
            costs: self.costs(),
            custom_metrics: read_family(&self.custom, "custom").clone(),
        }
    }

    /// Clear every family and restart the uptime clock.
    pub fn reset(&self) {
        write_family(&self.agents, "agents").clear();
        *write_family(&self.tasks, "tasks") = TaskMetrics::default();
        *write_family(&self.resources, "resources") = ResourceMetrics::default();
        *write_family(&self.library, "library") = LibraryMetrics::default();
        *write_family(&self.costs, "costs") = CostMetrics::default();
        write_family(&self.custom, "custom").clear();
        *write_family(&self.started, "started") = Instant::now();
        tracing::debug!("Metrics reset");
    }
}

/// Wall-clock timer for a single execution.
#[derive(Debug)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer.
    #[must_use]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed time in seconds.
    #[must_use]
    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Elapsed time in milliseconds.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::start()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::float_cmp
)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    use pretty_assertions::assert_eq;
    use static_assertions::assert_impl_all;
    use test_case::test_case;

    assert_impl_all!(MetricsAggregator: Send, Sync);

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_empty_summary() {
        let metrics = MetricsAggregator::new();
        let summary = metrics.summary();

        assert!(summary.agents.is_empty());
        assert_eq!(summary.tasks, TaskMetrics::default());
        assert_eq!(summary.resources, ResourceMetrics::default());
        assert_eq!(summary.library, LibraryMetrics::default());
        assert_eq!(summary.costs, CostMetrics::default());
        assert!(summary.custom_metrics.is_empty());
        assert!(summary.uptime_seconds >= 0.0);
    }

    #[test]
    fn test_agent_completion_creates_and_averages() {
        let metrics = MetricsAggregator::new();
        metrics.record_agent_task_completion("a1", "researcher", 2.5, true);
        metrics.record_agent_task_completion("a1", "researcher", 1.5, false);

        let agent = metrics.agent("a1").unwrap();
        assert_eq!(agent.agent_type, "researcher");
        assert_eq!(agent.tasks_completed, 1);
        assert_eq!(agent.tasks_failed, 1);
        assert_close(agent.total_execution_time, 4.0);
        assert_close(agent.average_execution_time, 2.0);
        assert!(agent.last_active.is_some());
    }

    #[test]
    fn test_agent_average_counts_failures() {
        let metrics = MetricsAggregator::new();
        for time in [2.0, 4.0, 6.0] {
            metrics.record_agent_task_completion("a1", "coder", time, true);
        }
        metrics.record_agent_task_completion("a1", "coder", 0.0, false);

        let agent = metrics.agent("a1").unwrap();
        assert_eq!(agent.tasks_completed, 3);
        assert_eq!(agent.tasks_failed, 1);
        assert_close(agent.total_execution_time, 12.0);
        assert_close(agent.average_execution_time, 3.0);
        assert_close(agent.success_rate(), 0.75);
    }

    #[test]
    fn test_agent_lifecycle_scenario() {
        let metrics = MetricsAggregator::new();
        metrics.record_task_created();
        metrics.record_task_started();
        metrics.record_task_completed(2.5);
        metrics.record_agent_task_completion("a1", "researcher", 2.5, true);
        metrics.record_agent_tokens("a1", 1000, 0.02);
        metrics.record_cost(0.02, Some("a1"), Some("m"), 1000);

        let summary = metrics.summary();
        let tasks = &summary.tasks;
        assert_eq!(tasks.total_tasks, 1);
        assert_eq!(tasks.completed_tasks, 1);
        assert_eq!(tasks.pending_tasks, 0);
        assert_eq!(tasks.in_progress_tasks, 0);
        assert_close(tasks.average_duration, 2.5);

        let agent = &summary.agents["a1"];
        assert_eq!(agent.tasks_completed, 1);
        assert_eq!(agent.tokens_used, 1000);
        assert_eq!(agent.api_calls, 1);
        assert_close(agent.cost_usd, 0.02);

        let costs = &summary.costs;
        assert_close(costs.total_cost_usd, 0.02);
        assert_close(costs.cost_by_agent["a1"], 0.02);
        assert_close(costs.cost_by_model["m"], 0.02);
        assert_close(costs.average_cost_per_task, 0.02);
    }

    #[test]
    fn test_unknown_agent_updates_are_noops() {
        let metrics = MetricsAggregator::new();
        metrics.record_agent_tokens("ghost", 500, 1.0);
        metrics.record_agent_quality_score("ghost", 0.9);

        assert!(metrics.agents().is_empty());
    }

    #[test_case(0.75, 0.75 ; "in range")]
    #[test_case(1.7, 1.0 ; "above one")]
    #[test_case(-0.2, 0.0 ; "below zero")]
    fn test_quality_score_clamped(score: f64, expected: f64) {
        let metrics = MetricsAggregator::new();
        metrics.record_agent_task_completion("a1", "coder", 1.0, true);
        metrics.record_agent_quality_score("a1", score);
        assert_eq!(metrics.agent("a1").unwrap().quality_score, expected);
    }

    #[test]
    fn test_task_counters_stay_balanced() {
        let metrics = MetricsAggregator::new();
        for _ in 0..5 {
            metrics.record_task_created();
            assert!(metrics.tasks().is_consistent());
        }
        metrics.record_task_started();
        assert!(metrics.tasks().is_consistent());
        metrics.record_task_started();
        assert!(metrics.tasks().is_consistent());
        metrics.record_task_started();
        metrics.record_task_completed(1.0);
        assert!(metrics.tasks().is_consistent());
        metrics.record_task_failed();
        assert!(metrics.tasks().is_consistent());
        metrics.record_task_cancelled();
        assert!(metrics.tasks().is_consistent());
        metrics.record_task_cancelled();
        assert!(metrics.tasks().is_consistent());

        let tasks = metrics.tasks();
        assert_eq!(tasks.total_tasks, 5);
        assert_eq!(tasks.pending_tasks, 1);
        assert_eq!(tasks.in_progress_tasks, 0);
        assert_eq!(tasks.completed_tasks, 1);
        assert_eq!(tasks.failed_tasks, 1);
        assert_eq!(tasks.cancelled_tasks, 2);
    }

    #[test]
    fn test_cancel_prefers_in_progress() {
        let metrics = MetricsAggregator::new();
        metrics.record_task_created();
        metrics.record_task_created();
        metrics.record_task_started();
        metrics.record_task_cancelled();

        let tasks = metrics.tasks();
        assert_eq!(tasks.in_progress_tasks, 0);
        assert_eq!(tasks.pending_tasks, 1);
        assert_eq!(tasks.cancelled_tasks, 1);
    }

    #[test]
    fn test_cancel_pending_task() {
        let metrics = MetricsAggregator::new();
        metrics.record_task_created();
        metrics.record_task_cancelled();

        let tasks = metrics.tasks();
        assert_eq!(tasks.pending_tasks, 0);
        assert_eq!(tasks.cancelled_tasks, 1);
        assert!(tasks.is_consistent());
    }

    #[test]
    fn test_start_without_pending_is_ignored() {
        let metrics = MetricsAggregator::new();
        metrics.record_task_started();
        assert_eq!(metrics.tasks(), TaskMetrics::default());
    }

    #[test]
    fn test_cancel_with_nothing_outstanding_still_counts() {
        let metrics = MetricsAggregator::new();
        metrics.record_task_cancelled();

        let tasks = metrics.tasks();
        assert_eq!(tasks.cancelled_tasks, 1);
        assert_eq!(tasks.total_tasks, 0);
        assert!(!tasks.is_consistent());
    }

    #[test]
    fn test_qc_rates_follow_task_outcomes() {
        let metrics = MetricsAggregator::new();
        metrics.record_qc_result(true);
        assert_eq!(metrics.tasks().qc_approval_rate, 0.0);

        for _ in 0..4 {
            metrics.record_task_created();
            metrics.record_task_started();
        }
        metrics.record_task_completed(1.0);
        metrics.record_task_completed(1.0);
        metrics.record_task_completed(1.0);
        metrics.record_task_failed();

        metrics.record_qc_result(true);
        let tasks = metrics.tasks();
        assert_close(tasks.qc_approval_rate, 0.75);
        assert_eq!(tasks.qc_rejection_rate, 0.0);

        metrics.record_qc_result(false);
        assert_close(metrics.tasks().qc_rejection_rate, 0.25);
    }

    #[test]
    fn test_resource_update_is_sparse() {
        let metrics = MetricsAggregator::new();
        metrics.update_resource_metrics(ResourceUpdate {
            cpu_usage_percent: Some(42.0),
            max_concurrent_agents: Some(8),
            ..ResourceUpdate::default()
        });
        metrics.update_resource_metrics(ResourceUpdate::active_agents(3));

        let resources = metrics.resources();
        assert_eq!(resources.cpu_usage_percent, 42.0);
        assert_eq!(resources.active_agents, 3);
        assert_eq!(resources.max_concurrent_agents, 8);
        assert_eq!(resources.memory_usage_mb, 0.0);
    }

    #[test]
    fn test_library_events() {
        let metrics = MetricsAggregator::new();
        metrics.record_library_creation("tool", "grep");
        metrics.record_library_creation("skill", "summarize");
        metrics.record_library_creation("mcp", "github");
        metrics.record_library_usage("tool", "grep");
        metrics.record_library_usage("tool", "grep");
        metrics.record_library_effectiveness("skill", "summarize", 0.8);
        metrics.record_library_effectiveness("skill", "summarize", 0.9);

        let library = metrics.library();
        assert_eq!(library.tools_created, 1);
        assert_eq!(library.skills_created, 1);
        assert_eq!(library.mcps_created, 1);
        assert_eq!(library.tools_used, 2);
        assert_eq!(
            library.effectiveness(LibraryKind::Skill)["summarize"],
            0.9
        );
    }

    #[test]
    fn test_unknown_library_kind_is_noop() {
        let metrics = MetricsAggregator::new();
        metrics.record_library_creation("plugin", "x");
        metrics.record_library_usage("plugin", "x");
        metrics.record_library_effectiveness("plugin", "x", 1.0);
        assert_eq!(metrics.library(), LibraryMetrics::default());
    }

    #[test]
    fn test_improvements_are_appended() {
        let metrics = MetricsAggregator::new();
        let mut metadata = HashMap::new();
        metadata.insert("run".to_string(), serde_json::json!(3));

        metrics.record_improvement("latency", 100.0, 80.0, metadata);
        metrics.record_improvement("accuracy", 0.0, 0.5, HashMap::new());

        let improvements = metrics.library().improvements_measured;
        assert_eq!(improvements.len(), 2);
        assert_close(improvements[0].improvement_percent, -20.0);
        assert_eq!(improvements[0].metadata["run"], 3);
        assert_eq!(improvements[1].improvement_percent, 0.0);
    }

    #[test]
    fn test_cost_without_completed_tasks() {
        let metrics = MetricsAggregator::new();
        metrics.record_cost(1.5, None, None, 10);

        let costs = metrics.costs();
        assert_close(costs.total_cost_usd, 1.5);
        assert_eq!(costs.tokens_used, 10);
        assert_eq!(costs.api_calls, 1);
        assert!(costs.cost_by_agent.is_empty());
        assert!(costs.cost_by_model.is_empty());
        assert_eq!(costs.average_cost_per_task, 0.0);
    }

    #[test]
    fn test_cost_average_reads_completed_at_update_time() {
        let metrics = MetricsAggregator::new();
        for _ in 0..2 {
            metrics.record_task_created();
            metrics.record_task_started();
            metrics.record_task_completed(1.0);
        }
        metrics.record_cost(1.0, Some("a1"), None, 0);
        assert_close(metrics.costs().average_cost_per_task, 0.5);

        metrics.record_task_created();
        metrics.record_task_started();
        metrics.record_task_completed(1.0);
        // not recomputed until the next cost event
        assert_close(metrics.costs().average_cost_per_task, 0.5);

        metrics.record_cost(2.0, Some("a1"), None, 0);
        assert_close(metrics.costs().average_cost_per_task, 1.0);
        assert_close(metrics.costs().cost_by_agent["a1"], 3.0);
    }

    #[test]
    fn test_custom_series_keep_order() {
        let metrics = MetricsAggregator::new();
        let mut labels = HashMap::new();
        labels.insert("queue".to_string(), "high".to_string());

        metrics.record_metric("queue_depth", 3.0, Some(labels));
        metrics.record_metric("queue_depth", 5.0, None);

        let series = metrics.metric("queue_depth");
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].value, 3.0);
        assert_eq!(series[0].labels["queue"], "high");
        assert_eq!(series[1].value, 5.0);
        assert!(series[1].labels.is_empty());
        assert!(metrics.metric("missing").is_empty());
    }

    #[test]
    fn test_summary_is_a_copy() {
        let metrics = MetricsAggregator::new();
        metrics.record_task_created();
        let summary = metrics.summary();

        metrics.record_task_created();
        assert_eq!(summary.tasks.total_tasks, 1);
        assert_eq!(metrics.tasks().total_tasks, 2);
    }

    #[test]
    fn test_reset_clears_everything() {
        let metrics = MetricsAggregator::new();
        metrics.record_agent_task_completion("a1", "coder", 1.0, true);
        metrics.record_task_created();
        metrics.update_resource_metrics(ResourceUpdate::active_agents(2));
        metrics.record_library_creation("tool", "t");
        metrics.record_cost(1.0, Some("a1"), Some("m"), 5);
        metrics.record_metric("x", 1.0, None);

        metrics.reset();
        let summary = metrics.summary();
        assert!(summary.agents.is_empty());
        assert_eq!(summary.tasks, TaskMetrics::default());
        assert_eq!(summary.resources, ResourceMetrics::default());
        assert_eq!(summary.library, LibraryMetrics::default());
        assert_eq!(summary.costs, CostMetrics::default());
        assert!(summary.custom_metrics.is_empty());
    }

    #[test]
    fn test_reset_restarts_uptime() {
        let metrics = MetricsAggregator::new();
        thread::sleep(Duration::from_millis(20));
        let before = metrics.uptime();
        metrics.reset();
        assert!(metrics.uptime() < before);
    }

    #[test]
    fn test_concurrent_task_creation() {
        let metrics = Arc::new(MetricsAggregator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let metrics = Arc::clone(&metrics);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        metrics.record_task_created();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let tasks = metrics.tasks();
        assert_eq!(tasks.total_tasks, 8000);
        assert_eq!(tasks.pending_tasks, 8000);
    }

    #[test]
    fn test_recovers_from_poisoned_lock() {
        let metrics = Arc::new(MetricsAggregator::new());
        metrics.record_task_created();

        let poisoner = Arc::clone(&metrics);
        let result = thread::spawn(move || {
            let _guard = poisoner.tasks.write().unwrap();
            panic!("poison the task lock");
        })
        .join();
        assert!(result.is_err());

        metrics.record_task_created();
        assert_eq!(metrics.tasks().total_tasks, 2);
    }

    #[test]
    fn test_summary_serializes() {
        let metrics = MetricsAggregator::new();
        metrics.record_agent_task_completion("a1", "researcher", 1.0, true);
        let json = serde_json::to_value(metrics.summary()).unwrap();

        assert!(json["uptime_seconds"].is_number());
        assert_eq!(json["agents"]["a1"]["tasks_completed"], 1);
        assert_eq!(json["tasks"]["total_tasks"], 0);
        assert!(json["custom_metrics"].is_object());
    }

    #[test]
    fn test_timer() {
        let timer = Timer::start();
        thread::sleep(Duration::from_millis(10));
        assert!(timer.elapsed_ms() >= 10);
        assert!(timer.elapsed_secs() >= 0.01);
    }

    #[test]
    fn test_timer_default() {
        let timer = Timer::default();
        assert!(timer.elapsed_secs() < 1.0);
    }
}
