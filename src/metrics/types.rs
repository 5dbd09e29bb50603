//! Metric family records.
//!
//! Every type here is a plain value: the aggregator owns the live copies and
//! hands out clones.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Running statistics for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMetrics {
    /// Agent identifier.
    pub agent_id: String,
    /// Agent type (e.g. "researcher").
    pub agent_type: String,
    /// Successful task executions.
    pub tasks_completed: u64,
    /// Failed task executions.
    pub tasks_failed: u64,
    /// Sum of execution times, in seconds.
    pub total_execution_time: f64,
    /// `total_execution_time / (tasks_completed + tasks_failed)`.
    pub average_execution_time: f64,
    /// Tokens consumed.
    pub tokens_used: u64,
    /// API calls made.
    pub api_calls: u64,
    /// Spend in USD.
    pub cost_usd: f64,
    /// Latest quality score in `[0, 1]`.
    pub quality_score: f64,
    /// Time of the latest completion event.
    pub last_active: Option<DateTime<Utc>>,
}

impl AgentMetrics {
    /// Create an empty record.
    #[must_use]
    pub fn new(agent_id: impl Into<String>, agent_type: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            agent_type: agent_type.into(),
            tasks_completed: 0,
            tasks_failed: 0,
            total_execution_time: 0.0,
            average_execution_time: 0.0,
            tokens_used: 0,
            api_calls: 0,
            cost_usd: 0.0,
            quality_score: 0.0,
            last_active: None,
        }
    }

    /// Total executions, successful or not.
    #[must_use]
    pub const fn total_tasks(&self) -> u64 {
        self.tasks_completed + self.tasks_failed
    }

    /// Fraction of executions that succeeded (0.0 before any execution).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        match self.total_tasks() {
            0 => 0.0,
            total => self.tasks_completed as f64 / total as f64,
        }
    }
}

/// Task lifecycle counters.
///
/// `pending + in_progress + completed + failed + cancelled == total` after
/// every completed transition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskMetrics {
    /// Tasks ever created.
    pub total_tasks: u64,
    /// Tasks created but not started.
    pub pending_tasks: u64,
    /// Tasks running.
    pub in_progress_tasks: u64,
    /// Tasks finished successfully.
    pub completed_tasks: u64,
    /// Tasks finished unsuccessfully.
    pub failed_tasks: u64,
    /// Tasks cancelled.
    pub cancelled_tasks: u64,
    /// `total_duration / completed_tasks`.
    pub average_duration: f64,
    /// Sum of completed task durations, in seconds.
    pub total_duration: f64,
    /// Share of resolved tasks that completed, refreshed on QC approvals.
    pub qc_approval_rate: f64,
    /// Share of resolved tasks that failed, refreshed on QC rejections.
    pub qc_rejection_rate: f64,
}

impl TaskMetrics {
    /// Sum of all per-state counters.
    #[must_use]
    pub const fn accounted(&self) -> u64 {
        self.pending_tasks
            + self.in_progress_tasks
            + self.completed_tasks
            + self.failed_tasks
            + self.cancelled_tasks
    }

    /// Returns true if every created task is in exactly one state.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.accounted() == self.total_tasks
    }
}

/// Latest host resource readings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceMetrics {
    /// CPU usage percentage.
    pub cpu_usage_percent: f64,
    /// Memory in use, in MB.
    pub memory_usage_mb: f64,
    /// Memory available, in MB.
    pub memory_available_mb: f64,
    /// Disk in use, in GB.
    pub disk_usage_gb: f64,
    /// Free disk, in GB.
    pub disk_free_gb: f64,
    /// Cache size, in MB.
    pub cache_size_mb: f64,
    /// Cache hit rate in `[0, 1]`.
    pub cache_hit_rate: f64,
    /// Agents currently running.
    pub active_agents: u32,
    /// Planner limit on concurrent agents (0 when not set).
    pub max_concurrent_agents: u32,
}

impl ResourceMetrics {
    /// Returns true when a limit is set and the active agents have reached it.
    #[must_use]
    pub const fn at_capacity(&self) -> bool {
        self.max_concurrent_agents > 0 && self.active_agents >= self.max_concurrent_agents
    }
}

/// Sparse update for [`ResourceMetrics`]: `None` fields keep their value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceUpdate {
    /// CPU usage percentage.
    pub cpu_usage_percent: Option<f64>,
    /// Memory in use, in MB.
    pub memory_usage_mb: Option<f64>,
    /// Memory available, in MB.
    pub memory_available_mb: Option<f64>,
    /// Disk in use, in GB.
    pub disk_usage_gb: Option<f64>,
    /// Free disk, in GB.
    pub disk_free_gb: Option<f64>,
    /// Cache size, in MB.
    pub cache_size_mb: Option<f64>,
    /// Cache hit rate.
    pub cache_hit_rate: Option<f64>,
    /// Agents currently running.
    pub active_agents: Option<u32>,
    /// Planner limit on concurrent agents.
    pub max_concurrent_agents: Option<u32>,
}

impl ResourceUpdate {
    /// Update carrying only the active agent count.
    #[must_use]
    pub fn active_agents(active: u32) -> Self {
        Self {
            active_agents: Some(active),
            ..Self::default()
        }
    }

    pub(crate) fn apply(&self, target: &mut ResourceMetrics) {
        macro_rules! overwrite {
            ($($field:ident),*) => {
                $(if let Some(value) = self.$field {
                    target.$field = value;
                })*
            };
        }
        overwrite!(
            cpu_usage_percent,
            memory_usage_mb,
            memory_available_mb,
            disk_usage_gb,
            disk_free_gb,
            cache_size_mb,
            cache_hit_rate,
            active_agents,
            max_concurrent_agents
        );
    }
}

/// Catalog kind tracked by [`LibraryMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LibraryKind {
    /// Tool.
    Tool,
    /// Skill.
    Skill,
    /// MCP server.
    Mcp,
}

impl LibraryKind {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tool => "tool",
            Self::Skill => "skill",
            Self::Mcp => "mcp",
        }
    }
}

impl FromStr for LibraryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tool" => Ok(Self::Tool),
            "skill" => Ok(Self::Skill),
            "mcp" => Ok(Self::Mcp),
            other => Err(format!("unknown library kind: {other}")),
        }
    }
}

impl std::fmt::Display for LibraryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One measured improvement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementRecord {
    /// What was improved.
    #[serde(rename = "type")]
    pub improvement_type: String,
    /// Value before the change.
    pub baseline: f64,
    /// Value after the change.
    pub new_value: f64,
    /// `(new_value - baseline) / baseline * 100`, or 0 when `baseline <= 0`.
    pub improvement_percent: f64,
    /// When the improvement was recorded.
    pub timestamp: DateTime<Utc>,
    /// Caller-supplied context.
    pub metadata: HashMap<String, Value>,
}

impl ImprovementRecord {
    /// Create a record stamped now.
    #[must_use]
    pub fn new(
        improvement_type: impl Into<String>,
        baseline: f64,
        new_value: f64,
        metadata: HashMap<String, Value>,
    ) -> Self {
        let improvement_percent = if baseline > 0.0 {
            (new_value - baseline) / baseline * 100.0
        } else {
            0.0
        };
        Self {
            improvement_type: improvement_type.into(),
            baseline,
            new_value,
            improvement_percent,
            timestamp: Utc::now(),
            metadata,
        }
    }
}

/// Tool, skill and MCP catalog statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryMetrics {
    /// Tools created.
    pub tools_created: u64,
    /// Skills created.
    pub skills_created: u64,
    /// MCP servers created.
    pub mcps_created: u64,
    /// Tool invocations.
    pub tools_used: u64,
    /// Skill invocations.
    pub skills_used: u64,
    /// MCP invocations.
    pub mcps_used: u64,
    /// Latest effectiveness score per tool.
    pub tool_effectiveness: HashMap<String, f64>,
    /// Latest effectiveness score per skill.
    pub skill_effectiveness: HashMap<String, f64>,
    /// Latest effectiveness score per MCP server.
    pub mcp_effectiveness: HashMap<String, f64>,
    /// Append-only improvement log.
    pub improvements_measured: Vec<ImprovementRecord>,
}

impl LibraryMetrics {
    pub(crate) fn created_mut(&mut self, kind: LibraryKind) -> &mut u64 {
        match kind {
            LibraryKind::Tool => &mut self.tools_created,
            LibraryKind::Skill => &mut self.skills_created,
            LibraryKind::Mcp => &mut self.mcps_created,
        }
    }

    pub(crate) fn used_mut(&mut self, kind: LibraryKind) -> &mut u64 {
        match kind {
            LibraryKind::Tool => &mut self.tools_used,
            LibraryKind::Skill => &mut self.skills_used,
            LibraryKind::Mcp => &mut self.mcps_used,
        }
    }

    /// Effectiveness map for a kind.
    #[must_use]
    pub const fn effectiveness(&self, kind: LibraryKind) -> &HashMap<String, f64> {
        match kind {
            LibraryKind::Tool => &self.tool_effectiveness,
            LibraryKind::Skill => &self.skill_effectiveness,
            LibraryKind::Mcp => &self.mcp_effectiveness,
        }
    }

    pub(crate) fn effectiveness_mut(&mut self, kind: LibraryKind) -> &mut HashMap<String, f64> {
        match kind {
            LibraryKind::Tool => &mut self.tool_effectiveness,
            LibraryKind::Skill => &mut self.skill_effectiveness,
            LibraryKind::Mcp => &mut self.mcp_effectiveness,
        }
    }
}

/// Spend tracking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostMetrics {
    /// Total spend in USD.
    pub total_cost_usd: f64,
    /// Tokens billed.
    pub tokens_used: u64,
    /// Billed API calls.
    pub api_calls: u64,
    /// Spend per agent id.
    pub cost_by_agent: HashMap<String, f64>,
    /// Spend per model.
    pub cost_by_model: HashMap<String, f64>,
    /// `total_cost_usd / completed_tasks` at the time of the last cost event.
    pub average_cost_per_task: f64,
}

/// One sample of a named custom metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    /// Sample value.
    pub value: f64,
    /// When the sample was recorded.
    pub timestamp: DateTime<Utc>,
    /// Sample labels.
    pub labels: HashMap<String, String>,
}

impl MetricValue {
    /// Create a sample stamped now.
    #[must_use]
    pub fn new(value: f64, labels: HashMap<String, String>) -> Self {
        Self {
            value,
            timestamp: Utc::now(),
            labels,
        }
    }
}

/// Point-in-time copy of every metric family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    /// Seconds since creation or the last reset.
    pub uptime_seconds: f64,
    /// When the summary was taken.
    pub timestamp: DateTime<Utc>,
    /// Per-agent statistics.
    pub agents: HashMap<String, AgentMetrics>,
    /// Task lifecycle counters.
    pub tasks: TaskMetrics,
    /// Latest resource readings.
    pub resources: ResourceMetrics,
    /// Catalog statistics.
    pub library: LibraryMetrics,
    /// Spend tracking.
    pub costs: CostMetrics,
    /// Custom metric series in insertion order.
    pub custom_metrics: HashMap<String, Vec<MetricValue>>,
}
