//! Agent routing and lifecycle accounting.
//!
//! [`AgentManager`] maps task types to [`Agent`]s, enforces the planner's
//! concurrent agent limit and reports every task and agent transition to a
//! shared [`MetricsAggregator`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::error::OrchestratorError;
use crate::metrics::{MetricsAggregator, ResourceUpdate, Timer};
use crate::traits::Agent;

/// Task type served by [`SimulatedAgent::researcher`].
pub const RESEARCHER: &str = "researcher";

/// Task type served by [`SimulatedAgent::coder`].
pub const CODER: &str = "coder";

/// Custom metric series holding per-task durations.
pub const TASK_DURATION_METRIC: &str = "task_duration_seconds";

/// Workflow run by [`AgentManager::orchestrate`].
pub const DEFAULT_WORKFLOW: &[(&str, &str)] = &[
    (RESEARCHER, "Best practices for structuring a multi-agent workspace"),
    (CODER, "Create the workspace scaffold"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Specialty {
    Research,
    Code,
}

/// Agent that answers with canned output instead of calling a model.
#[derive(Debug, Clone)]
pub struct SimulatedAgent {
    name: String,
    role: String,
    specialty: Specialty,
}

impl SimulatedAgent {
    /// Research agent.
    #[must_use]
    pub fn researcher() -> Self {
        Self {
            name: "research-agent".to_string(),
            role: "Researcher".to_string(),
            specialty: Specialty::Research,
        }
    }

    /// Coding agent.
    #[must_use]
    pub fn coder() -> Self {
        Self {
            name: "code-agent".to_string(),
            role: "Coder".to_string(),
            specialty: Specialty::Code,
        }
    }
}

#[async_trait]
impl Agent for SimulatedAgent {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn role(&self) -> String {
        self.role.clone()
    }

    async fn execute(&self, task: &str) -> Result<String, OrchestratorError> {
        match self.specialty {
            Specialty::Research => {
                tracing::info!(agent = %self.name, task, "Researching");
                Ok(format!("Research findings for '{task}': [simulated output]"))
            }
            Specialty::Code => {
                tracing::info!(agent = %self.name, task, "Coding");
                Ok(format!("Code generated for '{task}': [simulated output]"))
            }
        }
    }
}

/// Result of one routed task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    /// Generated task identifier.
    pub task_id: Uuid,
    /// Task type used for routing.
    pub task_type: String,
    /// Name of the agent that ran the task.
    pub agent_name: String,
    /// Agent output.
    pub output: String,
    /// Wall time, in seconds.
    pub duration_secs: f64,
}

/// Routes tasks to agents under a concurrency limit.
pub struct AgentManager {
    agents: HashMap<String, Arc<dyn Agent>>,
    metrics: Arc<MetricsAggregator>,
    max_concurrent_agents: u32,
    /// Running agents; the resources gauge is written while this is held.
    active: Mutex<u32>,
}

impl std::fmt::Debug for AgentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentManager")
            .field("task_types", &self.task_types())
            .field("max_concurrent_agents", &self.max_concurrent_agents)
            .field("active", &self.active_agents())
            .finish_non_exhaustive()
    }
}

impl AgentManager {
    /// Manager with no agents. A limit of zero is raised to one.
    #[must_use]
    pub fn new(metrics: Arc<MetricsAggregator>, max_concurrent_agents: u32) -> Self {
        let max_concurrent_agents = max_concurrent_agents.max(1);
        metrics.update_resource_metrics(ResourceUpdate {
            active_agents: Some(0),
            max_concurrent_agents: Some(max_concurrent_agents),
            ..ResourceUpdate::default()
        });
        Self {
            agents: HashMap::new(),
            metrics,
            max_concurrent_agents,
            active: Mutex::new(0),
        }
    }

    /// Manager with the simulated researcher and coder registered.
    #[must_use]
    pub fn with_default_agents(metrics: Arc<MetricsAggregator>, max_concurrent_agents: u32) -> Self {
        let mut manager = Self::new(metrics, max_concurrent_agents);
        manager.register(RESEARCHER, Arc::new(SimulatedAgent::researcher()));
        manager.register(CODER, Arc::new(SimulatedAgent::coder()));
        manager
    }

    /// Route `task_type` to `agent`, replacing any previous registration.
    pub fn register(&mut self, task_type: impl Into<String>, agent: Arc<dyn Agent>) {
        let task_type = task_type.into();
        tracing::debug!(task_type = %task_type, agent = %agent.name(), "Agent registered");
        self.agents.insert(task_type, agent);
    }

    /// Registered task types, sorted.
    #[must_use]
    pub fn task_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.agents.keys().cloned().collect();
        types.sort();
        types
    }

    /// Agents currently executing.
    #[must_use]
    pub fn active_agents(&self) -> u32 {
        *self.lock_active()
    }

    /// Concurrency limit.
    #[must_use]
    pub const fn max_concurrent_agents(&self) -> u32 {
        self.max_concurrent_agents
    }

    /// Shared aggregator.
    #[must_use]
    pub const fn metrics(&self) -> &Arc<MetricsAggregator> {
        &self.metrics
    }

    /// Run one task on the agent registered for `task_type`.
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::AgentNotFound`] if no agent serves `task_type`
    /// - [`OrchestratorError::ConcurrencyLimit`] if the limit is reached
    /// - whatever the agent returns; the task is then counted as failed
    pub async fn run_task(
        &self,
        task_type: &str,
        description: &str,
    ) -> Result<TaskOutcome, OrchestratorError> {
        let agent = self
            .agents
            .get(task_type)
            .cloned()
            .ok_or_else(|| OrchestratorError::AgentNotFound {
                agent_id: task_type.to_string(),
            })?;

        let slot = self.acquire_slot()?;
        let task_id = Uuid::new_v4();
        let agent_name = agent.name();

        self.metrics.record_task_created();
        self.metrics.record_task_started();
        tracing::info!(%task_id, task_type, agent = %agent_name, "Task started");

        let timer = Timer::start();
        let result = agent.execute(description).await;
        let duration_secs = timer.elapsed_secs();
        drop(slot);

        self.metrics.record_metric(
            TASK_DURATION_METRIC,
            duration_secs,
            Some(HashMap::from([("task_type".to_string(), task_type.to_string())])),
        );

        match result {
            Ok(output) => {
                self.metrics.record_task_completed(duration_secs);
                self.metrics
                    .record_agent_task_completion(&agent_name, task_type, duration_secs, true);
                tracing::info!(%task_id, duration_secs, "Task completed");
                Ok(TaskOutcome {
                    task_id,
                    task_type: task_type.to_string(),
                    agent_name,
                    output,
                    duration_secs,
                })
            }
            Err(e) => {
                self.metrics.record_task_failed();
                self.metrics
                    .record_agent_task_completion(&agent_name, task_type, duration_secs, false);
                tracing::warn!(%task_id, error = %e, code = e.code(), "Task failed");
                Err(e)
            }
        }
    }

    /// Run tasks concurrently; results come back in input order.
    ///
    /// Tasks beyond the concurrency limit fail with
    /// [`OrchestratorError::ConcurrencyLimit`] rather than waiting.
    pub async fn run_batch(
        self: &Arc<Self>,
        tasks: Vec<(String, String)>,
    ) -> Vec<Result<TaskOutcome, OrchestratorError>> {
        let count = tasks.len();
        let mut set = JoinSet::new();
        for (index, (task_type, description)) in tasks.into_iter().enumerate() {
            let manager = Arc::clone(self);
            set.spawn(async move { (index, manager.run_task(&task_type, &description).await) });
        }

        let mut results: Vec<Option<Result<TaskOutcome, OrchestratorError>>> =
            (0..count).map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => tracing::error!(error = %e, "Task panicked"),
            }
        }

        results
            .into_iter()
            .map(|result| {
                result.unwrap_or_else(|| {
                    Err(OrchestratorError::TaskExecution {
                        task_id: "unknown".to_string(),
                        reason: "task panicked".to_string(),
                    })
                })
            })
            .collect()
    }

    /// Run [`DEFAULT_WORKFLOW`] in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first task error.
    pub async fn orchestrate(&self) -> Result<Vec<TaskOutcome>, OrchestratorError> {
        tracing::info!(steps = DEFAULT_WORKFLOW.len(), "Orchestrator initialized");
        let mut outcomes = Vec::with_capacity(DEFAULT_WORKFLOW.len());
        for (task_type, description) in DEFAULT_WORKFLOW {
            outcomes.push(self.run_task(task_type, description).await?);
        }
        Ok(outcomes)
    }

    fn lock_active(&self) -> MutexGuard<'_, u32> {
        self.active.lock().unwrap_or_else(|poison_error| {
            tracing::warn!(
                error = %poison_error,
                "Active agent counter lock poisoned, using recovered count"
            );
            poison_error.into_inner()
        })
    }

    fn acquire_slot(&self) -> Result<ActiveSlot<'_>, OrchestratorError> {
        let limit = self.max_concurrent_agents;
        let mut active = self.lock_active();
        if *active >= limit {
            let current = *active;
            tracing::warn!(current, limit, "Concurrency limit reached");
            return Err(OrchestratorError::ConcurrencyLimit { current, limit });
        }
        *active += 1;
        self.metrics
            .update_resource_metrics(ResourceUpdate::active_agents(*active));
        Ok(ActiveSlot { manager: self })
    }

    fn release_slot(&self) {
        let mut active = self.lock_active();
        *active = active.saturating_sub(1);
        self.metrics
            .update_resource_metrics(ResourceUpdate::active_agents(*active));
    }
}

/// Occupies one concurrency slot until dropped.
struct ActiveSlot<'a> {
    manager: &'a AgentManager,
}

impl Drop for ActiveSlot<'_> {
    fn drop(&mut self) {
        self.manager.release_slot();
    }
}
