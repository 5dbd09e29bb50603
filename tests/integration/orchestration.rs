//! Orchestration workflow tests.
//!
//! Route → execute → account, through the public API only.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use agent_orchestrator::agents::{AgentManager, SimulatedAgent, CODER, RESEARCHER};
use agent_orchestrator::error::OrchestratorError;
use agent_orchestrator::metrics::MetricsAggregator;
use agent_orchestrator::planner::plan;
use agent_orchestrator::system::{DiskType, SystemSnapshot};
use agent_orchestrator::traits::Agent;
use async_trait::async_trait;

/// Agent that sleeps before answering.
struct SlowAgent {
    delay: Duration,
}

#[async_trait]
impl Agent for SlowAgent {
    fn name(&self) -> String {
        "slow-agent".to_string()
    }

    fn role(&self) -> String {
        "Sleeper".to_string()
    }

    async fn execute(&self, task: &str) -> Result<String, OrchestratorError> {
        tokio::time::sleep(self.delay).await;
        Ok(format!("slept on {task}"))
    }
}

/// Agent that hands control back to the scheduler a few times.
struct YieldingAgent;

#[async_trait]
impl Agent for YieldingAgent {
    fn name(&self) -> String {
        "yielding-agent".to_string()
    }

    fn role(&self) -> String {
        "Yielder".to_string()
    }

    async fn execute(&self, task: &str) -> Result<String, OrchestratorError> {
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        Ok(task.to_string())
    }
}

fn small_host() -> SystemSnapshot {
    SystemSnapshot {
        os_type: "Linux".to_string(),
        os_version: "6.8.0".to_string(),
        cpu_count: 1,
        cpu_freq_mhz: 2000.0,
        ram_total_gb: 4.0,
        ram_available_gb: 3.5,
        disk_total_gb: 128.0,
        disk_free_gb: 20.0,
        disk_type: DiskType::Ssd,
        runtime_version: "0.1.0".to_string(),
        has_git: true,
        has_node: false,
        has_editor: false,
        network_speed_mbps: None,
    }
}

#[tokio::test]
async fn test_default_workflow_feeds_metrics() {
    let metrics = Arc::new(MetricsAggregator::new());
    let manager = AgentManager::with_default_agents(Arc::clone(&metrics), 4);

    let outcomes = manager.orchestrate().await.unwrap();

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].task_type, RESEARCHER);
    assert_eq!(outcomes[1].task_type, CODER);

    let summary = metrics.summary();
    assert_eq!(summary.tasks.total_tasks, 2);
    assert_eq!(summary.tasks.completed_tasks, 2);
    assert!(summary.tasks.is_consistent());
    assert_eq!(summary.agents.len(), 2);
    assert_eq!(summary.resources.active_agents, 0);
    assert_eq!(summary.resources.max_concurrent_agents, 4);
}

#[tokio::test]
async fn test_planned_limit_caps_parallel_batch() {
    let constraints = plan(&small_host());
    assert_eq!(constraints.max_concurrent_agents, 2);

    let metrics = Arc::new(MetricsAggregator::new());
    let mut manager = AgentManager::new(Arc::clone(&metrics), constraints.max_concurrent_agents);
    manager.register(
        "slow",
        Arc::new(SlowAgent {
            delay: Duration::from_millis(300),
        }),
    );
    let manager = Arc::new(manager);

    let batch = (0..5)
        .map(|i| ("slow".to_string(), format!("job-{i}")))
        .collect();
    let results = manager.run_batch(batch).await;

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let refused = results
        .iter()
        .filter(|r| matches!(r, Err(OrchestratorError::ConcurrencyLimit { limit: 2, .. })))
        .count();
    assert!((1..=2).contains(&succeeded), "succeeded = {succeeded}");
    assert_eq!(succeeded + refused, 5);

    let tasks = metrics.tasks();
    assert_eq!(tasks.completed_tasks, succeeded as u64);
    assert_eq!(tasks.total_tasks, succeeded as u64);
    assert_eq!(manager.active_agents(), 0);
}

#[tokio::test]
async fn test_slots_are_reused_sequentially() {
    let metrics = Arc::new(MetricsAggregator::new());
    let manager = AgentManager::with_default_agents(Arc::clone(&metrics), 1);

    for _ in 0..5 {
        manager.run_task(CODER, "again").await.unwrap();
    }

    assert_eq!(metrics.tasks().completed_tasks, 5);
    let coder = metrics.agent("code-agent").unwrap();
    assert_eq!(coder.tasks_completed, 5);
    assert!((coder.success_rate() - 1.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_custom_agent_registration_replaces_default() {
    let metrics = Arc::new(MetricsAggregator::new());
    let mut manager = AgentManager::with_default_agents(Arc::clone(&metrics), 2);
    manager.register(
        RESEARCHER,
        Arc::new(SlowAgent {
            delay: Duration::from_millis(1),
        }),
    );

    let outcome = manager.run_task(RESEARCHER, "docs").await.unwrap();

    assert_eq!(outcome.agent_name, "slow-agent");
    assert_eq!(outcome.output, "slept on docs");
    assert!(metrics.agent("research-agent").is_none());
}

#[tokio::test]
async fn test_simulated_agent_identity() {
    let researcher = SimulatedAgent::researcher();
    assert_eq!(researcher.name(), "research-agent");
    assert_eq!(researcher.role(), "Researcher");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_active_gauge_settles_after_parallel_batches() {
    let metrics = Arc::new(MetricsAggregator::new());
    let mut manager = AgentManager::new(Arc::clone(&metrics), 256);
    manager.register("yield", Arc::new(YieldingAgent));
    let manager = Arc::new(manager);

    for round in 0..200 {
        let batch = (0..128)
            .map(|i| ("yield".to_string(), format!("job-{i}")))
            .collect();
        let results = manager.run_batch(batch).await;

        assert!(results.iter().all(Result::is_ok));
        assert_eq!(manager.active_agents(), 0);
        assert_eq!(
            metrics.resources().active_agents,
            0,
            "gauge left behind after round {round}"
        );
    }
    assert_eq!(metrics.tasks().completed_tasks, 200 * 128);
}
