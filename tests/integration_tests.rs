//! Integration tests for the agent orchestrator.
//!
//! These tests verify end-to-end flows including:
//! - Setup run → persisted snapshot → configuration overrides
//! - Configuration loading from the environment
//! - Metrics summary export

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use agent_orchestrator::config::Config;
use agent_orchestrator::error::{AppError, ConfigError};
use agent_orchestrator::metrics::{MetricsAggregator, ResourceUpdate};
use agent_orchestrator::planner::plan;
use agent_orchestrator::setup::{
    SetupRunner, WorkspaceSnapshot, REQUIRED_DIRS, WORKSPACE_CONFIG_FILE,
};
use agent_orchestrator::system::{DiskType, SystemSnapshot};
use agent_orchestrator::traits::{Tool, ToolProbe};
use async_trait::async_trait;
use serial_test::serial;
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// Probe that reports a fixed set of tools.
struct StaticProbe {
    git: bool,
}

#[async_trait]
impl ToolProbe for StaticProbe {
    async fn is_available(&self, tool: Tool) -> bool {
        matches!(tool, Tool::Git) && self.git
    }
}

fn workstation() -> SystemSnapshot {
    SystemSnapshot {
        os_type: "Linux".to_string(),
        os_version: "6.8.0".to_string(),
        cpu_count: 4,
        cpu_freq_mhz: 3200.0,
        ram_total_gb: 16.0,
        ram_available_gb: 10.0,
        disk_total_gb: 512.0,
        disk_free_gb: 50.0,
        disk_type: DiskType::Ssd,
        runtime_version: "0.1.0".to_string(),
        has_git: true,
        has_node: false,
        has_editor: false,
        network_speed_mbps: None,
    }
}

fn clear_env() {
    let stale: Vec<String> = std::env::vars()
        .map(|(key, _)| key)
        .filter(|key| key.starts_with("ORCHESTRATOR_"))
        .collect();
    for key in stale {
        std::env::remove_var(key);
    }
}

// ============================================================================
// Setup Workflow
// ============================================================================

#[test]
fn test_setup_then_config_overrides() {
    let root = TempDir::new().unwrap();

    let report = SetupRunner::new()
        .create_dirs(true)
        .run_with_profile(root.path(), workstation())
        .unwrap();

    assert!(report.validation.overall, "{:?}", report.validation.issues);
    for dir in REQUIRED_DIRS {
        assert!(root.path().join(dir).is_dir());
    }

    let mut config = Config {
        project_path: root.path().to_path_buf(),
        ..Config::default()
    };
    assert!(config.load_workspace_overrides().unwrap());
    assert_eq!(config.max_concurrent_agents, 8);
    assert_eq!(config.max_memory_per_agent_mb, 896);
    assert!((config.max_cache_size_gb - 5.0).abs() < f64::EPSILON);
    assert!((config.max_log_size_gb - 1.0).abs() < f64::EPSILON);
}

#[test]
fn test_project_path_override_finds_setup_snapshot() {
    let root = TempDir::new().unwrap();
    SetupRunner::new()
        .run_with_profile(root.path(), workstation())
        .unwrap();

    let mut config = Config::default().with_project_path(Some(root.path().to_path_buf()));
    assert_eq!(
        config.workspace_config_path(),
        root.path().join(WORKSPACE_CONFIG_FILE)
    );
    assert!(config.load_workspace_overrides().unwrap());
    assert_eq!(config.max_concurrent_agents, 8);

    let unchanged = Config::default().with_project_path(None);
    assert_eq!(unchanged.project_path, Config::default().project_path);
}

#[tokio::test]
async fn test_setup_without_git_reports_invalid_tools() {
    let root = TempDir::new().unwrap();

    let report = SetupRunner::new()
        .with_probe(Arc::new(StaticProbe { git: false }))
        .with_required_dirs(Vec::<std::path::PathBuf>::new())
        .run(root.path())
        .await
        .unwrap();

    assert!(!report.system_profile.has_git);
    assert!(!report.validation.tools);
    assert!(!report.validation.overall);
    assert!(root.path().join(WORKSPACE_CONFIG_FILE).exists());
}

#[test]
fn test_snapshot_file_is_plain_json() {
    let root = TempDir::new().unwrap();
    SetupRunner::new()
        .run_with_profile(root.path(), workstation())
        .unwrap();

    let raw = std::fs::read_to_string(root.path().join(WORKSPACE_CONFIG_FILE)).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();

    for key in [
        "system_profile",
        "resource_constraints",
        "setup_timestamp",
        "setup_version",
    ] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    assert_eq!(json["resource_constraints"]["recommended_workers"], 4);
    assert_eq!(json["resource_constraints"]["enable_disk_cache"], true);
}

#[test]
fn test_hand_written_snapshot_overrides() {
    let root = TempDir::new().unwrap();
    let profile = SystemSnapshot {
        cpu_count: 1,
        ram_available_gb: 3.5,
        ..workstation()
    };
    let snapshot = WorkspaceSnapshot::new(profile.clone(), plan(&profile), chrono::Utc::now());
    snapshot
        .save(&root.path().join(WORKSPACE_CONFIG_FILE))
        .unwrap();

    let mut config = Config {
        project_path: root.path().to_path_buf(),
        ..Config::default()
    };
    config.load_workspace_overrides().unwrap();

    assert_eq!(config.max_concurrent_agents, 2);
    assert_eq!(config.max_memory_per_agent_mb, 512);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
#[serial]
fn test_env_config_reads_snapshot_path() {
    clear_env();
    let root = TempDir::new().unwrap();
    let path = root.path().join("elsewhere.json");
    std::env::set_var("ORCHESTRATOR_WORKSPACE_CONFIG", &path);

    let config = Config::from_env().unwrap();
    assert_eq!(config.workspace_config_path(), path);

    clear_env();
}

#[test]
#[serial]
fn test_env_config_error_converts_to_app_error() {
    clear_env();
    std::env::set_var("ORCHESTRATOR_MAX_LOG_SIZE_GB", "50");

    let err: AppError = Config::from_env().unwrap_err().into();
    assert!(matches!(
        err,
        AppError::Config(ConfigError::InvalidValue { ref var, .. })
            if var == "ORCHESTRATOR_MAX_LOG_SIZE_GB"
    ));
    assert!(err.to_string().starts_with("Configuration error:"));

    clear_env();
}

// ============================================================================
// Metrics Export
// ============================================================================

#[test]
fn test_summary_export_shape() {
    let metrics = MetricsAggregator::new();
    metrics.record_task_created();
    metrics.update_resource_metrics(ResourceUpdate {
        cpu_usage_percent: Some(12.5),
        ..ResourceUpdate::default()
    });
    metrics.record_library_creation("mcp", "filesystem");

    let json = serde_json::to_value(metrics.summary()).unwrap();

    for key in [
        "uptime_seconds",
        "timestamp",
        "agents",
        "tasks",
        "resources",
        "library",
        "costs",
        "custom_metrics",
    ] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    assert_eq!(json["tasks"]["pending_tasks"], 1);
    assert_eq!(json["resources"]["cpu_usage_percent"], 12.5);
    assert_eq!(json["library"]["mcps_created"], 1);
}
