//! Error reports produced by failing workflows.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use agent_orchestrator::agents::AgentManager;
use agent_orchestrator::error::{AppError, ErrorCategory, ErrorReport, OrchestratorError};
use agent_orchestrator::metrics::MetricsAggregator;

#[tokio::test]
async fn test_unknown_task_type_report() {
    let manager = AgentManager::with_default_agents(Arc::new(MetricsAggregator::new()), 2);

    let err = manager.run_task("translator", "hola").await.unwrap_err();
    let report = ErrorReport::from(&err);

    assert_eq!(report.error_type, ErrorCategory::Agent);
    assert_eq!(report.error_code, "AGENT_NOT_FOUND");
    assert_eq!(report.details["agent_id"], "translator");
    assert!(!err.is_retryable());
}

#[test]
fn test_concurrency_report_serializes() {
    let err = OrchestratorError::ConcurrencyLimit {
        current: 3,
        limit: 3,
    };

    let json = serde_json::to_value(err.to_report()).unwrap();

    assert_eq!(json["error_type"], "resource");
    assert_eq!(json["error_code"], "CONCURRENCY_LIMIT");
    assert_eq!(json["details"]["limit"], 3);
    assert_eq!(json["message"], err.to_string());
    assert!(err.is_retryable());
}

#[test]
fn test_app_error_wraps_orchestrator_error() {
    let err: AppError = OrchestratorError::TaskTimeout {
        task_id: "t-1".to_string(),
        timeout_secs: 30,
    }
    .into();

    assert!(err.to_string().starts_with("Orchestration error:"));
    assert!(matches!(
        err,
        AppError::Orchestrator(OrchestratorError::TaskTimeout { timeout_secs: 30, .. })
    ));
}
