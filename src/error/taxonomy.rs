//! Closed taxonomy of orchestration failures.
//!
//! Every failure the orchestrator can surface is one tagged variant of
//! [`OrchestratorError`]. Callers pattern-match on the variant (or on its
//! [`ErrorCategory`]) instead of walking a class hierarchy, and can turn any
//! error into a serializable [`ErrorReport`] for logs or API responses.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Family an [`OrchestratorError`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Agent lookup and lifecycle.
    Agent,
    /// Task lifecycle.
    Task,
    /// Configuration loading and validation.
    Configuration,
    /// Memory storage and retrieval.
    Memory,
    /// External APIs and tools.
    Integration,
    /// Quality-control review.
    Qc,
    /// Host resource limits.
    Resource,
    /// Tool, skill and MCP catalogs.
    Library,
    /// Input validation.
    Validation,
    /// Inter-agent messaging.
    Communication,
}

/// Orchestration failure.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OrchestratorError {
    /// No agent is registered under the id.
    #[error("Agent not found: {agent_id}")]
    AgentNotFound {
        /// The missing agent id.
        agent_id: String,
    },

    /// Agent failed to initialize.
    #[error("Failed to initialize agent {agent_id}: {reason}")]
    AgentInitialization {
        /// The agent id.
        agent_id: String,
        /// Why initialization failed.
        reason: String,
    },

    /// Agent cannot accept new work.
    #[error("Agent {agent_id} is busy")]
    AgentBusy {
        /// The agent id.
        agent_id: String,
    },

    /// Agent was already shut down.
    #[error("Agent {agent_id} has been terminated")]
    AgentTerminated {
        /// The agent id.
        agent_id: String,
    },

    /// No task is registered under the id.
    #[error("Task not found: {task_id}")]
    TaskNotFound {
        /// The missing task id.
        task_id: String,
    },

    /// Task execution failed.
    #[error("Task execution failed for {task_id}: {reason}")]
    TaskExecution {
        /// The task id.
        task_id: String,
        /// Why the task failed.
        reason: String,
    },

    /// Task exceeded its time budget.
    #[error("Task {task_id} timed out after {timeout_secs} seconds")]
    TaskTimeout {
        /// The task id.
        task_id: String,
        /// The budget that was exceeded.
        timeout_secs: u64,
    },

    /// Task has unresolved dependencies.
    #[error("Task {task_id} has unresolved dependencies")]
    TaskDependency {
        /// The task id.
        task_id: String,
        /// Ids of the missing dependencies.
        missing: Vec<String>,
    },

    /// Task was cancelled.
    #[error("Task {task_id} was cancelled")]
    TaskCancelled {
        /// The task id.
        task_id: String,
    },

    /// Configuration file is missing where one is required.
    #[error("Configuration file not found: {path}")]
    ConfigurationNotFound {
        /// Path that was looked up.
        path: String,
    },

    /// Configuration field holds an invalid value.
    #[error("Invalid configuration for {field}: {reason}")]
    InvalidConfiguration {
        /// The offending field.
        field: String,
        /// Why it is invalid.
        reason: String,
    },

    /// Context grew past the model's budget.
    #[error("Context size {current_size} exceeds maximum {max_size}")]
    ContextSizeExceeded {
        /// Current size in tokens.
        current_size: u64,
        /// Maximum size in tokens.
        max_size: u64,
    },

    /// External API call failed.
    #[error("API call to {api} failed: {reason}")]
    Api {
        /// API name.
        api: String,
        /// HTTP status, when one was received.
        status_code: Option<u16>,
        /// Failure description.
        reason: String,
    },

    /// External service rate-limited the caller.
    #[error("Rate limit exceeded for {service}")]
    RateLimited {
        /// Service name.
        service: String,
        /// Seconds to wait, when advertised.
        retry_after_secs: Option<u64>,
    },

    /// Tool invocation failed.
    #[error("Tool execution failed for {tool}: {reason}")]
    ToolExecution {
        /// Tool name.
        tool: String,
        /// Failure description.
        reason: String,
    },

    /// QC review rejected the task output.
    #[error("QC rejected task {task_id}")]
    QcRejected {
        /// The task id.
        task_id: String,
        /// Issues raised by the reviewer.
        issues: Vec<String>,
    },

    /// Memory budget exceeded.
    #[error("Memory limit exceeded: {current_mb}MB / {limit_mb}MB")]
    MemoryLimitExceeded {
        /// Current usage in MB.
        current_mb: u64,
        /// Limit in MB.
        limit_mb: u64,
    },

    /// Not enough free disk.
    #[error("Insufficient disk space: need {required_gb}GB, have {available_gb}GB")]
    DiskSpace {
        /// Space required in GB.
        required_gb: f64,
        /// Space available in GB.
        available_gb: f64,
    },

    /// Concurrent agent limit reached.
    #[error("Concurrency limit reached: {current}/{limit}")]
    ConcurrencyLimit {
        /// Agents currently active.
        current: u32,
        /// Planner limit.
        limit: u32,
    },

    /// Catalog item is missing.
    #[error("{kind} not found: {item_id}")]
    LibraryItemNotFound {
        /// Catalog kind (tool, skill, mcp).
        kind: String,
        /// The missing item id.
        item_id: String,
    },

    /// Caller supplied an invalid value.
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput {
        /// The offending field.
        field: String,
        /// Why it is invalid.
        reason: String,
    },

    /// Message could not be delivered to another agent.
    #[error("Failed to deliver message {message_id} to {recipient}: {reason}")]
    MessageDelivery {
        /// The message id.
        message_id: String,
        /// Intended recipient.
        recipient: String,
        /// Failure description.
        reason: String,
    },
}

impl OrchestratorError {
    /// Family this error belongs to.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::AgentNotFound { .. }
            | Self::AgentInitialization { .. }
            | Self::AgentBusy { .. }
            | Self::AgentTerminated { .. } => ErrorCategory::Agent,
            Self::TaskNotFound { .. }
            | Self::TaskExecution { .. }
            | Self::TaskTimeout { .. }
            | Self::TaskDependency { .. }
            | Self::TaskCancelled { .. } => ErrorCategory::Task,
            Self::ConfigurationNotFound { .. } | Self::InvalidConfiguration { .. } => {
                ErrorCategory::Configuration
            }
            Self::ContextSizeExceeded { .. } => ErrorCategory::Memory,
            Self::Api { .. } | Self::RateLimited { .. } | Self::ToolExecution { .. } => {
                ErrorCategory::Integration
            }
            Self::QcRejected { .. } => ErrorCategory::Qc,
            Self::MemoryLimitExceeded { .. }
            | Self::DiskSpace { .. }
            | Self::ConcurrencyLimit { .. } => ErrorCategory::Resource,
            Self::LibraryItemNotFound { .. } => ErrorCategory::Library,
            Self::InvalidInput { .. } => ErrorCategory::Validation,
            Self::MessageDelivery { .. } => ErrorCategory::Communication,
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::AgentNotFound { .. } => "AGENT_NOT_FOUND",
            Self::AgentInitialization { .. } => "AGENT_INIT_FAILED",
            Self::AgentBusy { .. } => "AGENT_BUSY",
            Self::AgentTerminated { .. } => "AGENT_TERMINATED",
            Self::TaskNotFound { .. } => "TASK_NOT_FOUND",
            Self::TaskExecution { .. } => "TASK_EXECUTION_FAILED",
            Self::TaskTimeout { .. } => "TASK_TIMEOUT",
            Self::TaskDependency { .. } => "TASK_DEPENDENCY_ERROR",
            Self::TaskCancelled { .. } => "TASK_CANCELLED",
            Self::ConfigurationNotFound { .. } => "CONFIG_NOT_FOUND",
            Self::InvalidConfiguration { .. } => "INVALID_CONFIG",
            Self::ContextSizeExceeded { .. } => "CONTEXT_SIZE_EXCEEDED",
            Self::Api { .. } => "API_ERROR",
            Self::RateLimited { .. } => "RATE_LIMIT_EXCEEDED",
            Self::ToolExecution { .. } => "TOOL_EXECUTION_FAILED",
            Self::QcRejected { .. } => "QC_REJECTED",
            Self::MemoryLimitExceeded { .. } => "MEMORY_LIMIT_EXCEEDED",
            Self::DiskSpace { .. } => "DISK_SPACE_ERROR",
            Self::ConcurrencyLimit { .. } => "CONCURRENCY_LIMIT",
            Self::LibraryItemNotFound { .. } => "LIBRARY_ITEM_NOT_FOUND",
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::MessageDelivery { .. } => "MESSAGE_DELIVERY_FAILED",
        }
    }

    /// Returns true if retrying the same operation later may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::AgentBusy { .. }
                | Self::TaskTimeout { .. }
                | Self::RateLimited { .. }
                | Self::ConcurrencyLimit { .. }
                | Self::MessageDelivery { .. }
        )
    }

    /// Structured fields describing the failure.
    #[must_use]
    pub fn details(&self) -> Value {
        match self {
            Self::AgentNotFound { agent_id }
            | Self::AgentBusy { agent_id }
            | Self::AgentTerminated { agent_id } => json!({ "agent_id": agent_id }),
            Self::AgentInitialization { agent_id, reason } => {
                json!({ "agent_id": agent_id, "reason": reason })
            }
            Self::TaskNotFound { task_id } | Self::TaskCancelled { task_id } => {
                json!({ "task_id": task_id })
            }
            Self::TaskExecution { task_id, reason } => {
                json!({ "task_id": task_id, "reason": reason })
            }
            Self::TaskTimeout {
                task_id,
                timeout_secs,
            } => json!({ "task_id": task_id, "timeout": timeout_secs }),
            Self::TaskDependency { task_id, missing } => {
                json!({ "task_id": task_id, "missing": missing })
            }
            Self::ConfigurationNotFound { path } => json!({ "config_path": path }),
            Self::InvalidConfiguration { field, reason } | Self::InvalidInput { field, reason } => {
                json!({ "field": field, "reason": reason })
            }
            Self::ContextSizeExceeded {
                current_size,
                max_size,
            } => json!({ "current_size": current_size, "max_size": max_size }),
            Self::Api {
                api,
                status_code,
                reason,
            } => json!({ "api": api, "status_code": status_code, "reason": reason }),
            Self::RateLimited {
                service,
                retry_after_secs,
            } => json!({ "service": service, "retry_after": retry_after_secs }),
            Self::ToolExecution { tool, reason } => json!({ "tool": tool, "reason": reason }),
            Self::QcRejected { task_id, issues } => {
                json!({ "task_id": task_id, "issues": issues })
            }
            Self::MemoryLimitExceeded {
                current_mb,
                limit_mb,
            } => json!({ "current_mb": current_mb, "limit_mb": limit_mb }),
            Self::DiskSpace {
                required_gb,
                available_gb,
            } => json!({ "required_gb": required_gb, "available_gb": available_gb }),
            Self::ConcurrencyLimit { current, limit } => {
                json!({ "current": current, "limit": limit })
            }
            Self::LibraryItemNotFound { kind, item_id } => {
                json!({ "kind": kind, "item_id": item_id })
            }
            Self::MessageDelivery {
                message_id,
                recipient,
                reason,
            } => json!({ "message_id": message_id, "recipient": recipient, "reason": reason }),
        }
    }

    /// Convert into a serializable report.
    #[must_use]
    pub fn to_report(&self) -> ErrorReport {
        ErrorReport {
            error_type: self.category(),
            error_code: self.code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }
}

/// Serializable view of an [`OrchestratorError`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Error family.
    pub error_type: ErrorCategory,
    /// Stable machine-readable code.
    pub error_code: String,
    /// Human-readable message.
    pub message: String,
    /// Structured fields.
    pub details: Value,
}

impl From<&OrchestratorError> for ErrorReport {
    fn from(err: &OrchestratorError) -> Self {
        err.to_report()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(OrchestratorError::AgentNotFound { agent_id: "a".into() }, ErrorCategory::Agent, "AGENT_NOT_FOUND")]
    #[test_case(OrchestratorError::TaskTimeout { task_id: "t".into(), timeout_secs: 30 }, ErrorCategory::Task, "TASK_TIMEOUT")]
    #[test_case(OrchestratorError::InvalidConfiguration { field: "f".into(), reason: "r".into() }, ErrorCategory::Configuration, "INVALID_CONFIG")]
    #[test_case(OrchestratorError::RateLimited { service: "s".into(), retry_after_secs: None }, ErrorCategory::Integration, "RATE_LIMIT_EXCEEDED")]
    #[test_case(OrchestratorError::QcRejected { task_id: "t".into(), issues: vec![] }, ErrorCategory::Qc, "QC_REJECTED")]
    #[test_case(OrchestratorError::ConcurrencyLimit { current: 8, limit: 8 }, ErrorCategory::Resource, "CONCURRENCY_LIMIT")]
    #[test_case(OrchestratorError::LibraryItemNotFound { kind: "tool".into(), item_id: "x".into() }, ErrorCategory::Library, "LIBRARY_ITEM_NOT_FOUND")]
    #[test_case(OrchestratorError::MessageDelivery { message_id: "m".into(), recipient: "r".into(), reason: "down".into() }, ErrorCategory::Communication, "MESSAGE_DELIVERY_FAILED")]
    fn test_category_and_code(err: OrchestratorError, category: ErrorCategory, code: &str) {
        assert_eq!(err.category(), category);
        assert_eq!(err.code(), code);
    }

    #[test]
    fn test_display_concurrency_limit() {
        let err = OrchestratorError::ConcurrencyLimit {
            current: 8,
            limit: 8,
        };
        assert_eq!(err.to_string(), "Concurrency limit reached: 8/8");
    }

    #[test]
    fn test_display_library_item_not_found() {
        let err = OrchestratorError::LibraryItemNotFound {
            kind: "skill".into(),
            item_id: "summarize".into(),
        };
        assert_eq!(err.to_string(), "skill not found: summarize");
    }

    #[test]
    fn test_retryable() {
        assert!(OrchestratorError::AgentBusy {
            agent_id: "a".into()
        }
        .is_retryable());
        assert!(!OrchestratorError::AgentNotFound {
            agent_id: "a".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_report_serializes() {
        let err = OrchestratorError::TaskExecution {
            task_id: "t-1".into(),
            reason: "boom".into(),
        };
        let report = err.to_report();
        assert_eq!(report.error_type, ErrorCategory::Task);
        assert_eq!(report.details["task_id"], "t-1");

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"error_type\":\"task\""));
        assert!(json.contains("\"error_code\":\"TASK_EXECUTION_FAILED\""));
        assert!(json.contains("\"message\":\"Task execution failed for t-1: boom\""));
    }

    #[test]
    fn test_report_from_ref() {
        let err = OrchestratorError::DiskSpace {
            required_gb: 10.0,
            available_gb: 2.5,
        };
        let report = ErrorReport::from(&err);
        assert_eq!(report.error_code, "DISK_SPACE_ERROR");
        assert_eq!(report.details["available_gb"], 2.5);
    }
}
