//! Configuration management.
//!
//! This module handles:
//! - Environment variable loading (`ORCHESTRATOR_*`, plus `.env`)
//! - Configuration validation
//! - Default value handling
//! - Overrides from a persisted workspace snapshot
//!
//! # Example
//!
//! ```
//! use agent_orchestrator::config::{Config, DEFAULT_MAX_CONCURRENT_AGENTS};
//!
//! // Use Config::from_env() in production
//! let config = Config::default();
//! assert_eq!(config.max_concurrent_agents, DEFAULT_MAX_CONCURRENT_AGENTS);
//! assert!(agent_orchestrator::config::validate_config(&config).is_ok());
//! ```

mod validation;

pub use validation::{
    validate_config, MAX_CACHE_SIZE_RANGE_GB, MAX_CONCURRENT_AGENTS_RANGE, MAX_LOG_SIZE_RANGE_GB,
    MAX_MEMORY_PER_AGENT_RANGE_MB,
};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SetupError};
use crate::logging::{LogFormat, DEFAULT_LOG_LEVEL};
use crate::setup::{WorkspaceSnapshot, WORKSPACE_CONFIG_FILE};

/// Prefix of every recognised environment variable.
pub const ENV_PREFIX: &str = "ORCHESTRATOR_";

/// Default concurrent agent limit.
pub const DEFAULT_MAX_CONCURRENT_AGENTS: u32 = 10;

/// Default memory budget per agent, in MB.
pub const DEFAULT_MAX_MEMORY_PER_AGENT_MB: u32 = 200;

/// Default cache budget, in GB.
pub const DEFAULT_MAX_CACHE_SIZE_GB: f64 = 5.0;

/// Default log budget, in GB.
pub const DEFAULT_MAX_LOG_SIZE_GB: f64 = 1.0;

/// Default minimum runtime version accepted by setup validation.
pub const DEFAULT_MIN_RUNTIME_VERSION: &str = "0.1.0";

const KNOWN_VARS: &[&str] = &[
    "ENVIRONMENT",
    "LOG_LEVEL",
    "LOG_FORMAT",
    "PROJECT_PATH",
    "WORKSPACE_CONFIG",
    "MAX_CONCURRENT_AGENTS",
    "MAX_MEMORY_PER_AGENT_MB",
    "MAX_CACHE_SIZE_GB",
    "MAX_LOG_SIZE_GB",
    "MIN_RUNTIME_VERSION",
    "WORKSPACE_DIR",
    "LOGS_DIR",
    "DATA_DIR",
    "CACHE_DIR",
];

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development.
    #[default]
    Development,
    /// Pre-production.
    Staging,
    /// Production.
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(ConfigError::InvalidValue {
                var: env_name("ENVIRONMENT"),
                reason: format!("unknown environment '{s}'"),
            }),
        }
    }
}

/// Working directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Agent workspace.
    pub workspace: PathBuf,
    /// Log files.
    pub logs: PathBuf,
    /// Persistent data.
    pub data: PathBuf,
    /// Cache.
    pub cache: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            workspace: PathBuf::from("./workspace"),
            logs: PathBuf::from("./logs"),
            data: PathBuf::from("./data"),
            cache: PathBuf::from("./cache"),
        }
    }
}

impl PathsConfig {
    /// Every configured directory.
    #[must_use]
    pub fn all(&self) -> [&Path; 4] {
        [
            self.workspace.as_path(),
            self.logs.as_path(),
            self.data.as_path(),
            self.cache.as_path(),
        ]
    }

    /// Create every configured directory, including parents.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::Io`] for the first directory that cannot be
    /// created.
    pub fn create_directories(&self) -> Result<(), SetupError> {
        for dir in self.all() {
            std::fs::create_dir_all(dir).map_err(|e| SetupError::io(dir, &e))?;
            tracing::debug!(path = %dir.display(), "Directory ready");
        }
        Ok(())
    }
}

/// Application configuration.
///
/// Use [`Config::from_env`] to load configuration from environment variables.
/// The four resource limits may later be replaced by the values a setup run
/// persisted (see [`Config::load_workspace_overrides`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Deployment environment.
    pub environment: Environment,
    /// Log filter (error, warn, info, debug, trace, or directives).
    pub log_level: String,
    /// Log line format.
    pub log_format: LogFormat,
    /// Project root.
    pub project_path: PathBuf,
    /// Explicit workspace snapshot path; defaults to
    /// `<project_path>/workspace_config.json`.
    pub workspace_config: Option<PathBuf>,
    /// Concurrent agent limit.
    pub max_concurrent_agents: u32,
    /// Memory budget per agent, in MB.
    pub max_memory_per_agent_mb: u32,
    /// Cache budget, in GB.
    pub max_cache_size_gb: f64,
    /// Log budget, in GB.
    pub max_log_size_gb: f64,
    /// Minimum runtime version accepted by setup validation.
    pub min_runtime_version: String,
    /// Working directories.
    pub paths: PathsConfig,
    /// Unrecognised `ORCHESTRATOR_*` variables, keyed without the prefix.
    pub extra: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: LogFormat::default(),
            project_path: PathBuf::from("."),
            workspace_config: None,
            max_concurrent_agents: DEFAULT_MAX_CONCURRENT_AGENTS,
            max_memory_per_agent_mb: DEFAULT_MAX_MEMORY_PER_AGENT_MB,
            max_cache_size_gb: DEFAULT_MAX_CACHE_SIZE_GB,
            max_log_size_gb: DEFAULT_MAX_LOG_SIZE_GB,
            min_runtime_version: DEFAULT_MIN_RUNTIME_VERSION.to_string(),
            paths: PathsConfig::default(),
            extra: HashMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional environment variables (with defaults):
    /// - `ORCHESTRATOR_ENVIRONMENT`: development, staging or production (default: `development`)
    /// - `ORCHESTRATOR_LOG_LEVEL`: Logging filter (default: `info`)
    /// - `ORCHESTRATOR_LOG_FORMAT`: `text` or `json` (default: `text`)
    /// - `ORCHESTRATOR_PROJECT_PATH`: Project root (default: `.`)
    /// - `ORCHESTRATOR_WORKSPACE_CONFIG`: Workspace snapshot path
    /// - `ORCHESTRATOR_MAX_CONCURRENT_AGENTS`: (default: `10`)
    /// - `ORCHESTRATOR_MAX_MEMORY_PER_AGENT_MB`: (default: `200`)
    /// - `ORCHESTRATOR_MAX_CACHE_SIZE_GB`: (default: `5.0`)
    /// - `ORCHESTRATOR_MAX_LOG_SIZE_GB`: (default: `1.0`)
    /// - `ORCHESTRATOR_MIN_RUNTIME_VERSION`: (default: `0.1.0`)
    /// - `ORCHESTRATOR_WORKSPACE_DIR`, `_LOGS_DIR`, `_DATA_DIR`, `_CACHE_DIR`
    ///
    /// Any other `ORCHESTRATOR_*` variable is kept in [`Config::extra`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a value does not parse or fails validation
    /// (see [`validate_config`]).
    #[must_use = "configuration should be used"]
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        let defaults = Self::default();
        let defaults_paths = defaults.paths;

        let config = Self {
            environment: parse_env("ENVIRONMENT", defaults.environment)?,
            log_level: env_string("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: parse_env("LOG_FORMAT", defaults.log_format)?,
            project_path: env_path("PROJECT_PATH").unwrap_or(defaults.project_path),
            workspace_config: env_path("WORKSPACE_CONFIG"),
            max_concurrent_agents: parse_env(
                "MAX_CONCURRENT_AGENTS",
                defaults.max_concurrent_agents,
            )?,
            max_memory_per_agent_mb: parse_env(
                "MAX_MEMORY_PER_AGENT_MB",
                defaults.max_memory_per_agent_mb,
            )?,
            max_cache_size_gb: parse_env("MAX_CACHE_SIZE_GB", defaults.max_cache_size_gb)?,
            max_log_size_gb: parse_env("MAX_LOG_SIZE_GB", defaults.max_log_size_gb)?,
            min_runtime_version: env_string("MIN_RUNTIME_VERSION")
                .unwrap_or(defaults.min_runtime_version),
            paths: PathsConfig {
                workspace: env_path("WORKSPACE_DIR").unwrap_or(defaults_paths.workspace),
                logs: env_path("LOGS_DIR").unwrap_or(defaults_paths.logs),
                data: env_path("DATA_DIR").unwrap_or(defaults_paths.data),
                cache: env_path("CACHE_DIR").unwrap_or(defaults_paths.cache),
            },
            extra: extra_vars(),
        };

        validate_config(&config)?;
        Ok(config)
    }

    /// Path of the workspace snapshot this config reads.
    #[must_use]
    pub fn workspace_config_path(&self) -> PathBuf {
        self.workspace_config
            .clone()
            .unwrap_or_else(|| self.project_path.join(WORKSPACE_CONFIG_FILE))
    }

    /// Use `project_path` as the project root when given.
    ///
    /// The default snapshot location follows the root, so `setup` and
    /// `orchestrate` agree on where `workspace_config.json` lives.
    #[must_use]
    pub fn with_project_path(mut self, project_path: Option<PathBuf>) -> Self {
        if let Some(path) = project_path {
            self.project_path = path;
        }
        self
    }

    /// Replace the four resource limits with those planned by a setup run.
    pub fn apply_workspace_snapshot(&mut self, snapshot: &WorkspaceSnapshot) {
        let constraints = &snapshot.resource_constraints;
        self.max_concurrent_agents = constraints.max_concurrent_agents;
        self.max_memory_per_agent_mb = constraints.max_memory_per_agent_mb;
        self.max_cache_size_gb = constraints.max_cache_size_gb;
        self.max_log_size_gb = constraints.max_log_size_gb;
        tracing::info!(
            max_concurrent_agents = self.max_concurrent_agents,
            max_memory_per_agent_mb = self.max_memory_per_agent_mb,
            max_cache_size_gb = self.max_cache_size_gb,
            max_log_size_gb = self.max_log_size_gb,
            "Applied workspace snapshot limits"
        );
    }

    /// Apply the workspace snapshot if one exists.
    ///
    /// Returns whether a snapshot was found and applied.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] if the snapshot exists but cannot be read or
    /// parsed.
    pub fn load_workspace_overrides(&mut self) -> Result<bool, SetupError> {
        let path = self.workspace_config_path();
        match WorkspaceSnapshot::load(&path)? {
            Some(snapshot) => {
                self.apply_workspace_snapshot(&snapshot);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn env_name(suffix: &str) -> String {
    format!("{ENV_PREFIX}{suffix}")
}

/// Read a non-empty variable.
fn env_string(suffix: &str) -> Option<String> {
    std::env::var(env_name(suffix))
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn env_path(suffix: &str) -> Option<PathBuf> {
    env_string(suffix).map(PathBuf::from)
}

/// Parse an environment variable, using a default if not set.
fn parse_env<T>(suffix: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_string(suffix).map_or(Ok(default), |val| {
        val.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            var: env_name(suffix),
            reason: format!("cannot parse '{val}': {e}"),
        })
    })
}

fn extra_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter_map(|(key, value)| {
            let suffix = key.strip_prefix(ENV_PREFIX)?;
            (!KNOWN_VARS.contains(&suffix)).then(|| (suffix.to_string(), value))
        })
        .collect()
}
