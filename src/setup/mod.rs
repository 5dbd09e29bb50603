//! Workspace setup workflow.
//!
//! A setup run captures the host, plans limits, validates the workspace,
//! produces recommendations and persists a [`WorkspaceSnapshot`] that later
//! runs load through [`Config::load_workspace_overrides`].
//!
//! [`Config::load_workspace_overrides`]: crate::config::Config::load_workspace_overrides

mod snapshot;

pub use snapshot::{WorkspaceSnapshot, SETUP_VERSION, WORKSPACE_CONFIG_FILE};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_MIN_RUNTIME_VERSION;
use crate::error::SetupError;
use crate::metrics::Timer;
use crate::planner::{plan, ResourceConstraints};
use crate::report::{recommend, validate, ValidationReport};
use crate::system::{CommandProbe, SnapshotReader, SystemSnapshot};
use crate::traits::{RealTimeProvider, TimeProvider, ToolProbe};

/// Directories, relative to the project root, that a workspace must have.
pub const REQUIRED_DIRS: &[&str] = &[
    "src",
    "src/agents",
    "src/core",
    "src/memory",
    "libraries",
    "agents",
    "tests",
];

/// Everything a setup run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupReport {
    /// Host facts.
    pub system_profile: SystemSnapshot,
    /// Planned limits.
    pub constraints: ResourceConstraints,
    /// Workspace validation.
    pub validation: ValidationReport,
    /// Optimization hints.
    pub recommendations: Vec<String>,
    /// Progress messages in order.
    pub setup_log: Vec<String>,
    /// Where the workspace snapshot was written.
    pub snapshot_path: PathBuf,
}

/// Runs the setup phases against a project root.
pub struct SetupRunner {
    probe: Arc<dyn ToolProbe>,
    clock: Arc<dyn TimeProvider>,
    required_dirs: Vec<PathBuf>,
    min_runtime_version: String,
    snapshot_path: Option<PathBuf>,
    create_dirs: bool,
}

impl Default for SetupRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl SetupRunner {
    /// Runner with real tool probes, the real clock and [`REQUIRED_DIRS`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            probe: Arc::new(CommandProbe::new()),
            clock: Arc::new(RealTimeProvider),
            required_dirs: REQUIRED_DIRS.iter().map(PathBuf::from).collect(),
            min_runtime_version: DEFAULT_MIN_RUNTIME_VERSION.to_string(),
            snapshot_path: None,
            create_dirs: false,
        }
    }

    /// Use a different tool probe.
    #[must_use]
    pub fn with_probe(mut self, probe: Arc<dyn ToolProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Use a different clock for the snapshot timestamp.
    #[must_use]
    pub fn with_time_provider(mut self, clock: Arc<dyn TimeProvider>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the required directory list (relative to the project root).
    #[must_use]
    pub fn with_required_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.required_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Minimum runtime version accepted by validation.
    #[must_use]
    pub fn with_min_runtime_version(mut self, version: impl Into<String>) -> Self {
        self.min_runtime_version = version.into();
        self
    }

    /// Write the snapshot here instead of `<project>/workspace_config.json`.
    #[must_use]
    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Create missing required directories before validating.
    #[must_use]
    pub const fn create_dirs(mut self, create: bool) -> Self {
        self.create_dirs = create;
        self
    }

    /// Capture the host and run every phase.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] if directories cannot be created or the snapshot
    /// cannot be written. Validation failures are reported in the result.
    pub async fn run(&self, project_path: &Path) -> Result<SetupReport, SetupError> {
        let reader = SnapshotReader::with_probe(project_path, Arc::clone(&self.probe));
        let timer = Timer::start();
        let profile = reader.capture().await;
        tracing::debug!(elapsed_ms = timer.elapsed_ms(), "Host captured");
        self.run_with_profile(project_path, profile)
    }

    /// Run every phase after analysis against an already captured profile.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub fn run_with_profile(
        &self,
        project_path: &Path,
        profile: SystemSnapshot,
    ) -> Result<SetupReport, SetupError> {
        let mut log = SetupLog::default();
        log.push("Starting project setup");

        log.push("Phase 1: Analyzing system resources");
        let timer = Timer::start();
        let constraints = plan(&profile);
        log.push(format!(
            "  {} CPUs, {:.2} GB RAM available, {:.2} GB free on {} disk",
            profile.cpu_count, profile.ram_available_gb, profile.disk_free_gb, profile.disk_type
        ));
        log.push(format!(
            "  Limits: {} concurrent agents, {} MB per agent, {:.2} GB cache",
            constraints.max_concurrent_agents,
            constraints.max_memory_per_agent_mb,
            constraints.max_cache_size_gb
        ));
        phase_done("analyze", &timer);

        log.push("Phase 2: Validating setup");
        let timer = Timer::start();
        let required: Vec<PathBuf> = self
            .required_dirs
            .iter()
            .map(|dir| project_path.join(dir))
            .collect();
        if self.create_dirs {
            for dir in &required {
                std::fs::create_dir_all(dir).map_err(|e| SetupError::io(dir, &e))?;
            }
            log.push(format!("  Ensured {} workspace directories", required.len()));
        }
        let validation = validate(
            &profile,
            &constraints,
            &required,
            &self.min_runtime_version,
        );
        for issue in &validation.issues {
            log.push(format!("  {issue}"));
        }
        phase_done("validate", &timer);

        log.push("Phase 3: Generating optimization recommendations");
        let timer = Timer::start();
        let recommendations = recommend(&profile, &constraints);
        phase_done("recommend", &timer);

        log.push("Phase 4: Saving workspace configuration");
        let timer = Timer::start();
        let snapshot_path = self
            .snapshot_path
            .clone()
            .unwrap_or_else(|| project_path.join(WORKSPACE_CONFIG_FILE));
        let snapshot =
            WorkspaceSnapshot::new(profile.clone(), constraints.clone(), self.clock.now());
        snapshot.save(&snapshot_path)?;
        log.push(format!(
            "  Workspace configuration saved to: {}",
            snapshot_path.display()
        ));
        phase_done("persist", &timer);

        log.push("Setup complete");

        Ok(SetupReport {
            system_profile: profile,
            constraints,
            validation,
            recommendations,
            setup_log: log.into_lines(),
            snapshot_path,
        })
    }
}

/// Progress messages mirrored to tracing.
#[derive(Debug, Default)]
struct SetupLog {
    lines: Vec<String>,
}

impl SetupLog {
    fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{message}");
        self.lines.push(message);
    }

    fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

fn phase_done(phase: &'static str, timer: &Timer) {
    tracing::debug!(phase, elapsed_ms = timer.elapsed_ms(), "Setup phase finished");
}
