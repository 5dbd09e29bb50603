//! Resource-constraint planning.
//!
//! [`plan`] maps a [`SystemSnapshot`] to the operating limits the
//! orchestrator runs under. It is pure and deterministic: the same snapshot
//! always yields bit-identical [`ResourceConstraints`].
//!
//! Sizing rules:
//! - 3 GB of available RAM is held back for the OS and local tooling, and at
//!   least 1 GB is always budgeted for agents
//! - each agent needs at least 200 MB, and at most two agents run per CPU
//! - never more than 20 agents, never fewer than 1
//! - caches take up to 10% of free disk, capped at 10 GB
//!
//! # Example
//!
//! ```
//! use agent_orchestrator::planner::plan;
//! use agent_orchestrator::system::{DiskType, SystemSnapshot};
//!
//! let snapshot = SystemSnapshot {
//!     os_type: "Linux".into(),
//!     os_version: "6.8".into(),
//!     cpu_count: 4,
//!     cpu_freq_mhz: 3000.0,
//!     ram_total_gb: 16.0,
//!     ram_available_gb: 10.0,
//!     disk_total_gb: 500.0,
//!     disk_free_gb: 50.0,
//!     disk_type: DiskType::Ssd,
//!     runtime_version: "0.1.0".into(),
//!     has_git: true,
//!     has_node: false,
//!     has_editor: false,
//!     network_speed_mbps: None,
//! };
//!
//! let constraints = plan(&snapshot);
//! assert_eq!(constraints.max_concurrent_agents, 8);
//! assert_eq!(constraints.max_memory_per_agent_mb, 896);
//! assert_eq!(constraints.recommended_workers, 4);
//! ```

// Sizing formulas floor float budgets into integer counts on purpose
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]

use serde::{Deserialize, Serialize};

use crate::system::{round2, SystemSnapshot};

/// RAM held back for the OS and local tooling, in GB.
pub const RESERVED_RAM_GB: f64 = 3.0;

/// Smallest RAM budget handed to agents, in GB.
pub const MIN_AGENT_RAM_GB: f64 = 1.0;

/// Minimum memory footprint of one agent, in MB.
pub const AGENT_FOOTPRINT_MB: f64 = 200.0;

/// Agents allowed per logical CPU.
pub const AGENTS_PER_CPU: u32 = 2;

/// Hard ceiling on concurrent agents, independent of hardware.
pub const MAX_CONCURRENT_AGENTS_CAP: u32 = 20;

/// Floor for the per-agent memory limit, in MB.
pub const MIN_MEMORY_PER_AGENT_MB: u32 = 50;

/// Share of free disk usable for caches.
pub const CACHE_DISK_FRACTION: f64 = 0.10;

/// Cache size ceiling, in GB.
pub const MAX_CACHE_SIZE_GB: f64 = 10.0;

/// Log size limit, in GB.
pub const MAX_LOG_SIZE_GB: f64 = 1.0;

/// Free disk above which the disk cache is enabled, in GB.
pub const DISK_CACHE_THRESHOLD_GB: f64 = 10.0;

/// Available RAM above which the memory cache and worker pool are enabled, in GB.
pub const MEMORY_CACHE_THRESHOLD_GB: f64 = 4.0;

/// CPUs required for the worker pool.
pub const WORKER_POOL_MIN_CPUS: u32 = 4;

/// Operating limits derived from a [`SystemSnapshot`].
///
/// `max_concurrent_agents >= 1` and `max_memory_per_agent_mb >= 50` hold for
/// every value returned by [`plan`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConstraints {
    /// Maximum agents running at once.
    pub max_concurrent_agents: u32,
    /// Memory limit per agent, in MB.
    pub max_memory_per_agent_mb: u32,
    /// Cache size limit, in GB.
    pub max_cache_size_gb: f64,
    /// Log size limit, in GB.
    pub max_log_size_gb: f64,
    /// Whether to cache on disk.
    pub enable_disk_cache: bool,
    /// Whether to cache in memory.
    pub enable_memory_cache: bool,
    /// Whether to run work on a worker pool.
    pub use_worker_pool: bool,
    /// Worker pool size.
    pub recommended_workers: u32,
}

impl ResourceConstraints {
    /// Total memory handed to agents, in MB.
    #[must_use]
    pub const fn agent_memory_budget_mb(&self) -> u64 {
        self.max_concurrent_agents as u64 * self.max_memory_per_agent_mb as u64
    }

    /// Invariant violations, if any. Empty for every value built by [`plan`].
    #[must_use]
    pub fn violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if self.max_concurrent_agents < 1 {
            violations.push("max_concurrent_agents must be at least 1".to_string());
        }
        if self.max_memory_per_agent_mb < MIN_MEMORY_PER_AGENT_MB {
            violations.push(format!(
                "max_memory_per_agent_mb must be at least {MIN_MEMORY_PER_AGENT_MB}MB"
            ));
        }
        violations
    }
}

/// RAM budget for agents, in GB.
#[must_use]
pub fn available_ram_gb(snapshot: &SystemSnapshot) -> f64 {
    (snapshot.ram_available_gb - RESERVED_RAM_GB).max(MIN_AGENT_RAM_GB)
}

/// Derive operating limits from a snapshot.
#[must_use]
pub fn plan(snapshot: &SystemSnapshot) -> ResourceConstraints {
    let available_ram_gb = available_ram_gb(snapshot);
    let available_ram_mb = available_ram_gb * 1024.0;

    let agents_by_ram = (available_ram_mb / AGENT_FOOTPRINT_MB).floor() as u32;
    let agents_by_cpu = snapshot.cpu_count.saturating_mul(AGENTS_PER_CPU);
    let max_concurrent_agents = agents_by_ram
        .min(agents_by_cpu)
        .min(MAX_CONCURRENT_AGENTS_CAP)
        .max(1);

    let max_memory_per_agent_mb = ((available_ram_mb / f64::from(max_concurrent_agents)).floor()
        as u32)
        .max(MIN_MEMORY_PER_AGENT_MB);

    let max_cache_size_gb =
        round2((snapshot.disk_free_gb * CACHE_DISK_FRACTION).min(MAX_CACHE_SIZE_GB)).max(0.0);

    let enable_disk_cache = snapshot.disk_free_gb > DISK_CACHE_THRESHOLD_GB;
    let enable_memory_cache = snapshot.ram_available_gb > MEMORY_CACHE_THRESHOLD_GB;
    let use_worker_pool = snapshot.cpu_count >= WORKER_POOL_MIN_CPUS
        && snapshot.ram_available_gb > MEMORY_CACHE_THRESHOLD_GB;
    let recommended_workers = snapshot.cpu_count.min(max_concurrent_agents).max(1);

    let constraints = ResourceConstraints {
        max_concurrent_agents,
        max_memory_per_agent_mb,
        max_cache_size_gb,
        max_log_size_gb: MAX_LOG_SIZE_GB,
        enable_disk_cache,
        enable_memory_cache,
        use_worker_pool,
        recommended_workers,
    };

    tracing::debug!(
        agents_by_ram,
        agents_by_cpu,
        max_concurrent_agents,
        max_memory_per_agent_mb,
        max_cache_size_gb,
        "Planned resource constraints"
    );

    constraints
}
