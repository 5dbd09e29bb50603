//! Point-in-time host profiling.
//!
//! This module provides:
//! - [`SystemSnapshot`]: immutable record of OS, CPU, RAM, disk and tooling facts
//! - [`SnapshotReader`]: captures a snapshot using `sysinfo` and a [`ToolProbe`]
//! - [`CommandProbe`]: the production tool probe (5 second bound per probe)
//!
//! Capturing never fails. Each sub-probe that cannot answer degrades its own
//! field (zero, `false`, [`DiskType::Unknown`]) and the rest of the snapshot
//! is still produced.
//!
//! # Example
//!
//! ```no_run
//! use agent_orchestrator::system::SnapshotReader;
//!
//! # async fn run() {
//! let snapshot = SnapshotReader::new(".").capture().await;
//! println!("{} CPUs, {:.1} GB free RAM", snapshot.cpu_count, snapshot.ram_available_gb);
//! # }
//! ```

mod probe;

pub use probe::{CommandProbe, DEFAULT_PROBE_TIMEOUT};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sysinfo::{DiskKind, Disks, System};

use crate::traits::{Tool, ToolProbe};

/// Version of this orchestrator runtime, recorded as `runtime_version`.
pub const RUNTIME_VERSION: &str = env!("CARGO_PKG_VERSION");

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Storage media of the disk hosting the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiskType {
    /// Solid-state drive.
    #[serde(rename = "SSD")]
    Ssd,
    /// Rotational drive.
    #[serde(rename = "HDD")]
    Hdd,
    /// Detection failed.
    Unknown,
}

impl DiskType {
    /// Returns true unless the disk is known to be rotational.
    ///
    /// `Unknown` is treated exactly like `Ssd` by every consumer.
    #[must_use]
    pub const fn is_solid_state(self) -> bool {
        !matches!(self, Self::Hdd)
    }

    /// Map a `sysinfo` disk kind.
    ///
    /// A disk whose media kind cannot be determined is reported as `Ssd`.
    #[must_use]
    pub const fn from_kind(kind: DiskKind) -> Self {
        match kind {
            DiskKind::HDD => Self::Hdd,
            DiskKind::SSD | DiskKind::Unknown(_) => Self::Ssd,
        }
    }
}

impl std::fmt::Display for DiskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ssd => write!(f, "SSD"),
            Self::Hdd => write!(f, "HDD"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Immutable capture of host resource facts.
///
/// Created once per setup run. Gigabyte figures are rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    /// Operating system name (e.g. "Linux", "Windows", "Darwin").
    pub os_type: String,
    /// Operating system version.
    pub os_version: String,
    /// Logical CPU count.
    pub cpu_count: u32,
    /// Current CPU frequency in MHz (0 when unknown).
    pub cpu_freq_mhz: f64,
    /// Total RAM in GB.
    pub ram_total_gb: f64,
    /// Available RAM in GB.
    pub ram_available_gb: f64,
    /// Total size of the project disk in GB.
    pub disk_total_gb: f64,
    /// Free space on the project disk in GB.
    pub disk_free_gb: f64,
    /// Media of the project disk.
    pub disk_type: DiskType,
    /// Orchestrator runtime version.
    pub runtime_version: String,
    /// Whether `git` is installed.
    pub has_git: bool,
    /// Whether `node` is installed.
    pub has_node: bool,
    /// Whether the `code` editor is installed.
    pub has_editor: bool,
    /// Measured network speed; not measured today.
    pub network_speed_mbps: Option<f64>,
}

/// Facts read from the OS without spawning processes.
#[derive(Debug, Clone, PartialEq)]
struct HostFacts {
    os_type: String,
    os_version: String,
    cpu_count: u32,
    cpu_freq_mhz: f64,
    ram_total_gb: f64,
    ram_available_gb: f64,
    disk_total_gb: f64,
    disk_free_gb: f64,
    disk_type: DiskType,
}

impl HostFacts {
    /// Facts for a host that could not be read at all.
    fn unavailable() -> Self {
        Self {
            os_type: std::env::consts::OS.to_string(),
            os_version: "unknown".to_string(),
            cpu_count: 0,
            cpu_freq_mhz: 0.0,
            ram_total_gb: 0.0,
            ram_available_gb: 0.0,
            disk_total_gb: 0.0,
            disk_free_gb: 0.0,
            disk_type: DiskType::Unknown,
        }
    }
}

/// Captures [`SystemSnapshot`]s.
#[derive(Clone)]
pub struct SnapshotReader {
    root: PathBuf,
    probe: Arc<dyn ToolProbe>,
}

impl std::fmt::Debug for SnapshotReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotReader")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl SnapshotReader {
    /// Create a reader that inspects the disk holding `root` and probes tools
    /// with a [`CommandProbe`].
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_probe(root, Arc::new(CommandProbe::new()))
    }

    /// Create a reader with a custom tool probe.
    #[must_use]
    pub fn with_probe(root: impl Into<PathBuf>, probe: Arc<dyn ToolProbe>) -> Self {
        Self {
            root: root.into(),
            probe,
        }
    }

    /// Path whose disk is inspected.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Capture a snapshot of the host.
    ///
    /// Host facts are read on the blocking pool while the tool probes run.
    pub async fn capture(&self) -> SystemSnapshot {
        let root = self.root.clone();
        let host = tokio::task::spawn_blocking(move || read_host_facts(&root));

        let (host, has_git, has_node, has_editor) = tokio::join!(
            host,
            self.probe.is_available(Tool::Git),
            self.probe.is_available(Tool::Node),
            self.probe.is_available(Tool::Editor),
        );
        let facts = host.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Host fact reader did not finish, using empty facts");
            HostFacts::unavailable()
        });

        let snapshot = SystemSnapshot {
            os_type: facts.os_type,
            os_version: facts.os_version,
            cpu_count: facts.cpu_count,
            cpu_freq_mhz: facts.cpu_freq_mhz,
            ram_total_gb: facts.ram_total_gb,
            ram_available_gb: facts.ram_available_gb,
            disk_total_gb: facts.disk_total_gb,
            disk_free_gb: facts.disk_free_gb,
            disk_type: facts.disk_type,
            runtime_version: RUNTIME_VERSION.to_string(),
            has_git,
            has_node,
            has_editor,
            network_speed_mbps: None,
        };

        tracing::info!(
            os = %snapshot.os_type,
            cpus = snapshot.cpu_count,
            ram_available_gb = snapshot.ram_available_gb,
            disk_free_gb = snapshot.disk_free_gb,
            disk_type = %snapshot.disk_type,
            has_git,
            has_node,
            has_editor,
            "Captured system snapshot"
        );

        snapshot
    }
}

#[allow(clippy::cast_precision_loss)]
fn read_host_facts(root: &Path) -> HostFacts {
    let mut sys = System::new();
    sys.refresh_memory();
    sys.refresh_cpu_all();

    let cpu_count = match sys.cpus().len() {
        0 => std::thread::available_parallelism().map_or(0, std::num::NonZeroUsize::get),
        n => n,
    };
    let cpu_freq_mhz = sys.cpus().first().map_or(0.0, |cpu| cpu.frequency() as f64);

    let disks = Disks::new_with_refreshed_list();
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let disk = disks
        .list()
        .iter()
        .filter(|d| root.starts_with(d.mount_point()))
        .max_by_key(|d| d.mount_point().as_os_str().len())
        .or_else(|| disks.list().first());

    let (disk_total_gb, disk_free_gb, disk_type) = disk.map_or_else(
        || {
            tracing::warn!(root = %root.display(), "No disk found for project root");
            (0.0, 0.0, DiskType::Unknown)
        },
        |d| {
            (
                bytes_to_gb(d.total_space()),
                bytes_to_gb(d.available_space()),
                DiskType::from_kind(d.kind()),
            )
        },
    );

    HostFacts {
        os_type: System::name().unwrap_or_else(|| std::env::consts::OS.to_string()),
        os_version: System::os_version().unwrap_or_else(|| "unknown".to_string()),
        cpu_count: u32::try_from(cpu_count).unwrap_or(u32::MAX),
        cpu_freq_mhz,
        ram_total_gb: bytes_to_gb(sys.total_memory()),
        ram_available_gb: bytes_to_gb(sys.available_memory()),
        disk_total_gb,
        disk_free_gb,
        disk_type,
    }
}

#[allow(clippy::cast_precision_loss)]
fn bytes_to_gb(bytes: u64) -> f64 {
    round2(bytes as f64 / BYTES_PER_GB)
}

/// Round to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
