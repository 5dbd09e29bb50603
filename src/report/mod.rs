//! Setup validation and optimization recommendations.
//!
//! Both functions are pure over a [`SystemSnapshot`] and its
//! [`ResourceConstraints`]; [`validate`] additionally checks that the
//! required directories exist.

use std::cmp::Ordering;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::planner::ResourceConstraints;
use crate::system::SystemSnapshot;

/// Total RAM below which an upgrade is suggested, in GB.
pub const LOW_RAM_GB: f64 = 8.0;

/// Free disk below which disk caching is off and a cleanup is suggested, in GB.
pub const LOW_DISK_GB: f64 = 10.0;

/// CPU count below which an upgrade is suggested.
pub const LOW_CPU_COUNT: u32 = 4;

/// Total RAM needed for the "excellent system" note, in GB.
pub const EXCELLENT_RAM_GB: f64 = 16.0;

/// CPU count needed for the "excellent system" note.
pub const EXCELLENT_CPU_COUNT: u32 = 8;

/// Result of validating a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Every required directory exists.
    pub directories: bool,
    /// The runtime meets the minimum version.
    pub runtime: bool,
    /// Git is installed and the runtime check passed.
    pub tools: bool,
    /// All three checks passed.
    pub overall: bool,
    /// Human-readable description of every failed check.
    pub issues: Vec<String>,
}

impl ValidationReport {
    /// Returns true if every check passed.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.overall
    }
}

/// Validate a workspace against the captured host facts.
///
/// Constraint invariant violations are reported as issues but do not affect
/// the three boolean checks.
#[must_use]
pub fn validate(
    snapshot: &SystemSnapshot,
    constraints: &ResourceConstraints,
    required_dirs: &[PathBuf],
    min_runtime_version: &str,
) -> ValidationReport {
    let mut issues = Vec::new();

    let missing: Vec<&PathBuf> = required_dirs.iter().filter(|dir| !dir.is_dir()).collect();
    for dir in &missing {
        issues.push(format!("Missing directory: {}", dir.display()));
    }
    let directories = missing.is_empty();

    let runtime = version_at_least(&snapshot.runtime_version, min_runtime_version);
    if !runtime {
        issues.push(format!(
            "Runtime {} is older than required {min_runtime_version}",
            snapshot.runtime_version
        ));
    }

    if !snapshot.has_git {
        issues.push("git is not installed".to_string());
    }
    let tools = snapshot.has_git && runtime;

    issues.extend(
        constraints
            .violations()
            .into_iter()
            .map(|violation| format!("Invalid constraints: {violation}")),
    );

    let overall = directories && runtime && tools;
    if overall {
        tracing::info!("Workspace validation passed");
    } else {
        tracing::warn!(issues = ?issues, "Workspace validation failed");
    }

    ValidationReport {
        directories,
        runtime,
        tools,
        overall,
        issues,
    }
}

/// Produce optimization hints, most urgent first.
///
/// Every matching rule contributes; the cloud-first reminder is always last.
#[must_use]
pub fn recommend(snapshot: &SystemSnapshot, constraints: &ResourceConstraints) -> Vec<String> {
    let mut recommendations = Vec::new();
    let agents = constraints.max_concurrent_agents;

    if snapshot.ram_total_gb < LOW_RAM_GB {
        recommendations.push(format!(
            "LOW RAM: Consider upgrading to 16GB RAM for better performance. \
             Current limit: {agents} concurrent agents."
        ));
    }

    if !snapshot.disk_type.is_solid_state() {
        recommendations.push(
            "HDD DETECTED: Consider upgrading to SSD for 10-100x faster I/O. \
             This will significantly improve cache performance and startup time."
                .to_string(),
        );
    }

    if snapshot.disk_free_gb < LOW_DISK_GB {
        recommendations.push(
            "LOW DISK SPACE: Free up disk space. Disk caching is disabled due to low space."
                .to_string(),
        );
    }

    if snapshot.cpu_count < LOW_CPU_COUNT {
        recommendations.push(format!(
            "LOW CPU COUNT: Consider upgrading CPU for better parallel performance. \
             Current limit: {agents} concurrent agents."
        ));
    }

    if is_windows(&snapshot.os_type) {
        recommendations.push(
            "WINDOWS: Consider adding project folder to antivirus exclusions \
             for better file I/O performance."
                .to_string(),
        );
        recommendations
            .push("WINDOWS: Enable long path support if not already enabled.".to_string());
    }

    if snapshot.ram_total_gb >= EXCELLENT_RAM_GB
        && snapshot.disk_type.is_solid_state()
        && snapshot.cpu_count >= EXCELLENT_CPU_COUNT
    {
        recommendations.push(format!(
            "EXCELLENT SYSTEM: Your system has great resources! \
             You can run {agents} concurrent agents efficiently."
        ));
    }

    recommendations.push(
        "CLOUD-FIRST: Remember, this system uses cloud agents by default. \
         Your local resources are saved for coordination only!"
            .to_string(),
    );

    recommendations
}

fn is_windows(os_type: &str) -> bool {
    os_type.to_ascii_lowercase().starts_with("windows")
}

/// Compare dotted version strings numerically, padding the shorter with
/// zeros. Non-numeric suffixes (`1.2.3-beta`) are ignored.
#[must_use]
pub fn version_at_least(actual: &str, required: &str) -> bool {
    compare_versions(actual, required) != Ordering::Less
}

fn compare_versions(a: &str, b: &str) -> Ordering {
    let a = version_parts(a);
    let b = version_parts(b);
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let left = a.get(i).copied().unwrap_or(0);
            let right = b.get(i).copied().unwrap_or(0);
            left.cmp(&right)
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn version_parts(version: &str) -> Vec<u64> {
    version
        .trim()
        .trim_start_matches('v')
        .split('.')
        .map(|part| {
            let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().unwrap_or(0)
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::planner::plan;
    use crate::system::DiskType;
    use crate::test_utils::{sample_snapshot, snapshot_with};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use test_case::test_case;

    fn required_dirs(root: &TempDir) -> Vec<PathBuf> {
        ["src", "agents"]
            .iter()
            .map(|dir| root.path().join(dir))
            .collect()
    }

    #[test]
    fn test_validate_all_present() {
        let root = TempDir::new().unwrap();
        let dirs = required_dirs(&root);
        for dir in &dirs {
            std::fs::create_dir_all(dir).unwrap();
        }
        let snapshot = sample_snapshot();

        let report = validate(&snapshot, &plan(&snapshot), &dirs, "0.1.0");

        assert!(report.directories);
        assert!(report.runtime);
        assert!(report.tools);
        assert!(report.is_valid());
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_validate_missing_directory() {
        let root = TempDir::new().unwrap();
        let dirs = required_dirs(&root);
        std::fs::create_dir_all(&dirs[0]).unwrap();
        let snapshot = sample_snapshot();

        let report = validate(&snapshot, &plan(&snapshot), &dirs, "0.1.0");

        assert!(!report.directories);
        assert!(report.tools);
        assert!(!report.overall);
        assert_eq!(report.issues.len(), 1);
        assert!(report.issues[0].contains("agents"));
    }

    #[test]
    fn test_validate_without_git() {
        let snapshot = SystemSnapshot {
            has_git: false,
            ..sample_snapshot()
        };

        let report = validate(&snapshot, &plan(&snapshot), &[], "0.1.0");

        assert!(report.directories);
        assert!(report.runtime);
        assert!(!report.tools);
        assert!(!report.overall);
        assert_eq!(report.issues, vec!["git is not installed".to_string()]);
    }

    #[test]
    fn test_stale_runtime_fails_tools_too() {
        let snapshot = sample_snapshot();

        let report = validate(&snapshot, &plan(&snapshot), &[], "2.0");

        assert!(!report.runtime);
        assert!(!report.tools);
        assert!(!report.overall);
    }

    #[test]
    fn test_constraint_violations_become_issues() {
        let snapshot = sample_snapshot();
        let constraints = ResourceConstraints {
            max_concurrent_agents: 0,
            ..plan(&snapshot)
        };

        let report = validate(&snapshot, &constraints, &[], "0.1.0");

        assert!(report.overall);
        assert_eq!(report.issues.len(), 1);
        assert!(report.issues[0].starts_with("Invalid constraints"));
    }

    #[test_case("0.1.0", "0.1.0", true ; "equal")]
    #[test_case("0.10.0", "0.9.9", true ; "numeric not lexical")]
    #[test_case("1.2", "1.2.0", true ; "padded")]
    #[test_case("1.2.3-beta", "1.2.3", true ; "suffix ignored")]
    #[test_case("v2.0.0", "1.9", true ; "leading v")]
    #[test_case("0.1.0", "0.2", false ; "older")]
    fn test_version_at_least(actual: &str, required: &str, expected: bool) {
        assert_eq!(version_at_least(actual, required), expected);
    }

    #[test]
    fn test_recommend_mid_range_system() {
        let snapshot = sample_snapshot();
        let recommendations = recommend(&snapshot, &plan(&snapshot));

        assert_eq!(recommendations.len(), 1);
        assert!(recommendations[0].starts_with("CLOUD-FIRST"));
    }

    #[test]
    fn test_recommend_weak_system_in_order() {
        let snapshot = SystemSnapshot {
            ram_total_gb: 4.0,
            disk_type: DiskType::Hdd,
            os_type: "Windows".to_string(),
            ..snapshot_with(2, 2.0, 5.0)
        };
        let constraints = plan(&snapshot);
        let recommendations = recommend(&snapshot, &constraints);

        let prefixes: Vec<&str> = recommendations
            .iter()
            .map(|r| r.split(':').next().unwrap())
            .collect();
        assert_eq!(
            prefixes,
            vec![
                "LOW RAM",
                "HDD DETECTED",
                "LOW DISK SPACE",
                "LOW CPU COUNT",
                "WINDOWS",
                "WINDOWS",
                "CLOUD-FIRST",
            ]
        );
        assert!(recommendations[0].contains(&format!(
            "{} concurrent agents",
            constraints.max_concurrent_agents
        )));
    }

    #[test_case(DiskType::Ssd, true ; "ssd")]
    #[test_case(DiskType::Unknown, true ; "unknown counts as solid state")]
    #[test_case(DiskType::Hdd, false ; "hdd")]
    fn test_excellent_system(disk_type: DiskType, excellent: bool) {
        let snapshot = SystemSnapshot {
            ram_total_gb: 32.0,
            disk_type,
            ..snapshot_with(8, 24.0, 200.0)
        };
        let recommendations = recommend(&snapshot, &plan(&snapshot));

        assert_eq!(
            recommendations
                .iter()
                .any(|r| r.starts_with("EXCELLENT SYSTEM")),
            excellent
        );
        assert!(recommendations.last().unwrap().starts_with("CLOUD-FIRST"));
    }
}
