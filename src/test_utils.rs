//! Test utilities and fixtures.
//!
//! This module provides shared testing infrastructure:
//! - System snapshot fixtures
//! - Mock factories for [`ToolProbe`](crate::traits::ToolProbe) and
//!   [`TimeProvider`](crate::traits::TimeProvider)
//!
//! Only compiled for tests (`#[cfg(test)]`).

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{DateTime, TimeZone, Utc};

use crate::system::{DiskType, SystemSnapshot};
use crate::traits::{MockTimeProvider, MockToolProbe};

/// Snapshot of a mid-range 4-core workstation with 10 GB available RAM and
/// 50 GB free SSD space.
#[must_use]
pub fn sample_snapshot() -> SystemSnapshot {
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
        has_node: true,
        has_editor: false,
        network_speed_mbps: None,
    }
}

/// Snapshot with the three planner inputs overridden.
#[must_use]
pub fn snapshot_with(cpu_count: u32, ram_available_gb: f64, disk_free_gb: f64) -> SystemSnapshot {
    SystemSnapshot {
        cpu_count,
        ram_available_gb,
        disk_free_gb,
        ..sample_snapshot()
    }
}

/// Fixed instant used by deterministic tests.
#[must_use]
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap()
}

/// Time provider that always returns [`fixed_time`].
#[must_use]
pub fn mock_time_provider() -> MockTimeProvider {
    let mut mock = MockTimeProvider::new();
    mock.expect_now().return_const(fixed_time());
    mock
}

/// Tool probe reporting every tool as installed.
#[must_use]
pub fn mock_all_tools_present() -> MockToolProbe {
    let mut mock = MockToolProbe::new();
    mock.expect_is_available().return_const(true);
    mock
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{TimeProvider, Tool, ToolProbe};

    #[test]
    fn test_snapshot_with_overrides() {
        let snapshot = snapshot_with(8, 32.0, 200.0);
        assert_eq!(snapshot.cpu_count, 8);
        assert!((snapshot.ram_available_gb - 32.0).abs() < f64::EPSILON);
        assert!((snapshot.disk_free_gb - 200.0).abs() < f64::EPSILON);
        assert_eq!(snapshot.os_type, "Linux");
    }

    #[test]
    fn test_mock_time_provider_is_fixed() {
        let provider = mock_time_provider();
        assert_eq!(provider.now(), fixed_time());
        assert_eq!(provider.now(), fixed_time());
    }

    #[tokio::test]
    async fn test_mock_all_tools_present() {
        let probe = mock_all_tools_present();
        for tool in Tool::ALL {
            assert!(probe.is_available(tool).await);
        }
    }
}
