//! Persisted workspace snapshot (`workspace_config.json`).

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SetupError;
use crate::planner::ResourceConstraints;
use crate::system::SystemSnapshot;

/// File name of the snapshot inside a project root.
pub const WORKSPACE_CONFIG_FILE: &str = "workspace_config.json";

/// Format version written into every snapshot.
pub const SETUP_VERSION: &str = "1.0.0";

/// Host profile and derived limits recorded by a setup run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    /// Host facts at setup time.
    pub system_profile: SystemSnapshot,
    /// Limits planned from `system_profile`.
    pub resource_constraints: ResourceConstraints,
    /// When setup ran.
    pub setup_timestamp: DateTime<Utc>,
    /// Snapshot format version.
    pub setup_version: String,
}

impl WorkspaceSnapshot {
    /// Create a snapshot stamped with `setup_timestamp`.
    #[must_use]
    pub fn new(
        system_profile: SystemSnapshot,
        resource_constraints: ResourceConstraints,
        setup_timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            system_profile,
            resource_constraints,
            setup_timestamp,
            setup_version: SETUP_VERSION.to_string(),
        }
    }

    /// Write the snapshot as pretty-printed JSON, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), SetupError> {
        let json =
            serde_json::to_string_pretty(self).map_err(|e| SetupError::serialization(path, &e))?;
        std::fs::write(path, json).map_err(|e| SetupError::io(path, &e))?;
        tracing::info!(path = %path.display(), "Workspace snapshot saved");
        Ok(())
    }

    /// Read a snapshot; `Ok(None)` if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] if the file cannot be read or is not a valid
    /// snapshot.
    pub fn load(path: &Path) -> Result<Option<Self>, SetupError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No workspace snapshot");
                return Ok(None);
            }
            Err(e) => return Err(SetupError::io(path, &e)),
        };
        let snapshot =
            serde_json::from_str(&contents).map_err(|e| SetupError::serialization(path, &e))?;
        Ok(Some(snapshot))
    }
}
