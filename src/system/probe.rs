//! Process-spawning tool probe.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::traits::{Tool, ToolProbe};

/// Hard upper bound for a single tool probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// [`ToolProbe`] that runs `<tool> --version` and checks the exit status.
#[derive(Debug, Clone, Copy)]
pub struct CommandProbe {
    timeout: Duration,
}

impl CommandProbe {
    /// Create a probe with the default 5 second timeout.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Create a probe with a custom timeout.
    #[must_use]
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// The per-probe timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Timeout in whole milliseconds, saturating at `u64::MAX`.
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// Run `program args...` and report whether it exited successfully
    /// within the timeout.
    pub async fn run(&self, program: &str, args: &[&str]) -> bool {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();

        let mut child = match child {
            Ok(child) => child,
            Err(e) => {
                tracing::debug!(program, error = %e, "Probe command could not be spawned");
                return false;
            }
        };

        match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                tracing::debug!(program, error = %e, "Probe command failed");
                false
            }
            Err(_) => {
                tracing::warn!(
                    program,
                    timeout_ms = self.timeout_ms(),
                    "Probe command timed out"
                );
                // kill_on_drop reaps it when `child` goes out of scope
                false
            }
        }
    }
}

impl Default for CommandProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolProbe for CommandProbe {
    async fn is_available(&self, tool: Tool) -> bool {
        self.run(tool.program(), tool.version_args()).await
    }
}
