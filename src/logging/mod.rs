//! Logging initialization.
//!
//! Console output goes to stderr so stdout stays reserved for JSON reports.
//! [`init_logging_with_file`] adds a daily-rotated JSON log file in the logs
//! directory and prunes old files to stay within the configured log budget.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::error::{ConfigError, SetupError};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::InvalidValue {
                var: "ORCHESTRATOR_LOG_FORMAT".into(),
                reason: format!("unknown log format '{s}', expected text or json"),
            }),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Build the filter for `level`, falling back to `info` when it does not
/// parse.
#[must_use]
pub fn env_filter(level: &str) -> EnvFilter {
    level
        .parse()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

/// Prefix of every log file written by the file sink.
pub const LOG_FILE_PREFIX: &str = "orchestrator";

/// Extension of every log file written by the file sink.
pub const LOG_FILE_SUFFIX: &str = "log";

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

fn fmt_layer<W>(writer: W, format: LogFormat) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false);
    match format {
        LogFormat::Text => layer.boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}

/// Install the global subscriber, console only.
///
/// Returns false if a subscriber was already installed, which happens when
/// tests or embedding applications initialize logging first.
pub fn init_logging(level: &str, format: LogFormat) -> bool {
    tracing_subscriber::registry()
        .with(vec![fmt_layer(std::io::stderr, format)])
        .with(env_filter(level))
        .try_init()
        .is_ok()
}

/// Log file location and budget.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSink {
    /// Directory holding the log files.
    pub dir: PathBuf,
    /// Bytes the log files may occupy together.
    pub max_bytes: u64,
}

impl FileSink {
    /// Sink in `dir` limited to `max_log_size_gb` gigabytes.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(dir: impl Into<PathBuf>, max_log_size_gb: f64) -> Self {
        Self {
            dir: dir.into(),
            max_bytes: (max_log_size_gb.max(0.0) * BYTES_PER_GB) as u64,
        }
    }

    /// Create the directory, prune old files and open the rotating appender.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::Io`] if the directory cannot be prepared or the
    /// appender cannot be opened.
    pub fn open(&self) -> Result<RollingFileAppender, SetupError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| SetupError::io(&self.dir, &e))?;
        let removed = prune_logs(&self.dir, self.max_bytes)?;
        if removed > 0 {
            tracing::info!(removed, dir = %self.dir.display(), "Pruned old log files");
        }

        RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(LOG_FILE_PREFIX)
            .filename_suffix(LOG_FILE_SUFFIX)
            .build(&self.dir)
            .map_err(|e| SetupError::Io {
                path: self.dir.display().to_string(),
                message: e.to_string(),
            })
    }
}

/// Install the global subscriber with console output and a JSON log file.
///
/// The returned guard flushes the file writer when dropped; keep it alive
/// for the life of the process. `Ok(None)` means another subscriber was
/// already installed.
///
/// # Errors
///
/// Returns [`SetupError`] if the log file cannot be opened.
pub fn init_logging_with_file(
    level: &str,
    format: LogFormat,
    sink: &FileSink,
) -> Result<Option<WorkerGuard>, SetupError> {
    let (writer, guard) = tracing_appender::non_blocking(sink.open()?);

    let installed = tracing_subscriber::registry()
        .with(vec![
            fmt_layer(std::io::stderr, format),
            fmt_layer(writer, LogFormat::Json),
        ])
        .with(env_filter(level))
        .try_init()
        .is_ok();

    Ok(installed.then_some(guard))
}

/// Delete the oldest log files in `dir` until they fit in `max_bytes`.
///
/// Only files named with [`LOG_FILE_PREFIX`] are considered. Returns how
/// many files were removed.
///
/// # Errors
///
/// Returns [`SetupError::Io`] if the directory cannot be listed or a file
/// cannot be removed.
pub fn prune_logs(dir: &Path, max_bytes: u64) -> Result<usize, SetupError> {
    let entries = std::fs::read_dir(dir).map_err(|e| SetupError::io(dir, &e))?;

    let mut files: Vec<(SystemTime, u64, PathBuf)> = entries
        .filter_map(Result::ok)
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .starts_with(LOG_FILE_PREFIX)
        })
        .filter_map(|entry| {
            let meta = entry.metadata().ok()?;
            meta.is_file().then(|| {
                let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                (modified, meta.len(), entry.path())
            })
        })
        .collect();
    files.sort();

    let mut total: u64 = files.iter().map(|(_, len, _)| len).sum();
    let mut removed = 0;
    for (_, len, path) in files {
        if total <= max_bytes {
            break;
        }
        std::fs::remove_file(&path).map_err(|e| SetupError::io(&path, &e))?;
        total = total.saturating_sub(len);
        removed += 1;
    }
    Ok(removed)
}
