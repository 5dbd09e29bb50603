//! Agent orchestrator binary entry point.
//!
//! Reports are printed to stdout as JSON. Logs go to stderr and to a JSON
//! log file in the configured logs directory.
//!
//! Coverage is excluded because `main` only wires configuration, logging and
//! the library entry points together.

// Enable the coverage attribute when running with nightly for llvm-cov exclusions
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_appender::non_blocking::WorkerGuard;

use agent_orchestrator::agents::AgentManager;
use agent_orchestrator::config::Config;
use agent_orchestrator::error::{AppError, SetupError};
use agent_orchestrator::logging::{init_logging, init_logging_with_file, FileSink};
use agent_orchestrator::metrics::MetricsAggregator;
use agent_orchestrator::setup::SetupRunner;

#[derive(Debug, Parser)]
#[command(name = "agent-orchestrator", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Profile this machine, plan resource limits and write workspace_config.json.
    Setup {
        /// Project root (default: ORCHESTRATOR_PROJECT_PATH or the current directory).
        #[arg(long)]
        project_path: Option<PathBuf>,

        /// Create the workspace and configured directories before validating.
        #[arg(long)]
        create_dirs: bool,
    },
    /// Run the default researcher/coder workflow and print the metrics summary.
    Orchestrate {
        /// Project root holding workspace_config.json (default: ORCHESTRATOR_PROJECT_PATH or the current directory).
        #[arg(long)]
        project_path: Option<PathBuf>,
    },
}

impl Command {
    fn project_path(&self) -> Option<PathBuf> {
        match self {
            Self::Setup { project_path, .. } | Self::Orchestrate { project_path } => {
                project_path.clone()
            }
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            // logging is not up yet
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };
    let mut config = config.with_project_path(cli.command.project_path());

    // planned limits, including the log budget, apply before logging starts
    let overrides = match cli.command {
        Command::Orchestrate { .. } => Some(config.load_workspace_overrides()),
        Command::Setup { .. } => None,
    };
    let log_guard = start_logging(&config);

    tracing::info!(
        environment = ?config.environment,
        project = %config.project_path.display(),
        logs = %config.paths.logs.display(),
        "agent-orchestrator starting"
    );

    let result = match (cli.command, overrides) {
        (Command::Setup { create_dirs, .. }, _) => run_setup(config, create_dirs).await,
        (Command::Orchestrate { .. }, overrides) => {
            run_orchestrate(config, overrides.unwrap_or(Ok(false))).await
        }
    };

    if let Err(e) = result {
        tracing::error!("{e}");
        drop(log_guard);
        std::process::exit(1);
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
fn start_logging(config: &Config) -> Option<WorkerGuard> {
    let sink = FileSink::new(&config.paths.logs, config.max_log_size_gb);
    match init_logging_with_file(&config.log_level, config.log_format, &sink) {
        Ok(guard) => guard,
        Err(e) => {
            init_logging(&config.log_level, config.log_format);
            tracing::warn!(error = %e, "File logging unavailable, logging to stderr only");
            None
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
async fn run_setup(config: Config, create_dirs: bool) -> Result<(), AppError> {
    if create_dirs {
        config.paths.create_directories()?;
    }

    let mut runner = SetupRunner::new()
        .with_min_runtime_version(config.min_runtime_version)
        .create_dirs(create_dirs);
    if let Some(path) = config.workspace_config {
        runner = runner.with_snapshot_path(path);
    }

    let report = runner.run(&config.project_path).await?;
    print_json(&report);
    Ok(())
}

#[cfg_attr(coverage_nightly, coverage(off))]
async fn run_orchestrate(
    config: Config,
    overrides: Result<bool, SetupError>,
) -> Result<(), AppError> {
    if !overrides? {
        tracing::info!("No workspace snapshot found, using configured limits");
    }

    let metrics = Arc::new(MetricsAggregator::new());
    let manager = AgentManager::with_default_agents(
        Arc::clone(&metrics),
        config.max_concurrent_agents,
    );
    for outcome in manager.orchestrate().await? {
        tracing::info!(
            agent = %outcome.agent_name,
            output = %outcome.output,
            "Result received"
        );
    }

    print_json(&metrics.summary());
    Ok(())
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!(error = %e, "Failed to encode report"),
    }
}
