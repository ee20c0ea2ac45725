use anyhow::Result;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::ConsoleConfig;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str =
    "info,launchpad_app=debug,launchpad_deploy=debug,launchpad_chain=debug,launchpad_core=debug";

/// Log file prefix inside the logs directory (rotated daily).
const LOG_FILE_PREFIX: &str = "launchpad";

/// Initializes logging with a rolling file in `~/.launchpad/logs` plus a compact
/// console layer. The returned guard must outlive the program's logging.
pub fn init_logging(level: &str) -> Result<WorkerGuard> {
    let logs_dir = ConsoleConfig::logs_dir()?;
    std::fs::create_dir_all(&logs_dir)?;

    let file_appender = tracing_appender::rolling::daily(&logs_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_for_level(level)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .with(fmt::layer().with_target(false).compact())
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(guard)
}

/// Initialize file-only logging into `logs_dir` with an explicit filter.
pub fn init_logging_to_dir(logs_dir: &Path, filter: &str) -> Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)?;

    let file_appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(guard)
}

/// Map the configured `log_level` onto a filter directive. Unknown levels fall
/// back to [`DEFAULT_FILTER`].
pub fn filter_for_level(level: &str) -> String {
    let level = level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => format!("{level},launchpad_deploy=debug"),
        _ => DEFAULT_FILTER.to_string(),
    }
}
