// src/logging.rs

//! Logging setup for `modrun` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the filter:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `MODRUN_LOG` environment variable: either a bare level ("debug") or
//!    full filter directives ("modrun::progress=error,modrun=debug")
//! 3. default to `info`
//!
//! A bare level only applies to modrun's own targets; other crates stay at
//! `warn`. Directives allow per-module filtering, e.g. silencing protocol
//! diagnostics from `modrun::progress` while tracing `modrun::exec`.
//!
//! Logs go to STDERR; STDOUT carries the module's own output.

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

/// Environment variable holding the log level or filter directives.
pub const LOG_ENV: &str = "MODRUN_LOG";

const CRATE_TARGET: &str = "modrun";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let filter = build_filter(cli_level, env.as_deref())?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))?;

    Ok(())
}

/// Parse the directives chosen by [`filter_directives`].
pub fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> Result<EnvFilter> {
    let directives = filter_directives(cli_level, env);
    EnvFilter::try_new(&directives)
        .with_context(|| format!("invalid {LOG_ENV} filter '{directives}'"))
}

/// Filter directives for the given CLI level and `MODRUN_LOG` value.
pub fn filter_directives(cli_level: Option<LogLevel>, env: Option<&str>) -> String {
    if let Some(lvl) = cli_level {
        return crate_directives(level_from_log_level(lvl));
    }
    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(spec) => match parse_level_str(spec) {
            Some(level) => crate_directives(level),
            None => spec.to_string(),
        },
        None => crate_directives(tracing::Level::INFO),
    }
}

fn crate_directives(level: tracing::Level) -> String {
    format!(
        "warn,{CRATE_TARGET}={}",
        level.as_str().to_ascii_lowercase()
    )
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

pub fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
