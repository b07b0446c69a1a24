// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `modrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "modrun",
    version,
    about = "Run a command-line module and follow its progress.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the module manifest (TOML).
    #[arg(long, value_name = "PATH", default_value = "Module.toml")]
    pub manifest: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `MODRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the command line that would be run, but don't run it.
    #[arg(long, conflicts_with = "schema")]
    pub dry_run: bool,

    /// Ask the module for its parameter schema and print it.
    #[arg(long)]
    pub schema: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
