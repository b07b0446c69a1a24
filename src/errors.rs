// src/errors.rs

//! Crate-wide error types.
//!
//! - [`ModrunError`] is what library entry points (config loading, pool
//!   construction) return.
//! - [`ModuleError`] is the run-exception taxonomy attached to a
//!   [`ModuleFuture`](crate::future::ModuleFuture) when a module fails.
//! - [`ProtocolError`] is the non-fatal diagnostic for malformed progress
//!   markup.

use thiserror::Error;

use crate::types::{ExitStatus, ProcessErrorKind};

#[derive(Error, Debug)]
pub enum ModrunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unknown parameter type: {0}")]
    UnknownParameterType(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Module(#[from] ModuleError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ModrunError>;

/// Failure of a single module invocation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModuleError {
    #[error("failed to start module '{executable}': {reason}")]
    SpawnFailure { executable: String, reason: String },

    #[error("module '{executable}' did not answer within {after_ms} ms")]
    Timeout { executable: String, after_ms: u64 },

    #[error("module exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("module crashed (code {code:?}, signal {signal:?}): {stderr}")]
    Crashed {
        code: Option<i32>,
        signal: Option<i32>,
        stderr: String,
    },

    #[error("module function failed: {0}")]
    Invocation(String),

    #[error("not implemented: {0}")]
    NotImplemented(String),
}

impl ModuleError {
    pub fn kind(&self) -> ProcessErrorKind {
        match self {
            ModuleError::SpawnFailure { .. } => ProcessErrorKind::FailedToStart,
            ModuleError::Timeout { .. } => ProcessErrorKind::TimedOut,
            ModuleError::Crashed { .. } => ProcessErrorKind::Crashed,
            ModuleError::NonZeroExit { .. }
            | ModuleError::Invocation(_)
            | ModuleError::NotImplemented(_) => ProcessErrorKind::Other,
        }
    }

    /// Exit code carried by the error, `-1` when there is none.
    pub fn exit_code(&self) -> i32 {
        match self {
            ModuleError::NonZeroExit { code, .. } => *code,
            ModuleError::Crashed { code: Some(code), .. } => *code,
            _ => -1,
        }
    }

    pub fn exit_status(&self) -> ExitStatus {
        match self {
            ModuleError::Crashed { .. } => ExitStatus::Crashed,
            _ => ExitStatus::Normal,
        }
    }
}

/// Malformed progress markup seen on a module's stdout.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Error parsing progress XML at line {line}, column {column}: {message}")]
pub struct ProtocolError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}
