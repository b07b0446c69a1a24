// src/future/state.rs

//! The state block guarded by a future's mutex.

use crate::errors::{ModuleError, ProtocolError};

/// A `(parameter, value)` pair reported by a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleResult {
    pub parameter: String,
    pub value: String,
}

/// Progress snapshot: `value` always lies within `[minimum, maximum]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    pub minimum: i32,
    pub maximum: i32,
    pub value: i32,
    pub text: String,
}

/// How a finished task ended, as seen by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The module ran to completion. `protocol_errors` counts malformed
    /// progress diagnostics, which do not fail the task.
    Succeeded { results: usize, protocol_errors: usize },
    Failed(ModuleError),
    Canceled,
}

#[derive(Debug, Default)]
pub(crate) struct FutureState {
    pub started: bool,
    pub running: bool,
    pub paused: bool,
    pub canceled: bool,
    pub finished: bool,

    pub progress: Progress,

    pub error: Option<ModuleError>,
    pub protocol_errors: Vec<ProtocolError>,

    pub output: Vec<u8>,
    pub output_read: usize,
    pub error_output: Vec<u8>,
    pub error_read: usize,

    pub results: Vec<ModuleResult>,
}

impl FutureState {
    /// Clamp `value` into the current range.
    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.progress.minimum, self.progress.maximum)
    }

    pub fn outcome(&self) -> Option<Outcome> {
        if !self.finished {
            return None;
        }
        if self.canceled {
            return Some(Outcome::Canceled);
        }
        match &self.error {
            Some(err) => Some(Outcome::Failed(err.clone())),
            None => Some(Outcome::Succeeded {
                results: self.results.len(),
                protocol_errors: self.protocol_errors.len(),
            }),
        }
    }
}
