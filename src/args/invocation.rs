// src/args/invocation.rs

use std::path::{Path, PathBuf};

use crate::args::builder::{ParameterValues, build_arguments};
use crate::args::descriptor::ParameterDescriptor;

/// Executable plus argv for one module run.
///
/// Built once before the task starts and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDescriptor {
    executable: PathBuf,
    argv: Vec<String>,
}

impl TaskDescriptor {
    pub fn new(executable: impl Into<PathBuf>, argv: Vec<String>) -> Self {
        Self {
            executable: executable.into(),
            argv,
        }
    }

    /// Render argv from a parameter schema and the current values.
    pub fn from_parameters<V>(
        executable: impl Into<PathBuf>,
        descriptors: &[ParameterDescriptor],
        values: &V,
    ) -> Self
    where
        V: ParameterValues + ?Sized,
    {
        Self::new(executable, build_arguments(descriptors, values))
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Shell-like rendering for logs and dry runs.
    pub fn command_line(&self) -> String {
        let mut parts = vec![self.executable.display().to_string()];
        parts.extend(self.argv.iter().map(|arg| {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                format!("{arg:?}")
            } else {
                arg.clone()
            }
        }));
        parts.join(" ")
    }
}
