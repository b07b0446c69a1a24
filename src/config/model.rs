// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::args::{ParameterDescriptor, TaskDescriptor};
use crate::exec::RunnerOptions;
use crate::exec::options::{
    DEFAULT_PAUSE_POLL, DEFAULT_SCHEMA_FLAG, DEFAULT_SCHEMA_TIMEOUT, default_max_concurrent,
};

/// Manifest exactly as written in the TOML file.
///
/// ```toml
/// [runner]
/// max_concurrent = 2
///
/// [module]
/// path = "/usr/local/bin/blur"
///
/// [[module.parameter]]
/// name = "sigma"
/// long_flag = "sigma"
/// type = "double"
///
/// [[module.parameter]]
/// name = "input"
/// index = 0
/// type = "image"
///
/// [values]
/// sigma = "2.5"
/// input = "in.nrrd"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawManifest {
    #[serde(default)]
    pub runner: RunnerSection,

    pub module: ModuleSection,

    /// Current parameter values, by parameter name.
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

/// `[runner]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerSection {
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    #[serde(default = "default_pause_poll_ms")]
    pub pause_poll_ms: u64,

    #[serde(default = "default_schema_timeout_ms")]
    pub schema_timeout_ms: u64,

    #[serde(default = "default_schema_flag")]
    pub schema_flag: String,
}

fn default_pause_poll_ms() -> u64 {
    DEFAULT_PAUSE_POLL.as_millis() as u64
}

fn default_schema_timeout_ms() -> u64 {
    DEFAULT_SCHEMA_TIMEOUT.as_millis() as u64
}

fn default_schema_flag() -> String {
    DEFAULT_SCHEMA_FLAG.to_string()
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            pause_poll_ms: default_pause_poll_ms(),
            schema_timeout_ms: default_schema_timeout_ms(),
            schema_flag: default_schema_flag(),
        }
    }
}

impl RunnerSection {
    pub fn options(&self) -> RunnerOptions {
        RunnerOptions {
            max_concurrent: self.max_concurrent,
            pause_poll_interval: Duration::from_millis(self.pause_poll_ms),
            schema_timeout: Duration::from_millis(self.schema_timeout_ms),
            schema_flag: self.schema_flag.clone(),
        }
    }
}

/// `[module]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleSection {
    pub path: PathBuf,

    /// `[[module.parameter]]` entries, in declaration order.
    #[serde(default, rename = "parameter")]
    pub parameters: Vec<RawParameter>,
}

/// One `[[module.parameter]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RawParameter {
    pub name: String,

    #[serde(default)]
    pub index: Option<usize>,

    #[serde(default)]
    pub flag: Option<String>,

    #[serde(default)]
    pub long_flag: Option<String>,

    /// Type tag, e.g. `"integer"` or `"string-enumeration"`.
    #[serde(rename = "type")]
    pub type_tag: String,

    #[serde(default)]
    pub multiple: bool,
}

/// A validated manifest.
///
/// Only obtainable through `TryFrom<RawManifest>`, so holding one means the
/// parameter schema is consistent.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub runner: RunnerSection,
    pub path: PathBuf,
    pub parameters: Vec<ParameterDescriptor>,
    pub values: BTreeMap<String, String>,
}

impl Manifest {
    pub(crate) fn new_unchecked(
        runner: RunnerSection,
        path: PathBuf,
        parameters: Vec<ParameterDescriptor>,
        values: BTreeMap<String, String>,
    ) -> Self {
        Self {
            runner,
            path,
            parameters,
            values,
        }
    }

    pub fn options(&self) -> RunnerOptions {
        self.runner.options()
    }

    /// Executable plus argv rendered from the declared values.
    pub fn task_descriptor(&self) -> TaskDescriptor {
        TaskDescriptor::from_parameters(&self.path, &self.parameters, &self.values)
    }
}
