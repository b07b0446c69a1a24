#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use modrun::config::{Manifest, ModuleSection, RawManifest, RawParameter, RunnerSection};

/// Builder for `Manifest` to simplify test setup.
pub struct ManifestBuilder {
    manifest: RawManifest,
}

impl ManifestBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            manifest: RawManifest {
                runner: RunnerSection::default(),
                module: ModuleSection {
                    path: path.into(),
                    parameters: Vec::new(),
                },
                values: BTreeMap::new(),
            },
        }
    }

    pub fn max_concurrent(mut self, max: usize) -> Self {
        self.manifest.runner.max_concurrent = max;
        self
    }

    pub fn pause_poll_ms(mut self, ms: u64) -> Self {
        self.manifest.runner.pause_poll_ms = ms;
        self
    }

    pub fn with_parameter(mut self, parameter: RawParameter) -> Self {
        self.manifest.module.parameters.push(parameter);
        self
    }

    pub fn with_value(mut self, name: &str, value: &str) -> Self {
        self.manifest
            .values
            .insert(name.to_string(), value.to_string());
        self
    }

    /// The unvalidated manifest, for exercising validation errors.
    pub fn build_raw(self) -> RawManifest {
        self.manifest
    }

    pub fn build(self) -> Manifest {
        Manifest::try_from(self.manifest).expect("Failed to build valid manifest from builder")
    }
}

/// Builder for `RawParameter`.
pub struct ParameterBuilder {
    parameter: RawParameter,
}

impl ParameterBuilder {
    pub fn new(name: &str, type_tag: &str) -> Self {
        Self {
            parameter: RawParameter {
                name: name.to_string(),
                index: None,
                flag: None,
                long_flag: None,
                type_tag: type_tag.to_string(),
                multiple: false,
            },
        }
    }

    pub fn index(mut self, index: usize) -> Self {
        self.parameter.index = Some(index);
        self
    }

    pub fn flag(mut self, flag: &str) -> Self {
        self.parameter.flag = Some(flag.to_string());
        self
    }

    pub fn long_flag(mut self, flag: &str) -> Self {
        self.parameter.long_flag = Some(flag.to_string());
        self
    }

    pub fn multiple(mut self) -> Self {
        self.parameter.multiple = true;
        self
    }

    pub fn build(self) -> RawParameter {
        self.parameter
    }
}
