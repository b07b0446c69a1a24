// src/config/validate.rs

use std::collections::HashSet;

use crate::args::ParameterDescriptor;
use crate::config::model::{Manifest, RawManifest, RawParameter, RunnerSection};
use crate::errors::{ModrunError, Result};
use crate::types::ParameterType;

impl TryFrom<RawManifest> for Manifest {
    type Error = ModrunError;

    fn try_from(raw: RawManifest) -> std::result::Result<Self, Self::Error> {
        validate_runner(&raw.runner)?;
        validate_module_path(&raw)?;
        let parameters = resolve_parameters(&raw.module.parameters)?;
        validate_values(&raw, &parameters)?;
        Ok(Manifest::new_unchecked(
            raw.runner,
            raw.module.path,
            parameters,
            raw.values,
        ))
    }
}

fn validate_runner(runner: &RunnerSection) -> Result<()> {
    if runner.max_concurrent == 0 {
        return Err(ModrunError::ConfigError(
            "[runner].max_concurrent must be >= 1 (got 0)".to_string(),
        ));
    }
    if runner.pause_poll_ms == 0 {
        return Err(ModrunError::ConfigError(
            "[runner].pause_poll_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    if runner.schema_timeout_ms == 0 {
        return Err(ModrunError::ConfigError(
            "[runner].schema_timeout_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    if runner.schema_flag.trim().is_empty() {
        return Err(ModrunError::ConfigError(
            "[runner].schema_flag must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_module_path(raw: &RawManifest) -> Result<()> {
    if raw.module.path.as_os_str().is_empty() {
        return Err(ModrunError::ConfigError(
            "[module].path must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn resolve_parameters(raw: &[RawParameter]) -> Result<Vec<ParameterDescriptor>> {
    let mut names = HashSet::new();
    let mut indices = HashSet::new();
    let mut resolved = Vec::with_capacity(raw.len());

    for param in raw {
        let name = param.name.trim();
        if name.is_empty() {
            return Err(ModrunError::ConfigError(
                "module parameter with empty name".to_string(),
            ));
        }
        if !names.insert(name.to_string()) {
            return Err(ModrunError::ConfigError(format!(
                "parameter '{name}' is declared more than once"
            )));
        }

        let kind = ParameterType::from_tag(&param.type_tag).ok_or_else(|| {
            ModrunError::UnknownParameterType(format!(
                "parameter '{}' has type '{}'",
                name, param.type_tag
            ))
        })?;

        let has_flag = non_empty(&param.flag) || non_empty(&param.long_flag);
        match param.index {
            Some(index) => {
                if has_flag {
                    return Err(ModrunError::ConfigError(format!(
                        "parameter '{name}' has both an index and a flag"
                    )));
                }
                if !indices.insert(index) {
                    return Err(ModrunError::ConfigError(format!(
                        "parameter '{name}' reuses index {index}"
                    )));
                }
            }
            None if !has_flag => {
                return Err(ModrunError::ConfigError(format!(
                    "parameter '{name}' needs either an index or a flag"
                )));
            }
            None => {}
        }

        resolved.push(ParameterDescriptor {
            name: name.to_string(),
            index: param.index,
            flag: param.flag.clone().filter(|f| !f.trim().is_empty()),
            long_flag: param.long_flag.clone().filter(|f| !f.trim().is_empty()),
            kind,
            multiple: param.multiple,
        });
    }

    Ok(resolved)
}

fn validate_values(raw: &RawManifest, parameters: &[ParameterDescriptor]) -> Result<()> {
    for name in raw.values.keys() {
        if !parameters.iter().any(|p| &p.name == name) {
            return Err(ModrunError::ConfigError(format!(
                "value given for unknown parameter '{name}'"
            )));
        }
    }
    Ok(())
}

fn non_empty(flag: &Option<String>) -> bool {
    flag.as_deref().is_some_and(|f| !f.trim().is_empty())
}
