// src/exec/schema.rs

//! The schema handshake: run a module with its schema flag and collect
//! what it prints.
//!
//! This is the only time-bounded module invocation. The text is returned
//! as-is; turning it into parameter descriptors is up to the caller.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::errors::ModuleError;
use crate::exec::task::exit_error;

pub async fn fetch_schema(
    executable: &Path,
    flag: &str,
    timeout: Duration,
) -> Result<String, ModuleError> {
    let module = executable.display().to_string();
    debug!(%module, flag, ?timeout, "requesting module schema");

    let child = Command::new(executable)
        .arg(flag)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|err| ModuleError::SpawnFailure {
            executable: module.clone(),
            reason: err.to_string(),
        })?;

    // On timeout the child is dropped, which kills it.
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|err| ModuleError::Crashed {
            code: None,
            signal: None,
            stderr: format!("waiting for schema output: {err}"),
        })?,
        Err(_) => {
            warn!(%module, ?timeout, "schema request timed out");
            return Err(ModuleError::Timeout {
                executable: module,
                after_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            });
        }
    };

    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    if let Some(err) = exit_error(output.status, stderr) {
        return Err(err);
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
