// src/exec/task.rs

//! One invocation of an external module.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Command;
use tracing::{error, info};

use crate::args::TaskDescriptor;
use crate::errors::ModuleError;
use crate::exec::options::RunnerOptions;
use crate::exec::pool::WorkerPool;
use crate::exec::scale::{PROGRESS_NOT_STARTED, PROGRESS_TERMINATED};
use crate::exec::supervisor::ProcessSupervisor;
use crate::future::ModuleFuture;

/// A module invocation that has not been started yet.
///
/// The future is available before [`start`](Self::start) so a caller can
/// cancel the task before it is ever scheduled.
#[derive(Debug)]
pub struct ModuleTask {
    descriptor: Arc<TaskDescriptor>,
    pause_poll_interval: Duration,
    future: ModuleFuture,
}

impl ModuleTask {
    /// Only the per-task knobs are taken from `options`; the pool size is
    /// applied where the [`WorkerPool`] is built.
    pub fn new(descriptor: TaskDescriptor, options: &RunnerOptions) -> Self {
        Self {
            descriptor: Arc::new(descriptor),
            pause_poll_interval: options.pause_poll_interval,
            future: ModuleFuture::new(),
        }
    }

    /// How often the running process is checked against the paused flag.
    pub fn pause_poll_interval(&self) -> Duration {
        self.pause_poll_interval
    }

    pub fn descriptor(&self) -> &TaskDescriptor {
        &self.descriptor
    }

    pub fn future(&self) -> ModuleFuture {
        self.future.clone()
    }

    /// Hand the task to the pool and return its future right away.
    ///
    /// A task canceled before this call never reaches the pool.
    pub fn start(self, pool: &WorkerPool) -> ModuleFuture {
        if self.future.is_canceled() {
            info!(
                module = %self.descriptor.executable().display(),
                "task canceled before scheduling; not submitting"
            );
            return ModuleFuture::canceled_result();
        }

        self.future.report_started();
        let future = self.future.clone();
        pool.submit(future.clone(), self.run());
        future
    }

    /// Execute the task on the current worker.
    ///
    /// Always leaves the future finished, whatever happens.
    pub async fn run(self) {
        let future = self.future;
        let descriptor = self.descriptor;
        let module = descriptor.executable().display().to_string();

        if !future.try_begin_running() {
            info!(%module, "task canceled before running; not spawning");
            future.report_finished();
            return;
        }

        future.set_progress_range(PROGRESS_NOT_STARTED, PROGRESS_TERMINATED);

        info!(%module, argv = ?descriptor.argv(), "starting module process");

        let mut cmd = Command::new(descriptor.executable());
        cmd.args(descriptor.argv())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match cmd.spawn() {
            Err(err) => {
                error!(%module, error = %err, "failed to spawn module process");
                future.report_exception(ModuleError::SpawnFailure {
                    executable: module.clone(),
                    reason: err.to_string(),
                });
            }
            Ok(child) => {
                let supervisor =
                    ProcessSupervisor::new(child, future.clone(), self.pause_poll_interval);
                let pid = supervisor.pid();

                match supervisor.run().await {
                    Ok(exit) => {
                        let stderr = String::from_utf8_lossy(&future.error_data()).into_owned();
                        info!(
                            %module,
                            ?pid,
                            exit_code = ?exit.status.code(),
                            success = exit.status.success(),
                            killed = exit.killed,
                            "module process exited"
                        );
                        if let Some(err) = exit_error(exit.status, stderr) {
                            future.report_exception(err);
                        }
                    }
                    Err(err) => {
                        error!(%module, ?pid, error = %err, "waiting for module process failed");
                        future.report_exception(ModuleError::Crashed {
                            code: None,
                            signal: None,
                            stderr: format!("waiting for module process: {err}"),
                        });
                    }
                }
            }
        }

        // No-op when the supervisor already saw the child exit.
        future.set_progress_value(PROGRESS_TERMINATED);
        future.report_finished();
    }
}

/// Classify a process exit. `None` means success.
pub(crate) fn exit_error(status: std::process::ExitStatus, stderr: String) -> Option<ModuleError> {
    if status.success() {
        return None;
    }
    match status.code() {
        Some(code) => Some(ModuleError::NonZeroExit { code, stderr }),
        None => Some(ModuleError::Crashed {
            code: None,
            signal: exit_signal(&status),
            stderr,
        }),
    }
}

#[cfg(unix)]
fn exit_signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}
