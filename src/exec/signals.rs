// src/exec/signals.rs

//! Suspending and resuming a child process.
//!
//! Unix sends `SIGSTOP` / `SIGCONT` through `nix`. Elsewhere both calls
//! return [`ModuleError::NotImplemented`] and the child keeps running.

use crate::errors::ModuleError;

#[cfg(unix)]
fn send(pid: u32, signal: nix::sys::signal::Signal) -> Result<(), ModuleError> {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let raw = i32::try_from(pid).map_err(|_| ModuleError::Invocation(format!("invalid pid {pid}")))?;
    kill(Pid::from_raw(raw), signal)
        .map_err(|errno| ModuleError::Invocation(format!("sending {signal:?} to pid {pid}: {errno}")))
}

#[cfg(unix)]
pub fn suspend(pid: u32) -> Result<(), ModuleError> {
    send(pid, nix::sys::signal::Signal::SIGSTOP)
}

#[cfg(unix)]
pub fn resume(pid: u32) -> Result<(), ModuleError> {
    send(pid, nix::sys::signal::Signal::SIGCONT)
}

#[cfg(not(unix))]
pub fn suspend(_pid: u32) -> Result<(), ModuleError> {
    Err(ModuleError::NotImplemented(
        "process suspension on this platform".to_string(),
    ))
}

#[cfg(not(unix))]
pub fn resume(_pid: u32) -> Result<(), ModuleError> {
    Err(ModuleError::NotImplemented(
        "process resumption on this platform".to_string(),
    ))
}
