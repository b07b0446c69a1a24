// src/exec/supervisor.rs

//! Binds a running module process to its [`ModuleFuture`].
//!
//! While the process runs, the supervisor is the only writer of the
//! future's progress, results and output. It:
//! - feeds stdout through a [`ProgressParser`] and applies the events
//! - forwards stderr unparsed
//! - kills the child when the future is canceled
//! - polls the future's paused flag and stops / continues the child

use std::pin::Pin;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::time::{MissedTickBehavior, Sleep};
use tracing::{debug, info, warn};

use crate::errors::ModuleError;
use crate::exec::scale::ProgressScale;
use crate::exec::signals;
use crate::future::ModuleFuture;
use crate::progress::{ParserEvent, ProgressEvent, ProgressParser};

const READ_CHUNK: usize = 8 * 1024;

/// How long the pipes are still read once the child has exited. A process
/// the module left behind may hold them open indefinitely.
pub const EXIT_DRAIN_GRACE: Duration = Duration::from_millis(500);

/// How the supervised process ended.
#[derive(Debug, Clone, Copy)]
pub struct SupervisedExit {
    pub status: std::process::ExitStatus,
    /// The supervisor killed the child because the future was canceled.
    pub killed: bool,
}

#[derive(Debug)]
pub struct ProcessSupervisor {
    child: Child,
    future: ModuleFuture,
    parser: ProgressParser,
    scale: ProgressScale,
    poll_interval: Duration,
    suspended: bool,
    pause_unsupported_logged: bool,
}

impl ProcessSupervisor {
    pub fn new(child: Child, future: ModuleFuture, poll_interval: Duration) -> Self {
        Self {
            child,
            future,
            parser: ProgressParser::new(),
            scale: ProgressScale::new(),
            poll_interval: poll_interval.max(Duration::from_millis(1)),
            suspended: false,
            pause_unsupported_logged: false,
        }
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Drive the child until it exits.
    ///
    /// The exit status is collected as soon as the child exits. The output
    /// pipes are then read until EOF, for at most [`EXIT_DRAIN_GRACE`].
    pub async fn run(mut self) -> std::io::Result<SupervisedExit> {
        let mut stdout = self.child.stdout.take();
        let mut stderr = self.child.stderr.take();
        let mut out_buf = vec![0u8; READ_CHUNK];
        let mut err_buf = vec![0u8; READ_CHUNK];

        let mut pause_poll = tokio::time::interval(self.poll_interval);
        pause_poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let future = self.future.clone();
        let mut killed = false;
        let mut exited: Option<std::process::ExitStatus> = None;
        let mut drain_deadline: Option<Pin<Box<Sleep>>> = None;

        let status = loop {
            if stdout.is_none() && stderr.is_none() {
                if let Some(status) = exited {
                    break status;
                }
            }

            tokio::select! {
                read = read_chunk(&mut stdout, &mut out_buf) => match read {
                    Ok(0) => {
                        stdout = None;
                        self.handle_stdout_eof();
                    }
                    Ok(n) => self.handle_stdout(&out_buf[..n]),
                    Err(err) => {
                        warn!(pid = ?self.child.id(), error = %err, "reading module stdout failed");
                        stdout = None;
                        self.handle_stdout_eof();
                    }
                },

                read = read_chunk(&mut stderr, &mut err_buf) => match read {
                    Ok(0) => stderr = None,
                    Ok(n) => self.handle_stderr(&err_buf[..n]),
                    Err(err) => {
                        warn!(pid = ?self.child.id(), error = %err, "reading module stderr failed");
                        stderr = None;
                    }
                },

                _ = future.cancelled(), if !killed && exited.is_none() => {
                    killed = true;
                    self.terminate();
                }

                _ = pause_poll.tick(), if exited.is_none() => self.poll_pause(),

                status = self.child.wait(), if exited.is_none() => {
                    let status = status?;
                    debug!(?status, killed, "module process exited");
                    exited = Some(status);
                    drain_deadline = Some(Box::pin(tokio::time::sleep(EXIT_DRAIN_GRACE)));
                }

                _ = deadline(&mut drain_deadline) => {
                    if let Some(status) = exited {
                        warn!(
                            ?status,
                            "module output still open after exit; a leftover process holds it"
                        );
                        break status;
                    }
                }
            }
        };

        if stdout.is_some() {
            self.handle_stdout_eof();
        }
        let terminated = self.scale.on_terminated();
        self.future.set_progress_value(terminated);
        Ok(SupervisedExit { status, killed })
    }

    /// Feed one stdout chunk through the parser and apply what it yields.
    pub fn handle_stdout(&mut self, chunk: &[u8]) {
        let events = self.parser.feed(chunk);
        self.apply_all(events);
    }

    /// Stdout reached EOF.
    pub fn handle_stdout_eof(&mut self) {
        let events = self.parser.finish();
        self.apply_all(events);
    }

    pub fn handle_stderr(&mut self, chunk: &[u8]) {
        self.future.report_error_bytes(chunk);
    }

    fn apply_all(&mut self, events: Vec<ParserEvent>) {
        for event in events {
            match event {
                ParserEvent::Progress(event) => self.apply(event),
                ParserEvent::Output(bytes) => self.future.report_output_bytes(&bytes),
            }
        }
    }

    fn apply(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::Start { name, comment } => {
                let value = self.scale.on_filter_start();
                debug!(filter = %name, value, "filter started");
                self.future
                    .set_progress_value_and_text(value, label(&name, &comment));
            }
            ProgressEvent::Progress { fraction, comment } => {
                let value = self.scale.on_fraction(fraction);
                if comment.is_empty() {
                    self.future.set_progress_value(value);
                } else {
                    self.future.set_progress_value_and_text(value, &comment);
                }
            }
            ProgressEvent::Result { parameter, value } => {
                debug!(%parameter, %value, "module reported result");
                self.future.report_result(&parameter, &value);
            }
            ProgressEvent::End { name, comment } => {
                let value = self.scale.on_filter_end();
                debug!(filter = %name, value, "filter finished");
                self.future
                    .set_progress_value_and_text(value, label(&name, &comment));
            }
            ProgressEvent::Error(error) => self.future.report_protocol_error(error),
        }
    }

    fn terminate(&mut self) {
        info!(pid = ?self.child.id(), "cancellation requested; killing module process");
        if let Err(err) = self.child.start_kill() {
            warn!(pid = ?self.child.id(), error = %err, "failed to kill module process");
        }
    }

    /// Bring the child's run state in line with the future's paused flag.
    ///
    /// Called on a fixed interval, so a pause takes effect up to one poll
    /// period late and the child may emit a little more output meanwhile.
    pub fn poll_pause(&mut self) {
        let wanted = self.future.is_paused();
        if wanted == self.suspended {
            return;
        }
        let Some(pid) = self.child.id() else {
            return;
        };

        let result = if wanted {
            signals::suspend(pid)
        } else {
            signals::resume(pid)
        };

        match result {
            Ok(()) => {
                info!(pid, paused = wanted, "module process run state changed");
            }
            Err(ModuleError::NotImplemented(what)) => {
                if !self.pause_unsupported_logged {
                    warn!(pid, %what, "pause requested but not supported; module keeps running");
                    self.pause_unsupported_logged = true;
                }
            }
            Err(err) => {
                warn!(pid, error = %err, "failed to change module process run state");
            }
        }
        self.suspended = wanted;
    }
}

fn label<'a>(name: &'a str, comment: &'a str) -> &'a str {
    if comment.is_empty() { name } else { comment }
}

/// Wait for an optional deadline; no deadline never becomes ready.
async fn deadline(sleep: &mut Option<Pin<Box<Sleep>>>) {
    match sleep {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

/// Read from an optional pipe; a closed pipe never becomes ready.
async fn read_chunk<R>(reader: &mut Option<R>, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    match reader {
        Some(reader) => reader.read(buf).await,
        None => std::future::pending().await,
    }
}
