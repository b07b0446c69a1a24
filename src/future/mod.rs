// src/future/mod.rs

//! Shared, thread-safe handle to the eventual outcome of a module run.
//!
//! A [`ModuleFuture`] is cloned between the caller that started a task and
//! the worker that executes it. All state lives in one block behind a single
//! mutex; the worker is the only writer while the task runs, and once the
//! future is finished nothing changes anymore.
//!
//! Two families of methods exist:
//! - the observing side (`is_*`, progress accessors, results, output reads,
//!   `cancel`, `set_paused`, waiting)
//! - the reporting side (`report_*`, `set_progress_*`), used by the task and
//!   its process supervisor.

mod events;
mod state;

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{Notify, broadcast};
use tracing::debug;

use crate::errors::{ModuleError, ProtocolError};
use crate::types::{ExitStatus, ProcessErrorKind};

pub use events::FutureEvent;
pub use state::{ModuleResult, Outcome, Progress};

use state::FutureState;

const EVENT_CAPACITY: usize = 256;

struct Shared {
    state: Mutex<FutureState>,
    finished_cv: Condvar,
    finished_notify: Notify,
    canceled_notify: Notify,
    events: broadcast::Sender<FutureEvent>,
}

/// Reference-counted handle to a task's shared state.
#[derive(Clone)]
pub struct ModuleFuture {
    inner: Arc<Shared>,
}

impl fmt::Debug for ModuleFuture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ModuleFuture")
            .field("started", &state.started)
            .field("running", &state.running)
            .field("paused", &state.paused)
            .field("canceled", &state.canceled)
            .field("finished", &state.finished)
            .field("progress", &state.progress)
            .finish_non_exhaustive()
    }
}

impl Default for ModuleFuture {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleFuture {
    /// A fresh, not-yet-started future.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Shared {
                state: Mutex::new(FutureState::default()),
                finished_cv: Condvar::new(),
                finished_notify: Notify::new(),
                canceled_notify: Notify::new(),
                events,
            }),
        }
    }

    /// An already finished and canceled future with no process behind it.
    pub fn canceled_result() -> Self {
        let future = Self::new();
        {
            let mut state = future.lock();
            state.canceled = true;
            state.finished = true;
        }
        future
    }

    fn lock(&self) -> MutexGuard<'_, FutureState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: FutureEvent) {
        // No receivers is fine.
        let _ = self.inner.events.send(event);
    }

    fn wake_finished(&self) {
        self.inner.finished_cv.notify_all();
        self.inner.finished_notify.notify_waiters();
    }

    /// Subscribe to state-change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<FutureEvent> {
        self.inner.events.subscribe()
    }

    /// Whether both handles point at the same task.
    pub fn same_task(&self, other: &ModuleFuture) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ----- control -----

    /// Request cancellation. Idempotent.
    ///
    /// If the task has not entered its running phase yet, the future is
    /// finished right away and no process will ever be created. Otherwise
    /// the process supervisor kills the child and the task finishes once the
    /// exit has been reported.
    pub fn cancel(&self) {
        let finished_now = {
            let mut state = self.lock();
            if state.finished {
                return;
            }
            if !state.canceled {
                state.canceled = true;
                state.paused = false;
                self.emit(FutureEvent::Canceled);
            }
            if !state.running {
                state.finished = true;
                self.emit(FutureEvent::Finished);
                true
            } else {
                false
            }
        };

        debug!(finished_now, "module future canceled");
        self.inner.canceled_notify.notify_waiters();
        if finished_now {
            self.wake_finished();
        }
    }

    /// Request pause (`true`) or resume (`false`).
    ///
    /// This only flips the flag; the process supervisor polls it and
    /// suspends the child where the platform allows. On platforms without
    /// signal-based suspension the child keeps running.
    pub fn set_paused(&self, paused: bool) {
        let mut state = self.lock();
        if state.finished || state.canceled || state.paused == paused {
            return;
        }
        state.paused = paused;
        self.emit(if paused {
            FutureEvent::Paused
        } else {
            FutureEvent::Resumed
        });
    }

    pub fn pause(&self) {
        self.set_paused(true);
    }

    pub fn resume(&self) {
        self.set_paused(false);
    }

    pub fn toggle_paused(&self) {
        let paused = self.is_paused();
        self.set_paused(!paused);
    }

    // ----- lifecycle queries -----

    pub fn is_started(&self) -> bool {
        self.lock().started
    }

    pub fn is_running(&self) -> bool {
        let state = self.lock();
        state.running && !state.finished
    }

    pub fn is_paused(&self) -> bool {
        self.lock().paused
    }

    pub fn is_canceled(&self) -> bool {
        self.lock().canceled
    }

    pub fn is_finished(&self) -> bool {
        self.lock().finished
    }

    /// Final classification, `None` while the task is still going.
    pub fn outcome(&self) -> Option<Outcome> {
        self.lock().outcome()
    }

    // ----- waiting -----

    /// Block the calling thread until the future is finished.
    ///
    /// Returns immediately if it already is. Do not call this from inside an
    /// async task; use [`finished`](Self::finished) there.
    pub fn wait_for_finished(&self) {
        let mut state = self.lock();
        while !state.finished {
            state = self
                .inner
                .finished_cv
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`wait_for_finished`](Self::wait_for_finished) with an upper
    /// bound. Returns whether the future finished in time.
    pub fn wait_for_finished_timeout(&self, timeout: Duration) -> bool {
        let state = self.lock();
        let (state, _) = self
            .inner
            .finished_cv
            .wait_timeout_while(state, timeout, |s| !s.finished)
            .unwrap_or_else(PoisonError::into_inner);
        state.finished
    }

    /// Resolve once the future is finished.
    pub async fn finished(&self) {
        loop {
            let notified = self.inner.finished_notify.notified();
            if self.is_finished() {
                return;
            }
            notified.await;
        }
    }

    /// Resolve once cancellation has been requested.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.canceled_notify.notified();
            if self.is_canceled() {
                return;
            }
            notified.await;
        }
    }

    // ----- progress -----

    pub fn progress(&self) -> Progress {
        self.lock().progress.clone()
    }

    pub fn progress_range(&self) -> (i32, i32) {
        let state = self.lock();
        (state.progress.minimum, state.progress.maximum)
    }

    pub fn progress_minimum(&self) -> i32 {
        self.lock().progress.minimum
    }

    pub fn progress_maximum(&self) -> i32 {
        self.lock().progress.maximum
    }

    pub fn progress_value(&self) -> i32 {
        self.lock().progress.value
    }

    pub fn progress_text(&self) -> String {
        self.lock().progress.text.clone()
    }

    // ----- results and output -----

    pub fn results(&self) -> Vec<ModuleResult> {
        self.lock().results.clone()
    }

    pub fn result_at(&self, index: usize) -> Option<ModuleResult> {
        self.lock().results.get(index).cloned()
    }

    pub fn result_count(&self) -> usize {
        self.lock().results.len()
    }

    /// Everything the module wrote to stdout that was not progress markup.
    pub fn output_data(&self) -> Vec<u8> {
        self.lock().output.clone()
    }

    /// Everything the module wrote to stderr.
    pub fn error_data(&self) -> Vec<u8> {
        self.lock().error_output.clone()
    }

    /// Output appended since the previous call.
    pub fn read_pending_output(&self) -> Vec<u8> {
        let mut state = self.lock();
        let pending = state.output[state.output_read..].to_vec();
        state.output_read = state.output.len();
        pending
    }

    /// Error output appended since the previous call.
    pub fn read_pending_error(&self) -> Vec<u8> {
        let mut state = self.lock();
        let pending = state.error_output[state.error_read..].to_vec();
        state.error_read = state.error_output.len();
        pending
    }

    // ----- outcome fields -----

    pub fn error(&self) -> Option<ModuleError> {
        self.lock().error.clone()
    }

    pub fn exit_code(&self) -> i32 {
        self.lock().error.as_ref().map_or(0, ModuleError::exit_code)
    }

    pub fn exit_status(&self) -> ExitStatus {
        self.lock()
            .error
            .as_ref()
            .map_or(ExitStatus::Normal, ModuleError::exit_status)
    }

    pub fn error_kind(&self) -> ProcessErrorKind {
        self.lock()
            .error
            .as_ref()
            .map_or(ProcessErrorKind::None, ModuleError::kind)
    }

    pub fn error_string(&self) -> String {
        self.lock()
            .error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    pub fn protocol_errors(&self) -> Vec<ProtocolError> {
        self.lock().protocol_errors.clone()
    }

    // ----- reporting side -----

    /// Mark the task as accepted for execution.
    pub fn report_started(&self) {
        let mut state = self.lock();
        if state.started || state.finished {
            return;
        }
        state.started = true;
        self.emit(FutureEvent::Started);
    }

    /// Atomically enter the running phase.
    ///
    /// Returns `false` when the task was canceled (or finished) first, in
    /// which case the caller must not create any process.
    pub fn try_begin_running(&self) -> bool {
        let mut state = self.lock();
        if state.canceled || state.finished {
            return false;
        }
        state.started = true;
        state.running = true;
        true
    }

    pub fn set_progress_range(&self, minimum: i32, maximum: i32) {
        let mut state = self.lock();
        if state.finished {
            return;
        }
        let maximum = maximum.max(minimum);
        if state.progress.minimum == minimum && state.progress.maximum == maximum {
            return;
        }
        state.progress.minimum = minimum;
        state.progress.maximum = maximum;
        self.emit(FutureEvent::ProgressRangeChanged { minimum, maximum });

        let clamped = state.clamp(state.progress.value);
        if clamped != state.progress.value {
            state.progress.value = clamped;
            self.emit(FutureEvent::ProgressValueChanged(clamped));
        }
    }

    /// Advance the progress value.
    ///
    /// Values are clamped into the range; a value not greater than the
    /// current one is ignored, so progress never moves backwards.
    pub fn set_progress_value(&self, value: i32) {
        let mut state = self.lock();
        self.advance_value(&mut state, value);
    }

    pub fn set_progress_text(&self, text: &str) {
        let mut state = self.lock();
        self.replace_text(&mut state, text);
    }

    pub fn set_progress_value_and_text(&self, value: i32, text: &str) {
        let mut state = self.lock();
        self.advance_value(&mut state, value);
        self.replace_text(&mut state, text);
    }

    fn advance_value(&self, state: &mut FutureState, value: i32) -> bool {
        if state.finished {
            return false;
        }
        let value = state.clamp(value);
        if value <= state.progress.value {
            return false;
        }
        state.progress.value = value;
        self.emit(FutureEvent::ProgressValueChanged(value));
        true
    }

    fn replace_text(&self, state: &mut FutureState, text: &str) {
        if state.finished || state.progress.text == text {
            return;
        }
        state.progress.text = text.to_string();
        self.emit(FutureEvent::ProgressTextChanged(text.to_string()));
    }

    /// Append a result. Results are kept in arrival order and never
    /// deduplicated.
    pub fn report_result(&self, parameter: &str, value: &str) {
        let mut state = self.lock();
        if state.finished {
            return;
        }
        state.results.push(ModuleResult {
            parameter: parameter.to_string(),
            value: value.to_string(),
        });
        let index = state.results.len() - 1;
        self.emit(FutureEvent::ResultReady(index));
    }

    pub fn report_output_bytes(&self, bytes: &[u8]) {
        let mut state = self.lock();
        if state.finished || bytes.is_empty() {
            return;
        }
        state.output.extend_from_slice(bytes);
        self.emit(FutureEvent::OutputReady);
    }

    pub fn report_error_bytes(&self, bytes: &[u8]) {
        let mut state = self.lock();
        if state.finished || bytes.is_empty() {
            return;
        }
        state.error_output.extend_from_slice(bytes);
        self.emit(FutureEvent::ErrorReady);
    }

    pub fn report_protocol_error(&self, error: ProtocolError) {
        let mut state = self.lock();
        if state.finished {
            return;
        }
        state.protocol_errors.push(error);
        self.emit(FutureEvent::ProtocolError);
    }

    /// Record the run exception. Does not finish the future.
    pub fn report_exception(&self, error: ModuleError) {
        let mut state = self.lock();
        if state.finished {
            return;
        }
        state.error = Some(error);
    }

    /// Transition to Finished. Returns whether this call did the transition.
    pub fn report_finished(&self) -> bool {
        {
            let mut state = self.lock();
            if state.finished {
                return false;
            }
            state.finished = true;
            state.running = false;
            state.paused = false;
            self.emit(FutureEvent::Finished);
        }
        self.wake_finished();
        true
    }
}
