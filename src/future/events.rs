// src/future/events.rs

/// Notification emitted by a [`ModuleFuture`](super::ModuleFuture) whenever
/// its observable state changes.
///
/// Delivered over a `tokio::sync::broadcast` channel; a receiver that falls
/// behind loses the oldest events but never slows the worker down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FutureEvent {
    Started,
    ProgressRangeChanged { minimum: i32, maximum: i32 },
    ProgressValueChanged(i32),
    ProgressTextChanged(String),
    /// A new result was appended at this index.
    ResultReady(usize),
    OutputReady,
    ErrorReady,
    ProtocolError,
    Paused,
    Resumed,
    Canceled,
    Finished,
}
