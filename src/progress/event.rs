// src/progress/event.rs

use crate::errors::ProtocolError;

/// One decoded element of the progress protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// `<filter-start>`: a filter begins.
    Start { name: String, comment: String },
    /// `<filter-progress>` or `<filter-progress-text>`. `fraction` is in
    /// `[0, 1]`.
    Progress { fraction: f64, comment: String },
    /// `<filter-result name="...">`.
    Result { parameter: String, value: String },
    /// `<filter-end>`: a filter is done.
    End { name: String, comment: String },
    /// Malformed markup. Reported at most once per parser.
    Error(ProtocolError),
}

/// Everything a single `feed` call can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum ParserEvent {
    Progress(ProgressEvent),
    /// Free-form text that was not part of the protocol.
    Output(Vec<u8>),
}
