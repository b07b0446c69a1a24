// src/progress/mod.rs

//! Decoder for the progress protocol that modules interleave with ordinary
//! text on stdout.
//!
//! ```text
//! <filter-start><filter-name>N</filter-name><filter-comment>C</filter-comment></filter-start>
//! <filter-progress>0.25</filter-progress>
//! <filter-progress-text progress="0.5">C</filter-progress-text>
//! <filter-result name="P">V</filter-result>
//! <filter-end><filter-name>N</filter-name><filter-comment>C</filter-comment></filter-end>
//! ```
//!
//! - [`tokenizer`] turns the raw byte stream into tags and text, waiting for
//!   more input instead of failing on a half-received tag.
//! - [`parser`] tracks element nesting and turns tokens into
//!   [`ProgressEvent`]s and free-form output.

pub mod event;
pub mod parser;
pub mod tokenizer;

pub use event::{ParserEvent, ProgressEvent};
pub use parser::ProgressParser;
