// src/progress/parser.rs

//! Stateful progress protocol parser.
//!
//! The parser is fed every chunk read from a module's stdout, in order and
//! with arbitrary boundaries. It keeps a single tokenizer over the whole
//! stream, so a tag or entity split across two chunks is simply completed by
//! the second one.
//!
//! Rules:
//! - The five protocol elements are only recognised at the top level.
//! - A protocol element nested inside another one is a protocol error and
//!   is skipped together with its content.
//! - Any other markup, and all top-level text, is forwarded as output.
//!   Only whitespace sitting directly between two protocol elements is
//!   dropped; such a run is held across chunks until the next byte decides.
//! - The first protocol error is reported; later ones are swallowed. The
//!   parser never stops forwarding output.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::errors::ProtocolError;
use crate::progress::event::{ParserEvent, ProgressEvent};
use crate::progress::tokenizer::{EndTag, Position, StartTag, Token, TokenKind, Tokenizer};

const FILTER_NAME: &str = "filter-name";
const FILTER_COMMENT: &str = "filter-comment";

static MARKUP: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"<[^>]*>").ok());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
    Start,
    Progress,
    ProgressText,
    Result,
    End,
}

impl Element {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "filter-start" => Some(Element::Start),
            "filter-progress" => Some(Element::Progress),
            "filter-progress-text" => Some(Element::ProgressText),
            "filter-result" => Some(Element::Result),
            "filter-end" => Some(Element::End),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Element::Start => "filter-start",
            Element::Progress => "filter-progress",
            Element::ProgressText => "filter-progress-text",
            Element::Result => "filter-result",
            Element::End => "filter-end",
        }
    }

    fn has_fields(self) -> bool {
        matches!(self, Element::Start | Element::End)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Comment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Frame {
    Event(Element),
    Field(Field),
    Ignored(String),
}

impl Frame {
    fn name(&self) -> &str {
        match self {
            Frame::Event(element) => element.name(),
            Frame::Field(Field::Name) => FILTER_NAME,
            Frame::Field(Field::Comment) => FILTER_COMMENT,
            Frame::Ignored(name) => name,
        }
    }
}

/// Raw bytes collected for the currently open protocol element.
#[derive(Debug)]
struct OpenEvent {
    element: Element,
    name: Vec<u8>,
    comment: Vec<u8>,
    text: Vec<u8>,
    progress: Option<Vec<u8>>,
    parameter: Option<Vec<u8>>,
}

impl OpenEvent {
    fn new(element: Element, tag: &StartTag) -> Self {
        Self {
            element,
            name: Vec::new(),
            comment: Vec::new(),
            text: Vec::new(),
            progress: tag.attribute("progress").map(<[u8]>::to_vec),
            parameter: tag.attribute("name").map(<[u8]>::to_vec),
        }
    }
}

fn is_field_name(name: &str) -> bool {
    name == FILTER_NAME || name == FILTER_COMMENT
}

/// Incremental decoder for one module's stdout.
#[derive(Debug, Default)]
pub struct ProgressParser {
    tokenizer: Tokenizer,
    stack: Vec<Frame>,
    current: Option<OpenEvent>,
    error_reported: bool,
    /// Top-level text since the last protocol element.
    run: Vec<u8>,
    /// Set while nothing but the run has been seen since a protocol element.
    after_element: bool,
}

impl ProgressParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a protocol error has already been reported.
    pub fn error_reported(&self) -> bool {
        self.error_reported
    }

    /// Feed the next chunk of stdout.
    ///
    /// Returns the protocol events completed by this chunk, in stream order,
    /// followed by at most one [`ParserEvent::Output`] carrying the
    /// free-form text it contained.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ParserEvent> {
        self.tokenizer.push(chunk);

        let mut events = Vec::new();
        let mut output = Vec::new();
        while let Some(token) = self.tokenizer.next_token() {
            self.handle(token, &mut events, &mut output);
        }
        self.flush_run(&mut output, true);

        if !output.is_empty() {
            events.push(ParserEvent::Output(output));
        }
        events
    }

    /// Signal end of stream.
    ///
    /// Bytes held back at the top level (such as a trailing `<`) are
    /// released as output. An element still open is dropped.
    pub fn finish(&mut self) -> Vec<ParserEvent> {
        let rest = self.tokenizer.take_pending();
        if self.stack.is_empty() {
            self.run.extend_from_slice(&rest);
        } else {
            debug!(
                open = self.stack.len(),
                "progress stream ended inside an element; dropping it"
            );
            self.stack.clear();
            self.current = None;
        }

        let mut output = Vec::new();
        self.flush_run(&mut output, false);
        if output.is_empty() {
            Vec::new()
        } else {
            vec![ParserEvent::Output(output)]
        }
    }

    fn run_is_blank(&self) -> bool {
        self.run.iter().all(u8::is_ascii_whitespace)
    }

    /// Release the pending run as output. With `hold_blank`, a blank run
    /// that follows a protocol element stays pending: the next element may
    /// still turn it into a separator.
    fn flush_run(&mut self, output: &mut Vec<u8>, hold_blank: bool) {
        if self.run.is_empty() || (hold_blank && self.after_element && self.run_is_blank()) {
            return;
        }
        output.append(&mut self.run);
        self.after_element = false;
    }

    /// A protocol element starts at the top level: whitespace between it and
    /// the previous element is a separator, anything else is output.
    fn settle_run_before_element(&mut self, output: &mut Vec<u8>) {
        if self.after_element && self.run_is_blank() {
            self.run.clear();
        } else {
            output.append(&mut self.run);
        }
        self.after_element = true;
    }

    /// Protocol names that are errors when they show up out of place.
    fn is_misplaced_protocol_name(&self, name: &str) -> bool {
        if Element::from_name(name).is_some() {
            return true;
        }
        is_field_name(name)
            && self.stack.iter().any(|frame| match frame {
                Frame::Field(_) => true,
                Frame::Event(element) => element.has_fields(),
                Frame::Ignored(_) => false,
            })
    }

    fn handle(&mut self, token: Token, events: &mut Vec<ParserEvent>, output: &mut Vec<u8>) {
        let position = token.position;
        match token.kind {
            TokenKind::Text(bytes) => self.on_text(&bytes),
            TokenKind::Markup(raw) => {
                if self.stack.is_empty() {
                    self.run.extend_from_slice(&raw);
                }
            }
            TokenKind::Start(tag) => self.on_start(tag, position, events, output),
            TokenKind::End(tag) => self.on_end(tag, position, events),
            TokenKind::Malformed(bad) => {
                let protocol = bad
                    .name
                    .as_deref()
                    .is_some_and(|name| self.is_misplaced_protocol_name(name));
                if protocol {
                    self.report_error(position, &bad.reason, events);
                    self.reset();
                } else {
                    self.run.extend_from_slice(&bad.raw);
                }
            }
        }
    }

    fn on_text(&mut self, bytes: &[u8]) {
        let Some(top) = self.stack.last() else {
            self.run.extend_from_slice(bytes);
            return;
        };
        let Some(current) = self.current.as_mut() else {
            return;
        };
        match top {
            Frame::Event(Element::Progress) | Frame::Event(Element::Result) => {
                current.text.extend_from_slice(bytes)
            }
            Frame::Event(Element::ProgressText) => current.comment.extend_from_slice(bytes),
            Frame::Field(Field::Name) => current.name.extend_from_slice(bytes),
            Frame::Field(Field::Comment) => current.comment.extend_from_slice(bytes),
            Frame::Event(Element::Start | Element::End) | Frame::Ignored(_) => {}
        }
    }

    fn on_start(
        &mut self,
        tag: StartTag,
        position: Position,
        events: &mut Vec<ParserEvent>,
        output: &mut Vec<u8>,
    ) {
        let element = Element::from_name(&tag.name);

        let Some(top) = self.stack.last() else {
            match element {
                Some(element) => {
                    self.settle_run_before_element(output);
                    self.current = Some(OpenEvent::new(element, &tag));
                    self.stack.push(Frame::Event(element));
                    if tag.self_closing {
                        self.stack.pop();
                        self.close_event(position, events);
                    }
                }
                None => self.run.extend_from_slice(&tag.raw),
            }
            return;
        };

        let parent_has_fields = matches!(top, Frame::Event(parent) if parent.has_fields());

        if element.is_some() {
            let message = format!("element '{}' must be top-level", tag.name);
            self.report_error(position, &message, events);
            if !tag.self_closing {
                self.stack.push(Frame::Ignored(tag.name));
            }
            return;
        }

        let field = match tag.name.as_str() {
            FILTER_NAME => Some(Field::Name),
            FILTER_COMMENT => Some(Field::Comment),
            _ => None,
        };
        match field {
            Some(field) if parent_has_fields => {
                if !tag.self_closing {
                    self.stack.push(Frame::Field(field));
                }
            }
            _ => self.run.extend_from_slice(&tag.raw),
        }
    }

    fn on_end(&mut self, tag: EndTag, position: Position, events: &mut Vec<ParserEvent>) {
        let Some(top) = self.stack.last() else {
            if Element::from_name(&tag.name).is_some() {
                let message = format!("unexpected end of element '{}'", tag.name);
                self.report_error(position, &message, events);
            } else {
                self.run.extend_from_slice(&tag.raw);
            }
            return;
        };

        let open_name = top.name().to_string();
        if open_name == tag.name {
            if let Some(Frame::Event(_)) = self.stack.pop() {
                self.close_event(position, events);
            }
            return;
        }

        // A field end tag with no field open mirrors its start tag: output.
        let field_open = self.stack.iter().any(|frame| matches!(frame, Frame::Field(_)));
        if Element::from_name(&tag.name).is_some() || (is_field_name(&tag.name) && field_open) {
            let message = format!(
                "expected end of element '{}' but found '{}'",
                open_name, tag.name
            );
            self.report_error(position, &message, events);
            self.reset();
        } else {
            self.run.extend_from_slice(&tag.raw);
        }
    }

    fn close_event(&mut self, position: Position, events: &mut Vec<ParserEvent>) {
        let Some(open) = self.current.take() else {
            return;
        };
        match build_event(open) {
            Ok(event) => events.push(ParserEvent::Progress(event)),
            Err(message) => self.report_error(position, &message, events),
        }
    }

    fn report_error(&mut self, position: Position, detail: &str, events: &mut Vec<ParserEvent>) {
        if self.error_reported {
            debug!(
                line = position.line,
                column = position.column,
                detail,
                "suppressing further progress protocol error"
            );
            return;
        }
        self.error_reported = true;

        let error = ProtocolError {
            line: position.line,
            column: position.column,
            message: strip_markup(detail),
        };
        warn!(line = error.line, column = error.column, message = %error.message, "malformed progress markup");
        events.push(ParserEvent::Progress(ProgressEvent::Error(error)));
    }

    fn reset(&mut self) {
        self.stack.clear();
        self.current = None;
    }
}

fn build_event(open: OpenEvent) -> Result<ProgressEvent, String> {
    match open.element {
        Element::Start => Ok(ProgressEvent::Start {
            name: decode(&open.name)?.trim().to_string(),
            comment: decode(&open.comment)?.trim().to_string(),
        }),
        Element::End => Ok(ProgressEvent::End {
            name: decode(&open.name)?.trim().to_string(),
            comment: decode(&open.comment)?.trim().to_string(),
        }),
        Element::Progress => Ok(ProgressEvent::Progress {
            fraction: parse_fraction(&decode(&open.text)?)?,
            comment: String::new(),
        }),
        Element::ProgressText => {
            let Some(progress) = open.progress else {
                return Err("filter-progress-text requires a 'progress' attribute".to_string());
            };
            Ok(ProgressEvent::Progress {
                fraction: parse_fraction(&decode(&progress)?)?,
                comment: decode(&open.comment)?.trim().to_string(),
            })
        }
        Element::Result => {
            let Some(parameter) = open.parameter else {
                return Err("filter-result requires a 'name' attribute".to_string());
            };
            Ok(ProgressEvent::Result {
                parameter: decode(&parameter)?.trim().to_string(),
                value: decode(&open.text)?.trim().to_string(),
            })
        }
    }
}

fn parse_fraction(text: &str) -> Result<f64, String> {
    let text = text.trim();
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value.clamp(0.0, 1.0)),
        _ => Err(format!("invalid progress value '{text}'")),
    }
}

/// Decode character data: predefined entities and character references.
fn decode(bytes: &[u8]) -> Result<String, String> {
    let text = String::from_utf8_lossy(bytes);
    if !text.contains('&') {
        return Ok(text.into_owned());
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text.as_ref();
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let Some(semi) = after.find(';') else {
            return Err("unterminated entity reference".to_string());
        };
        let entity = &after[..semi];
        let decoded = match entity {
            "lt" => '<',
            "gt" => '>',
            "amp" => '&',
            "quot" => '"',
            "apos" => '\'',
            _ => decode_char_ref(entity).ok_or_else(|| format!("undefined entity '{entity}'"))?,
        };
        out.push(decoded);
        rest = &after[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn decode_char_ref(entity: &str) -> Option<char> {
    let digits = entity.strip_prefix('#')?;
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<u32>().ok()?,
    };
    char::from_u32(code)
}

/// Remove anything tag-shaped from a diagnostic.
fn strip_markup(message: &str) -> String {
    let stripped = match MARKUP.as_ref() {
        Some(re) => re.replace_all(message, "").into_owned(),
        None => message.to_string(),
    };
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
