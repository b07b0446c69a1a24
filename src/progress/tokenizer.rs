// src/progress/tokenizer.rs

//! Incremental markup tokenizer over a growing byte stream.
//!
//! The tokenizer owns one long-lived buffer. Chunks are appended with
//! [`Tokenizer::push`]; [`Tokenizer::next_token`] hands out complete tokens
//! from the cursor and returns `None` when the remaining bytes could still
//! turn into a tag once more data arrives. Running out of input is never an
//! error here.
//!
//! Text is handed out eagerly (a text token may be cut at the end of the
//! buffer and continued by the next one). Tags are only handed out whole,
//! and only when they close within [`MAX_MARKUP_LEN`] bytes of their `<`;
//! past that the `<` is plain text.

/// 1-based position of a token in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    pub name: String,
    pub attributes: Vec<(String, Vec<u8>)>,
    pub self_closing: bool,
    pub raw: Vec<u8>,
}

impl StartTag {
    pub fn attribute(&self, name: &str) -> Option<&[u8]> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_slice())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndTag {
    pub name: String,
    pub raw: Vec<u8>,
}

/// A `<...>` sequence that looks like a tag but is not well formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Malformed {
    pub name: Option<String>,
    pub raw: Vec<u8>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Text(Vec<u8>),
    Start(StartTag),
    End(EndTag),
    /// Comments, processing instructions, declarations.
    Markup(Vec<u8>),
    Malformed(Malformed),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

/// Result of scanning at the cursor without consuming.
enum Scan {
    Incomplete,
    Token(TokenKind, usize),
}

const COMPACT_THRESHOLD: usize = 8 * 1024;

/// How far past a `<` the scanner looks for the end of a tag or comment.
pub const MAX_MARKUP_LEN: usize = 4 * 1024;

#[derive(Debug)]
pub struct Tokenizer {
    buf: Vec<u8>,
    cursor: usize,
    line: u32,
    column: u32,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            cursor: 0,
            line: 1,
            column: 1,
        }
    }

    /// Append a chunk to the stream.
    pub fn push(&mut self, bytes: &[u8]) {
        if self.cursor >= COMPACT_THRESHOLD {
            self.buf.drain(..self.cursor);
            self.cursor = 0;
        }
        self.buf.extend_from_slice(bytes);
    }

    /// Position of the next unconsumed byte.
    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }

    /// Bytes pushed but not yet handed out as tokens.
    pub fn pending(&self) -> &[u8] {
        &self.buf[self.cursor..]
    }

    /// Consume and return everything still pending, regardless of shape.
    pub fn take_pending(&mut self) -> Vec<u8> {
        let rest = self.buf[self.cursor..].to_vec();
        self.advance(rest.len());
        rest
    }

    pub fn next_token(&mut self) -> Option<Token> {
        let position = self.position();
        match self.scan() {
            Scan::Incomplete => None,
            Scan::Token(kind, len) => {
                self.advance(len);
                Some(Token { kind, position })
            }
        }
    }

    fn advance(&mut self, len: usize) {
        for &b in &self.buf[self.cursor..self.cursor + len] {
            if b == b'\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.cursor += len;
    }

    fn scan(&self) -> Scan {
        let rest = &self.buf[self.cursor..];
        if rest.is_empty() {
            return Scan::Incomplete;
        }

        if rest[0] != b'<' {
            let end = rest.iter().position(|&b| b == b'<').unwrap_or(rest.len());
            return Scan::Token(TokenKind::Text(rest[..end].to_vec()), end);
        }

        // Only the window is visible to the tag scanners, so the outcome does
        // not depend on how much input happens to be buffered.
        let window = &rest[..rest.len().min(MAX_MARKUP_LEN)];
        match scan_tag(window) {
            Scan::Incomplete if window.len() == MAX_MARKUP_LEN => {
                Scan::Token(TokenKind::Text(vec![b'<']), 1)
            }
            scan => scan,
        }
    }
}

fn scan_tag(rest: &[u8]) -> Scan {
    let Some(&next) = rest.get(1) else {
        return Scan::Incomplete;
    };

    match next {
        b'/' => scan_end_tag(rest),
        b'!' | b'?' => scan_markup(rest),
        c if is_name_start(c) => scan_start_tag(rest),
        // A lone '<' in free text.
        _ => Scan::Token(TokenKind::Text(vec![b'<']), 1),
    }
}

fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b':'
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || b.is_ascii_digit() || b == b'-' || b == b'.'
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

/// Read a name starting at `start`. `None` if the buffer ends inside it.
fn read_name(rest: &[u8], start: usize) -> Option<(String, usize)> {
    let mut i = start;
    while i < rest.len() && is_name_char(rest[i]) {
        i += 1;
    }
    if i == rest.len() {
        return None;
    }
    Some((String::from_utf8_lossy(&rest[start..i]).into_owned(), i))
}

fn skip_space(rest: &[u8], mut i: usize) -> usize {
    while i < rest.len() && is_space(rest[i]) {
        i += 1;
    }
    i
}

/// Skip a broken tag: through the next `>` if it comes before any `<`,
/// otherwise up to (not including) the next `<`.
fn malformed(rest: &[u8], from: usize, name: Option<String>, reason: &str) -> Scan {
    for (offset, &b) in rest[from..].iter().enumerate() {
        let i = from + offset;
        if b == b'>' {
            return bad(rest, i + 1, name, reason);
        }
        if b == b'<' {
            return bad(rest, i, name, reason);
        }
    }
    Scan::Incomplete
}

fn bad(rest: &[u8], len: usize, name: Option<String>, reason: &str) -> Scan {
    Scan::Token(
        TokenKind::Malformed(Malformed {
            name,
            raw: rest[..len].to_vec(),
            reason: reason.to_string(),
        }),
        len,
    )
}

fn scan_end_tag(rest: &[u8]) -> Scan {
    let Some(&first) = rest.get(2) else {
        return Scan::Incomplete;
    };
    if !is_name_start(first) {
        return Scan::Token(TokenKind::Text(vec![b'<']), 1);
    }
    let Some((name, i)) = read_name(rest, 2) else {
        return Scan::Incomplete;
    };
    let i = skip_space(rest, i);
    match rest.get(i) {
        None => Scan::Incomplete,
        Some(b'>') => Scan::Token(
            TokenKind::End(EndTag {
                name,
                raw: rest[..=i].to_vec(),
            }),
            i + 1,
        ),
        Some(_) => malformed(rest, i, Some(name), "expected '>' to close end tag"),
    }
}

fn scan_markup(rest: &[u8]) -> Scan {
    let terminator: &[u8] = if rest.starts_with(b"<!--") {
        b"-->"
    } else if rest.starts_with(b"<![CDATA[") {
        b"]]>"
    } else if rest.len() < 9 && (b"<!--".starts_with(rest) || b"<![CDATA[".starts_with(rest)) {
        return Scan::Incomplete;
    } else if rest[1] == b'?' {
        b"?>"
    } else {
        b">"
    };
    match rest[2..]
        .windows(terminator.len())
        .position(|w| w == terminator)
    {
        Some(pos) => {
            let len = 2 + pos + terminator.len();
            Scan::Token(TokenKind::Markup(rest[..len].to_vec()), len)
        }
        None => Scan::Incomplete,
    }
}

fn scan_start_tag(rest: &[u8]) -> Scan {
    let Some((name, mut i)) = read_name(rest, 1) else {
        return Scan::Incomplete;
    };
    let mut attributes = Vec::new();

    loop {
        let after_name = i;
        i = skip_space(rest, i);
        let Some(&b) = rest.get(i) else {
            return Scan::Incomplete;
        };

        match b {
            b'>' => {
                return Scan::Token(
                    TokenKind::Start(StartTag {
                        name,
                        attributes,
                        self_closing: false,
                        raw: rest[..=i].to_vec(),
                    }),
                    i + 1,
                );
            }
            b'/' => match rest.get(i + 1) {
                None => return Scan::Incomplete,
                Some(b'>') => {
                    return Scan::Token(
                        TokenKind::Start(StartTag {
                            name,
                            attributes,
                            self_closing: true,
                            raw: rest[..i + 2].to_vec(),
                        }),
                        i + 2,
                    );
                }
                Some(_) => return malformed(rest, i, Some(name), "unexpected '/' in start tag"),
            },
            c if is_name_start(c) && i > after_name => {
                let Some((key, j)) = read_name(rest, i) else {
                    return Scan::Incomplete;
                };
                let j = skip_space(rest, j);
                match rest.get(j) {
                    None => return Scan::Incomplete,
                    Some(b'=') => {}
                    Some(_) => {
                        return malformed(
                            rest,
                            j,
                            Some(name),
                            &format!("expected '=' after attribute '{key}'"),
                        );
                    }
                }
                let j = skip_space(rest, j + 1);
                let quote = match rest.get(j) {
                    None => return Scan::Incomplete,
                    Some(&q @ (b'"' | b'\'')) => q,
                    Some(_) => {
                        return malformed(
                            rest,
                            j,
                            Some(name),
                            &format!("attribute '{key}' value must be quoted"),
                        );
                    }
                };
                let Some(len) = rest[j + 1..]
                    .iter()
                    .position(|&b| b == quote || b == b'<')
                else {
                    return Scan::Incomplete;
                };
                if rest[j + 1 + len] == b'<' {
                    return bad(
                        rest,
                        j + 1 + len,
                        Some(name),
                        &format!("attribute '{key}' value contains '<'"),
                    );
                }
                let value = rest[j + 1..j + 1 + len].to_vec();
                attributes.push((key, value));
                i = j + 1 + len + 1;
            }
            _ => return malformed(rest, i, Some(name), "unexpected character in start tag"),
        }
    }
}
