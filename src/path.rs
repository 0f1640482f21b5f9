//! JSON-Pointer-style addresses.
//!
//! An address begins with `/` and names a parameter by a sequence of
//! segments: word-character names (with `~0`/`~1` escapes for literal `~`
//! and `/`), decimal indices, and the reserved append marker `-`. Pointers
//! are transient per request and never persisted.

use crate::error::Error;
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

/// One parsed segment of a pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Unescaped field or parameter name.
    Name(String),
    /// Decimal array index.
    Index(usize),
    /// The `-` append marker, reserved for array contexts.
    Append,
}

impl Segment {
    /// Human label used in failure messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Segment::Name(_) => "a name",
            Segment::Index(_) => "an index",
            Segment::Append => "the append marker",
        }
    }

    /// The name, if this segment is one.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Segment::Name(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Name(name) => f.write_str(&escape(name)),
            Segment::Index(index) => write!(f, "{}", index),
            Segment::Append => f.write_str("-"),
        }
    }
}

/// Ordered sequence of segments, consumed front to back during navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pointer {
    segments: VecDeque<Segment>,
}

impl Pointer {
    /// Parse an address string.
    ///
    /// The empty string parses to an empty pointer. Any other text must
    /// begin with `/`; each segment must be the append marker, a run of
    /// word characters, or contain only word characters and `~0`/`~1`
    /// escapes. Digit-only segments classify as indices.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let mut segments = VecDeque::new();
        if text.is_empty() {
            return Ok(Pointer { segments });
        }
        if !text.starts_with('/') {
            return Err(Error::Parse(format!("{:?} must begin with '/'", text)));
        }
        for raw in text[1..].split('/') {
            segments.push_back(classify(raw, text)?);
        }
        Ok(Pointer { segments })
    }

    /// Remove and return the first segment.
    pub fn pop_front(&mut self) -> Result<Segment, Error> {
        self.segments
            .pop_front()
            .ok_or_else(|| Error::Range("attempt to pop an exhausted pointer".to_string()))
    }

    /// Remaining segment count.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Peek at the first segment without consuming it.
    pub fn front(&self) -> Option<&Segment> {
        self.segments.front()
    }
}

impl FromStr for Pointer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pointer::parse(s)
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

fn classify(raw: &str, whole: &str) -> Result<Segment, Error> {
    if raw == "-" {
        return Ok(Segment::Append);
    }
    if raw.is_empty() {
        return Err(Error::Parse(format!("{:?} contains an empty segment", whole)));
    }
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'~' => match bytes.get(i + 1).copied() {
                Some(b'0') | Some(b'1') => i += 2,
                _ => {
                    return Err(Error::Parse(format!(
                        "{:?} contains a bad escape in segment {:?}",
                        whole, raw
                    )))
                }
            },
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' => i += 1,
            _ => {
                return Err(Error::Parse(format!(
                    "{:?} contains an invalid character in segment {:?}",
                    whole, raw
                )))
            }
        }
    }
    if bytes.iter().all(u8::is_ascii_digit) {
        let index = raw
            .parse::<usize>()
            .map_err(|_| Error::Parse(format!("index segment {:?} is out of range", raw)))?;
        return Ok(Segment::Index(index));
    }
    Ok(Segment::Name(unescape(raw)))
}

/// Escape a literal name for use in a pointer: `~` becomes `~0`, `/`
/// becomes `~1`. `~` is handled first so a literal `/` never turns into a
/// corrupted `~0`-prefixed sequence.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '~' => out.push_str("~0"),
            '/' => out.push_str("~1"),
            c => out.push(c),
        }
    }
    out
}

/// Reverse [`escape`]: `~0` becomes `~`, `~1` becomes `/`. A single
/// left-to-right scan, so `~01` decodes to `~1` and never to `/`.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            Some(other) => {
                out.push('~');
                out.push(other);
            }
            None => out.push('~'),
        }
    }
    out
}
