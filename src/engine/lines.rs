//! Line cache and cursor
//!
//! The parser never sees a file as one string: it walks an ordered sequence
//! of raw lines. [`LineCache`] owns those lines together with the comment
//! set and fillup flag, and [`Cursor`] is the position the interpreter
//! threads through every call.
//!
//! Fetch rules:
//! - lines whose first character is a comment character are skipped, except
//!   in fillup mode, where they reach the grammar verbatim
//! - empty lines are always skipped
//! - if nothing at all can be delivered, the first fetch yields an empty
//!   sentinel ([`Cursor::End`]) so a grammar may match an empty file
//! - every later fetch past the end yields [`Cursor::Exhausted`], which is
//!   sticky
//!
//! # Example
//!
//! ```rust
//! use anyagent::engine::lines::{Cursor, LineCache};
//!
//! let cache = LineCache::new(vec!["# c\n".into(), "42\n".into()], "#", false);
//! let cursor = cache.next_line(Cursor::Start);
//! assert_eq!(cache.rest(cursor), "42\n");
//! assert!(cache.next_line(cursor).is_exhausted());
//! ```

use super::char_class::CharSet;

/// Position in a [`LineCache`]
///
/// `Copy`, so backtracking is saving and restoring a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    /// Nothing fetched yet
    #[default]
    Start,
    /// Byte `offset` into line `line`
    At {
        /// Index into the line sequence
        line: usize,
        /// Byte offset into that line
        offset: usize,
    },
    /// Empty sentinel delivered by the first fetch of a source with no
    /// deliverable line
    End,
    /// No more input
    Exhausted,
}

impl Cursor {
    /// Whether the input is used up for good
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Cursor::Exhausted)
    }

    /// Cursor moved `bytes` forward on the same line
    #[inline]
    pub fn advance(self, bytes: usize) -> Cursor {
        match self {
            Cursor::At { line, offset } => Cursor::At {
                line,
                offset: offset + bytes,
            },
            other => other,
        }
    }

    /// 1-based number of the current line, if any
    pub fn line_number(&self) -> Option<usize> {
        match self {
            Cursor::At { line, .. } => Some(line + 1),
            _ => None,
        }
    }
}

/// Split raw text into lines
///
/// With `keep_terminators` every line keeps its `\n`; otherwise `\n` and a
/// preceding `\r` are dropped. A final line without terminator is kept.
pub fn split_lines(text: &str, keep_terminators: bool) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    for end in memchr::memchr_iter(b'\n', bytes) {
        let line = if keep_terminators {
            &text[start..=end]
        } else {
            let l = &text[start..end];
            l.strip_suffix('\r').unwrap_or(l)
        };
        lines.push(line.to_string());
        start = end + 1;
    }
    if start < text.len() {
        lines.push(text[start..].to_string());
    }
    lines
}

/// Ordered raw lines plus the rules for walking them
#[derive(Debug, Clone, PartialEq)]
pub struct LineCache {
    lines: Vec<String>,
    comments: CharSet,
    fillup: bool,
}

impl Default for LineCache {
    fn default() -> Self {
        Self::new(Vec::new(), "", false)
    }
}

impl LineCache {
    /// Create a cache over `lines`
    pub fn new(lines: Vec<String>, comments: &str, fillup: bool) -> Self {
        Self {
            lines,
            comments: CharSet::new(comments),
            fillup,
        }
    }

    /// Create a cache by splitting `text`
    pub fn from_text(text: &str, comments: &str, fillup: bool, keep_terminators: bool) -> Self {
        Self::new(split_lines(text, keep_terminators), comments, fillup)
    }

    /// A cache over other lines with the same comment and fillup rules
    pub fn with_lines(&self, lines: Vec<String>) -> Self {
        Self {
            lines,
            comments: self.comments.clone(),
            fillup: self.fillup,
        }
    }

    /// All raw lines, comments included
    #[inline]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of raw lines
    #[inline]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether there are no lines at all
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether fillup mode is on
    #[inline]
    pub fn is_fillup(&self) -> bool {
        self.fillup
    }

    /// Whether `text` starts with a comment character
    pub fn is_comment(&self, text: &str) -> bool {
        text.chars().next().is_some_and(|c| self.comments.contains(c))
    }

    fn deliverable(&self, line: &str) -> bool {
        !line.is_empty() && (self.fillup || !self.is_comment(line))
    }

    /// Fetch the next line after `cursor`
    pub fn next_line(&self, cursor: Cursor) -> Cursor {
        let from = match cursor {
            Cursor::Start => 0,
            Cursor::At { line, .. } => line + 1,
            Cursor::End | Cursor::Exhausted => return Cursor::Exhausted,
        };
        let found = self
            .lines
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, l)| self.deliverable(l));
        match found {
            Some((line, _)) => {
                log_debug!("line {}: {:?}", line + 1, self.lines[line]);
                Cursor::At { line, offset: 0 }
            }
            None if cursor == Cursor::Start => Cursor::End,
            None => {
                log_debug!("end of data after {} lines", self.lines.len());
                Cursor::Exhausted
            }
        }
    }

    /// Unconsumed text of the current line
    pub fn rest(&self, cursor: Cursor) -> &str {
        match cursor {
            Cursor::At { line, offset } => self
                .lines
                .get(line)
                .and_then(|l| l.get(offset..))
                .unwrap_or(""),
            _ => "",
        }
    }

    /// Whether the current line is used up, so the next element must fetch
    #[inline]
    pub fn at_end_of_text(&self, cursor: Cursor) -> bool {
        self.rest(cursor).is_empty()
    }

    /// Text consumed between `from` and `to`, across line boundaries
    ///
    /// Only lines the cursor could have visited contribute, so skipped
    /// comment lines never show up in the span.
    pub fn span(&self, from: Cursor, to: Cursor) -> String {
        let (first, first_offset) = match from {
            Cursor::At { line, offset } => (line, offset),
            _ => return String::new(),
        };
        let (last, last_offset) = match to {
            Cursor::At { line, offset } => (line, Some(offset)),
            Cursor::End | Cursor::Exhausted => (self.lines.len().saturating_sub(1), None),
            Cursor::Start => return String::new(),
        };
        if last < first {
            return String::new();
        }
        if first == last {
            let line = &self.lines[first];
            let end = last_offset.unwrap_or(line.len());
            return line.get(first_offset..end).unwrap_or("").to_string();
        }

        let mut out = String::new();
        out.push_str(self.lines[first].get(first_offset..).unwrap_or(""));
        for line in &self.lines[first + 1..last] {
            if self.deliverable(line) {
                out.push_str(line);
            }
        }
        let tail = &self.lines[last];
        if self.deliverable(tail) {
            let end = last_offset.unwrap_or(tail.len());
            out.push_str(tail.get(..end).unwrap_or(""));
        }
        out
    }

    /// Collect consecutive comment lines starting at `cursor`
    ///
    /// Returns the text and the cursor on the first line that is not a
    /// comment. Only meaningful in fillup mode, where comments are
    /// delivered.
    pub fn comment_run(&self, mut cursor: Cursor) -> (String, Cursor) {
        let mut text = String::new();
        loop {
            let rest = self.rest(cursor);
            if !self.is_comment(rest) {
                return (text, cursor);
            }
            text.push_str(rest);
            cursor = self.next_line(cursor);
        }
    }

    /// Replace all lines
    pub fn set_lines(&mut self, lines: Vec<String>) {
        self.lines = lines;
    }

    /// Replace line `index`, or append when `index` equals the line count
    ///
    /// Returns `false` when `index` is past the end.
    pub fn set_line(&mut self, index: usize, text: String) -> bool {
        match index.cmp(&self.lines.len()) {
            std::cmp::Ordering::Less => {
                self.lines[index] = text;
                true
            }
            std::cmp::Ordering::Equal => {
                self.lines.push(text);
                true
            }
            std::cmp::Ordering::Greater => false,
        }
    }

    /// All lines joined back into one text
    pub fn text(&self) -> String {
        self.lines.concat()
    }
}
