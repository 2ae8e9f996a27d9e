//! Source Location Utilities
//!
//! Turns a byte offset into notation text into a line/column pair for
//! error messages.

use std::fmt;

/// A position in notation text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    /// Byte offset from start of input
    pub offset: usize,
    /// Line number (1-based)
    pub line: usize,
    /// Column in characters (1-based)
    pub column: usize,
}

impl SourcePosition {
    /// Position of the first character
    #[inline]
    pub fn start() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Position of byte `offset` in `input`, clamped to the input length
    ///
    /// An offset inside a multi-byte character counts as that character.
    pub fn from_offset(input: &str, offset: usize) -> Self {
        let mut offset = offset.min(input.len());
        while !input.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = &input.as_bytes()[..offset];
        let line = 1 + memchr::memchr_iter(b'\n', before).count();
        let line_start = memchr::memrchr(b'\n', before).map_or(0, |nl| nl + 1);
        let column = 1 + input[line_start..offset].chars().count();
        Self {
            offset,
            line,
            column,
        }
    }
}

impl Default for SourcePosition {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
