//! Character sets for `String`, `Separator`, `Whitespace` and comment detection
//!
//! A [`CharSet`] is built from the literal set string of a grammar node.
//! ASCII membership is an O(1) bitmap test; other characters fall back to a
//! short linear list. A set string starting with `^` denotes the complement
//! of the remaining characters (only meaningful for `String`).
//!
//! # Example
//!
//! ```rust
//! use anyagent::engine::char_class::CharSet;
//!
//! let blanks = CharSet::new(" \t");
//! assert!(blanks.contains(' '));
//! assert!(!blanks.contains('x'));
//!
//! let not_space = CharSet::with_complement("^ ");
//! assert!(not_space.contains('x'));
//! assert_eq!(not_space.span("host1 rest"), 5);
//! ```

use std::fmt;

/// A set of characters with optional complement
#[derive(Clone, PartialEq, Eq)]
pub struct CharSet {
    /// Characters as written (without a leading `^`)
    source: String,
    /// Bitmap of ASCII members
    ascii: u128,
    /// Non-ASCII members
    other: Vec<char>,
    /// Membership is inverted
    negated: bool,
}

impl CharSet {
    /// Set containing exactly the characters of `chars`
    pub fn new(chars: &str) -> Self {
        let mut ascii = 0u128;
        let mut other = Vec::new();
        for c in chars.chars() {
            if c.is_ascii() {
                ascii |= 1u128 << (c as u32);
            } else if !other.contains(&c) {
                other.push(c);
            }
        }
        Self {
            source: chars.to_string(),
            ascii,
            other,
            negated: false,
        }
    }

    /// Set from a `String` grammar argument: a leading `^` complements it
    pub fn with_complement(pattern: &str) -> Self {
        match pattern.strip_prefix('^') {
            Some(rest) => {
                let mut set = Self::new(rest);
                set.negated = true;
                set
            }
            None => Self::new(pattern),
        }
    }

    /// The `" \t"` set used by `Whitespace()`
    pub fn blanks() -> Self {
        Self::new(" \t")
    }

    /// Membership test
    #[inline]
    pub fn contains(&self, c: char) -> bool {
        let raw = if c.is_ascii() {
            self.ascii & (1u128 << (c as u32)) != 0
        } else {
            self.other.contains(&c)
        };
        raw != self.negated
    }

    /// Whether the set string (after `^`) is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Whether the set was given with a leading `^`
    #[inline]
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Characters as written, without the `^`
    #[inline]
    pub fn chars(&self) -> &str {
        &self.source
    }

    /// First character as written, the representative used when unparsing
    /// a separator
    #[inline]
    pub fn first(&self) -> Option<char> {
        self.source.chars().next()
    }

    /// Byte length of the longest prefix of `text` made of members
    pub fn span(&self, text: &str) -> usize {
        text.char_indices()
            .find(|&(_, c)| !self.contains(c))
            .map_or(text.len(), |(i, _)| i)
    }

    /// `text` with members removed from both ends
    pub fn trim<'t>(&self, text: &'t str) -> &'t str {
        text.trim_matches(|c| self.contains(c))
    }
}

impl fmt::Debug for CharSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CharSet({}{:?})",
            if self.negated { "^" } else { "" },
            self.source
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_membership() {
        let set = CharSet::new("abc,");
        assert!(set.contains('a'));
        assert!(set.contains(','));
        assert!(!set.contains('d'));
        assert!(!set.is_negated());
    }

    #[test]
    fn test_complement() {
        let set = CharSet::with_complement("^=\n");
        assert!(set.is_negated());
        assert!(set.contains('k'));
        assert!(!set.contains('='));
        assert_eq!(set.span("key=value"), 3);
    }

    #[test]
    fn test_lone_caret_matches_everything() {
        let set = CharSet::with_complement("^");
        assert!(set.is_empty());
        assert!(set.contains('x'));
        assert_eq!(set.span("anything"), 8);
    }

    #[test]
    fn test_non_ascii() {
        let set = CharSet::new("äö");
        assert!(set.contains('ö'));
        assert!(!set.contains('o'));
        assert_eq!(set.span("äöx"), 4);
    }

    #[test]
    fn test_trim() {
        let set = CharSet::new(" ");
        assert_eq!(set.trim("  xxx xxx "), "xxx xxx");
    }

    #[test]
    fn test_first_representative() {
        assert_eq!(CharSet::blanks().first(), Some(' '));
        assert_eq!(CharSet::new("").first(), None);
    }
}
