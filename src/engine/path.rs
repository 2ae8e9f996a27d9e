//! Structural paths
//!
//! A path addresses a piece of the parsed tree: `.` is the root, `.a.0.b`
//! descends by map key or list index. Paths whose first component is `_`
//! address the raw lines instead (`._` all lines, `._.3` line 3).
//! Components containing dots or blanks can be quoted: `."a b".c`.

use std::fmt;
use std::str::FromStr;

/// Component name that selects the raw lines
pub const RAW_COMPONENT: &str = "_";

/// Path into the parsed tree or the raw lines
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct AgentPath {
    components: Vec<String>,
}

/// Malformed path text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathError {
    /// The text as given
    pub path: String,
    /// What is wrong
    pub reason: &'static str,
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid path '{}': {}", self.path, self.reason)
    }
}

impl std::error::Error for PathError {}

impl AgentPath {
    /// The root path `.`
    pub fn root() -> Self {
        Self::default()
    }

    /// Path from components
    pub fn new<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            components: components.into_iter().map(Into::into).collect(),
        }
    }

    /// Path with one more component
    pub fn child(&self, component: impl Into<String>) -> Self {
        let mut components = self.components.clone();
        components.push(component.into());
        Self { components }
    }

    /// The components, root first
    #[inline]
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Number of components
    #[inline]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether this is `.`
    #[inline]
    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }

    /// Whether this is `.` (alias of [`is_root`](Self::is_root))
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.is_root()
    }

    /// Whether the path addresses raw lines
    #[inline]
    pub fn is_raw(&self) -> bool {
        self.components.first().is_some_and(|c| c == RAW_COMPONENT)
    }
}

/// Numeric value of a component that starts with a digit
///
/// Like C `atoi`: leading digits count, anything after them is ignored.
/// Returns `None` when the component does not start with a digit.
pub fn component_index(component: &str) -> Option<usize> {
    let digits = component.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    Some(component[..digits].parse().unwrap_or(usize::MAX))
}

impl FromStr for AgentPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = |reason| PathError {
            path: s.to_string(),
            reason,
        };
        let text = s.trim();
        if text.is_empty() || text == "." {
            return Ok(Self::root());
        }
        if !text.starts_with('.') {
            return Err(error("must start with '.'"));
        }

        let mut components = Vec::new();
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '.' {
                return Err(error("expected '.'"));
            }
            let mut component = String::new();
            if chars.peek() == Some(&'"') {
                chars.next();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some(c) => component.push(c),
                        None => return Err(error("unterminated quote")),
                    }
                }
            } else {
                while let Some(&c) = chars.peek() {
                    if c == '.' {
                        break;
                    }
                    component.push(c);
                    chars.next();
                }
                if component.is_empty() {
                    return Err(error("empty component"));
                }
            }
            components.push(component);
        }
        Ok(Self { components })
    }
}

impl fmt::Display for AgentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return write!(f, ".");
        }
        for c in &self.components {
            let plain = !c.is_empty()
                && c
                    .chars()
                    .all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '-');
            if plain {
                write!(f, ".{}", c)?;
            } else {
                write!(f, ".\"{}\"", c)?;
            }
        }
        Ok(())
    }
}
