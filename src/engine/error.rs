//! Error types
//!
//! A grammar element that does not match is not an error: the interpreter
//! returns `Ok(None)` for that and backtracks. The types here cover the
//! failures that end a call:
//! - [`ParseError`]: the interpreter had to stop (authoring defect,
//!   recursion limit)
//! - [`DescriptionError`]: a `Description(...)` declaration is malformed
//! - [`AgentError`]: what `read`/`write` report to their caller
//!
//! Grammar decoding errors live with the grammar
//! ([`GrammarError`](super::grammar::GrammarError)), notation syntax errors
//! with the reader ([`NotationError`](super::notation::NotationError)).

use super::grammar::GrammarError;
use super::notation::NotationError;
use std::fmt;
use std::io;

/// Interpreter abort
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Grammar-authoring problem only visible while running the grammar
    Defect {
        /// What is wrong
        reason: String,
    },

    /// Recursion depth limit exceeded
    RecursionLimitExceeded {
        /// Current recursion depth
        depth: usize,
        /// Maximum allowed depth
        max_depth: usize,
    },
}

impl ParseError {
    /// Create a `Defect`
    #[inline]
    pub fn defect(reason: impl Into<String>) -> Self {
        ParseError::Defect {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Defect { reason } => write!(f, "grammar defect: {}", reason),
            ParseError::RecursionLimitExceeded { depth, max_depth } => write!(
                f,
                "Recursion limit exceeded: depth {} exceeds limit of {}",
                depth, max_depth
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Malformed `Description(...)` declaration
#[derive(Debug, Clone, PartialEq)]
pub enum DescriptionError {
    /// Top-level value is not a `Description` term
    NotADescription {
        /// What was found, in notation
        found: String,
    },
    /// Needs 4 or 5 arguments
    Arity {
        /// Number given
        found: usize,
    },
    /// First argument is not `File(..)`, `Run(..)` or `Local(..)`
    BadSource {
        /// The argument, in notation
        found: String,
    },
    /// Second argument is neither a string nor `Fillup(string)`
    BadComment {
        /// The argument, in notation
        found: String,
    },
    /// `Name()` used in a grammar whose agent is writable
    NameInWritable,
    /// Root or header grammar does not decode
    Grammar(GrammarError),
    /// Description text is not valid notation
    Notation(NotationError),
    /// Description JSON is not a valid value
    Json(String),
}

impl fmt::Display for DescriptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptionError::NotADescription { found } => {
                write!(f, "expected Description(...), found {}", found)
            }
            DescriptionError::Arity { found } => {
                write!(f, "Description takes 4 or 5 arguments, {} given", found)
            }
            DescriptionError::BadSource { found } => write!(
                f,
                "source must be File(..), Run(..) or Local(..), found {}",
                found
            ),
            DescriptionError::BadComment { found } => write!(
                f,
                "comment must be a string or Fillup(string), found {}",
                found
            ),
            DescriptionError::NameInWritable => {
                write!(f, "'Name' not allowed for writable agents")
            }
            DescriptionError::Grammar(e) => write!(f, "{}", e),
            DescriptionError::Notation(e) => write!(f, "{}", e),
            DescriptionError::Json(e) => write!(f, "invalid description JSON: {}", e),
        }
    }
}

impl std::error::Error for DescriptionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DescriptionError::Grammar(e) => Some(e),
            DescriptionError::Notation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GrammarError> for DescriptionError {
    fn from(e: GrammarError) -> Self {
        DescriptionError::Grammar(e)
    }
}

impl From<NotationError> for DescriptionError {
    fn from(e: NotationError) -> Self {
        DescriptionError::Notation(e)
    }
}

/// Error returned by the agent façade
#[derive(Debug)]
pub enum AgentError {
    /// `read`/`write` before any `Description`
    NoDescription,
    /// Write to a read-only agent
    ReadOnly,
    /// Path cannot be applied
    BadPath {
        /// The path as given
        path: String,
        /// Why
        reason: String,
    },
    /// No sub-grammar corresponds to the write path
    NoSyntax {
        /// The path as given
        path: String,
    },
    /// The value does not conform to the grammar
    NonConforming {
        /// The path as given
        path: String,
    },
    /// The root grammar does not match the data
    ParseFailed {
        /// 1-based line where parsing stopped, if known
        line: Option<usize>,
    },
    /// Source exists but may not be accessed
    PermissionDenied {
        /// Resolved file name
        path: String,
    },
    /// Other I/O failure on a file
    Io {
        /// Resolved file name
        path: String,
        /// Underlying error
        source: io::Error,
    },
    /// Program could not be started
    Spawn {
        /// Command line
        command: String,
        /// Underlying error
        source: io::Error,
    },
    /// `arg(n)` in a source template cannot be resolved
    BadArgument {
        /// Requested argument index
        index: usize,
    },
    /// Interpreter abort
    Parse(ParseError),
    /// Grammar defect
    Grammar(GrammarError),
    /// Malformed description
    Description(DescriptionError),
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::NoDescription => write!(f, "no description loaded"),
            AgentError::ReadOnly => write!(f, "agent is read-only"),
            AgentError::BadPath { path, reason } => write!(f, "bad path {}: {}", path, reason),
            AgentError::NoSyntax { path } => write!(f, "no syntax for path {}", path),
            AgentError::NonConforming { path } => {
                write!(f, "value for {} does not conform to the grammar", path)
            }
            AgentError::ParseFailed { line: Some(line) } => {
                write!(f, "parse failed at line {}", line)
            }
            AgentError::ParseFailed { line: None } => write!(f, "parse failed"),
            AgentError::PermissionDenied { path } => write!(f, "permission denied: {}", path),
            AgentError::Io { path, source } => write!(f, "I/O error on {}: {}", path, source),
            AgentError::Spawn { command, source } => {
                write!(f, "can't run '{}': {}", command, source)
            }
            AgentError::BadArgument { index } => {
                write!(f, "missing or empty argument {} for source name", index)
            }
            AgentError::Parse(e) => write!(f, "{}", e),
            AgentError::Grammar(e) => write!(f, "{}", e),
            AgentError::Description(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for AgentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AgentError::Io { source, .. } | AgentError::Spawn { source, .. } => Some(source),
            AgentError::Parse(e) => Some(e),
            AgentError::Grammar(e) => Some(e),
            AgentError::Description(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for AgentError {
    fn from(e: ParseError) -> Self {
        AgentError::Parse(e)
    }
}

impl From<GrammarError> for AgentError {
    fn from(e: GrammarError) -> Self {
        AgentError::Grammar(e)
    }
}

impl From<DescriptionError> for AgentError {
    fn from(e: DescriptionError) -> Self {
        AgentError::Description(e)
    }
}
