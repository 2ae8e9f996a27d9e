//! Agent descriptions
//!
//! A description binds a grammar to a data source:
//!
//! ```text
//! Description(source, comments, read_only, syntax[, header])
//! ```
//!
//! - `source`: `File(name)`, `Run(command)` or `Local(name)`
//! - `comments`: characters that start a comment line, or `Fillup(chars)`
//!   to hand comment lines to the grammar instead of skipping them
//! - `read_only`: boolean; anything else counts as read-only
//! - `syntax`: root grammar
//! - `header`: grammar rendered in front of every root write
//!
//! # Example
//!
//! ```rust
//! use anyagent::engine::description::Description;
//!
//! let d = Description::parse(
//!     "`Description(`File(\"/etc/numbers\"), \"#\", true, `List(`Number(), \"\\n\"))",
//! )
//! .unwrap();
//! assert!(d.read_only);
//! assert_eq!(d.comments, "#");
//! ```

use super::error::DescriptionError;
use super::grammar::Grammar;
use super::grammar_analysis::{GrammarAnalyzer, GrammarWarning};
use super::notation;
use super::source::Source;
use super::value::Value;
use std::hash::Hasher;

/// Term name of a description
pub const DESCRIPTION_TERM: &str = "Description";

/// A decoded `Description(...)` declaration
#[derive(Debug, Clone, PartialEq)]
pub struct Description {
    /// Where the lines come from
    pub source: Source,
    /// Comment characters
    pub comments: String,
    /// Whether comment lines reach the grammar
    pub fillup: bool,
    /// Whether writes are refused
    pub read_only: bool,
    /// Root grammar
    pub syntax: Grammar,
    /// Root grammar as declared
    pub syntax_value: Value,
    /// Optional header grammar for writes
    pub header: Option<Grammar>,
}

impl Description {
    /// Build a description from parts
    ///
    /// A program source is always read-only.
    pub fn new(
        source: Source,
        comments: impl Into<String>,
        read_only: bool,
        syntax: Value,
    ) -> Result<Self, DescriptionError> {
        let grammar = Grammar::from_value(&syntax)?;
        let mut description = Self {
            source,
            comments: comments.into(),
            fillup: false,
            read_only,
            syntax: grammar,
            syntax_value: syntax,
            header: None,
        };
        description.settle()?;
        Ok(description)
    }

    /// Enable or disable fillup mode
    pub fn with_fillup(mut self, fillup: bool) -> Self {
        self.fillup = fillup;
        self
    }

    /// Set the header grammar
    pub fn with_header(mut self, header: &Value) -> Result<Self, DescriptionError> {
        self.header = Some(Grammar::from_value(header)?);
        Ok(self)
    }

    /// Decode a `Description(...)` term
    pub fn from_value(value: &Value) -> Result<Self, DescriptionError> {
        let term = match value {
            Value::Term(t) if t.name == DESCRIPTION_TERM => t,
            other => {
                return Err(DescriptionError::NotADescription {
                    found: other.to_string(),
                })
            }
        };
        if term.arity() < 4 || term.arity() > 5 {
            log_error!("Description needs 4 or 5 arguments, got {}", term.arity());
            return Err(DescriptionError::Arity { found: term.arity() });
        }
        let args = &term.args;

        let source = Source::from_value(&args[0])?;

        let (comments, fillup) = match &args[1] {
            Value::String(chars) => (chars.clone(), false),
            Value::Term(t) if t.name == "Fillup" && t.arity() == 1 => match &t.args[0] {
                Value::String(chars) => (chars.clone(), true),
                other => {
                    return Err(DescriptionError::BadComment {
                        found: other.to_string(),
                    })
                }
            },
            other => {
                return Err(DescriptionError::BadComment {
                    found: other.to_string(),
                })
            }
        };

        let read_only = match &args[2] {
            Value::Bool(b) => *b,
            other => {
                log_warn!("read-only flag is not boolean ({}), assuming read-only", other);
                true
            }
        };

        let syntax = Grammar::from_value(&args[3])?;
        let header = match args.get(4) {
            Some(h) => Some(Grammar::from_value(h)?),
            None => None,
        };

        let mut description = Self {
            source,
            comments,
            fillup,
            read_only,
            syntax,
            syntax_value: args[3].clone(),
            header,
        };
        description.settle()?;
        Ok(description)
    }

    /// Read a description from notation text
    pub fn parse(text: &str) -> Result<Self, DescriptionError> {
        let value = notation::parse(text)?;
        Self::from_value(&value)
    }

    /// Read a description from the JSON form of its value
    pub fn from_json(json: &str) -> Result<Self, DescriptionError> {
        let value = Value::from_json(json).map_err(|e| DescriptionError::Json(e.to_string()))?;
        Self::from_value(&value)
    }

    fn settle(&mut self) -> Result<(), DescriptionError> {
        if self.source.is_program() && !self.read_only {
            log_warn!("{} can only be read, switching to read-only", self.source);
            self.read_only = true;
        }
        if !self.read_only && self.syntax.any(&|g| matches!(g, Grammar::Name(_))) {
            log_error!("'Name' not allowed for writable agents");
            return Err(DescriptionError::NameInWritable);
        }
        Ok(())
    }

    /// Back to a `Description(...)` term
    pub fn to_value(&self) -> Value {
        let comments = if self.fillup {
            Value::term("Fillup", vec![Value::string(self.comments.clone())])
        } else {
            Value::string(self.comments.clone())
        };
        let mut args = vec![
            self.source.to_value(),
            comments,
            Value::Bool(self.read_only),
            self.syntax_value.clone(),
        ];
        if let Some(header) = &self.header {
            args.push(header.to_value());
        }
        Value::term(DESCRIPTION_TERM, args)
    }

    /// Lint warnings for the root and header grammars
    pub fn warnings(&self) -> Vec<GrammarWarning> {
        let mut warnings = GrammarAnalyzer::new(&self.syntax, self.fillup).analyze();
        if let Some(header) = &self.header {
            warnings.extend(GrammarAnalyzer::new(header, self.fillup).analyze());
        }
        warnings
    }

    /// Stable hash of the whole declaration
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = ahash::AHasher::default();
        hasher.write(self.to_value().to_string().as_bytes());
        hasher.finish()
    }
}
