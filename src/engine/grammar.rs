//! Grammar types
//!
//! Grammars arrive as [`Value`] trees of terms (`Tuple(...)`, `List(...)`,
//! literal strings, ...). They are decoded once into the closed [`Grammar`]
//! enum so that the interpreter dispatches on variants, and so that unknown
//! keywords and bad arities are reported when the grammar is loaded rather
//! than in the middle of a parse.
//!
//! # Example
//!
//! ```rust
//! use anyagent::engine::{grammar::Grammar, notation};
//!
//! let value = notation::parse("`List(`Number(), `Separator(\",\"))").unwrap();
//! let grammar = Grammar::from_value(&value).unwrap();
//! assert_eq!(grammar.kind_name(), "List");
//!
//! let bad = notation::parse("`List(`Number())").unwrap();
//! assert!(Grammar::from_value(&bad).is_err());
//! ```

use super::char_class::CharSet;
use super::value::{Term, Value, ValueKind};
use std::fmt;
use std::hash::Hasher;

/// One alternative of a `Choice`: a pattern and an optional action
#[derive(Debug, Clone, PartialEq)]
pub struct Alternative {
    /// Grammar that must match for this alternative to be taken
    pub pattern: Grammar,
    /// Grammar parsed after a successful match, replacing the match as result
    pub action: Option<Grammar>,
}

/// A decoded grammar node
#[derive(Debug, Clone, PartialEq)]
pub enum Grammar {
    /// Verbatim text
    Literal(String),
    /// `Optional(G)`
    Optional(Box<Grammar>),
    /// `Continue(G)`: restarts the enclosing tuple after its last element
    Continue(Box<Grammar>),
    /// `Choice([match, action?], ...)`
    Choice(Vec<Alternative>),
    /// `Sequence(G1, ...)`: result is the consumed text
    Sequence(Vec<Grammar>),
    /// `List(G, Gsep)`
    List {
        /// Element grammar
        element: Box<Grammar>,
        /// Separator grammar
        separator: Box<Grammar>,
    },
    /// `Tuple(G1, ...)`: builds a map
    Tuple(Vec<Grammar>),
    /// `Var(G1, ...)`: side effects only
    Var(Vec<Grammar>),
    /// `Name(G)`: pending field name of the current tuple
    Name(Box<Grammar>),
    /// `Value(G)`: pending field value of the current tuple
    Value(Box<Grammar>),
    /// `Fillup()`: captures comment lines in fillup mode
    Fillup,
    /// `Skip()`
    Skip,
    /// `Match()`: value captured by the last `Choice`
    Match,
    /// `Separator(chars)`
    Separator(CharSet),
    /// `Whitespace()`
    Whitespace,
    /// `String(set[, strip])`
    String {
        /// Accepted characters (possibly complemented)
        set: CharSet,
        /// Characters trimmed from both ends of the match
        strip: Option<CharSet>,
    },
    /// `Or(G1, ...)`
    Or(Vec<Grammar>),
    /// `Number()`
    Number,
    /// `Hexval()`
    Hexval,
    /// `Boolean()`
    Boolean,
    /// `Float()`
    Float,
    /// `Ip4Number()`
    Ip4Number,
    /// `Hostname()`
    Hostname,
    /// `Username()`
    Username,
    /// `<lowercase-name>(G)`: named tuple field
    Field {
        /// Map key
        name: String,
        /// Field grammar
        inner: Box<Grammar>,
    },
}

/// A grammar value that cannot be decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// Term name is neither a keyword nor a lowercase field name
    UnknownTerm {
        /// The offending name
        name: String,
    },
    /// Wrong number of arguments
    Arity {
        /// Keyword
        name: String,
        /// What the keyword accepts
        expected: &'static str,
        /// What was given
        found: usize,
    },
    /// An argument has the wrong type
    ArgumentType {
        /// Keyword
        name: String,
        /// Argument position
        index: usize,
        /// Required kind
        expected: ValueKind,
        /// Actual kind
        found: ValueKind,
    },
    /// A `Choice` element is not a list of one or two grammars
    BadAlternative {
        /// Position inside the `Choice`
        index: usize,
        /// The element in notation
        element: String,
    },
    /// Neither a string nor a term
    BadNode {
        /// The node in notation
        node: String,
    },
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::UnknownTerm { name } => write!(f, "unknown grammar term '{}'", name),
            GrammarError::Arity {
                name,
                expected,
                found,
            } => write!(
                f,
                "'{}' takes {} argument(s), {} given",
                name, expected, found
            ),
            GrammarError::ArgumentType {
                name,
                index,
                expected,
                found,
            } => write!(
                f,
                "argument {} of '{}' must be {}, found {}",
                index, name, expected, found
            ),
            GrammarError::BadAlternative { index, element } => write!(
                f,
                "Choice element {} must be a list of 1 or 2 entries, found {}",
                index, element
            ),
            GrammarError::BadNode { node } => write!(f, "not a grammar node: {}", node),
        }
    }
}

impl std::error::Error for GrammarError {}

fn arity(t: &Term, expected: &'static str, ok: bool) -> Result<(), GrammarError> {
    if ok {
        Ok(())
    } else {
        Err(GrammarError::Arity {
            name: t.name.clone(),
            expected,
            found: t.arity(),
        })
    }
}

fn string_arg<'t>(t: &'t Term, index: usize) -> Result<&'t str, GrammarError> {
    match t.arg(index) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(GrammarError::ArgumentType {
            name: t.name.clone(),
            index,
            expected: ValueKind::String,
            found: other.kind(),
        }),
        None => Err(GrammarError::Arity {
            name: t.name.clone(),
            expected: "more",
            found: t.arity(),
        }),
    }
}

fn boxed(t: &Term) -> Result<Box<Grammar>, GrammarError> {
    arity(t, "1", t.arity() == 1)?;
    Ok(Box::new(Grammar::from_value(&t.args[0])?))
}

fn all(t: &Term) -> Result<Vec<Grammar>, GrammarError> {
    arity(t, "at least 1", t.arity() >= 1)?;
    t.args.iter().map(Grammar::from_value).collect()
}

fn alternatives(t: &Term) -> Result<Vec<Alternative>, GrammarError> {
    arity(t, "at least 1", t.arity() >= 1)?;
    t.args
        .iter()
        .enumerate()
        .map(|(index, element)| match element {
            Value::List(items) if (1..=2).contains(&items.len()) => Ok(Alternative {
                pattern: Grammar::from_value(&items[0])?,
                action: items.get(1).map(Grammar::from_value).transpose()?,
            }),
            other => Err(GrammarError::BadAlternative {
                index,
                element: other.to_string(),
            }),
        })
        .collect()
}

fn leaf(t: &Term, g: Grammar) -> Result<Grammar, GrammarError> {
    arity(t, "0", t.arity() == 0)?;
    Ok(g)
}

impl Grammar {
    /// Decode a grammar value
    pub fn from_value(value: &Value) -> Result<Self, GrammarError> {
        match value {
            Value::String(s) => Ok(Grammar::Literal(s.clone())),
            Value::Term(t) => Self::from_term(t),
            other => Err(GrammarError::BadNode {
                node: other.to_string(),
            }),
        }
    }

    fn from_term(t: &Term) -> Result<Self, GrammarError> {
        match t.name.as_str() {
            "Optional" => Ok(Grammar::Optional(boxed(t)?)),
            "Continue" => Ok(Grammar::Continue(boxed(t)?)),
            "Choice" => Ok(Grammar::Choice(alternatives(t)?)),
            "Sequence" => Ok(Grammar::Sequence(all(t)?)),
            "List" => {
                arity(t, "2", t.arity() == 2)?;
                Ok(Grammar::List {
                    element: Box::new(Self::from_value(&t.args[0])?),
                    separator: Box::new(Self::from_value(&t.args[1])?),
                })
            }
            "Tuple" => Ok(Grammar::Tuple(all(t)?)),
            "Var" => Ok(Grammar::Var(all(t)?)),
            "Name" => Ok(Grammar::Name(boxed(t)?)),
            "Value" => Ok(Grammar::Value(boxed(t)?)),
            "Fillup" => leaf(t, Grammar::Fillup),
            "Skip" => leaf(t, Grammar::Skip),
            "Match" => leaf(t, Grammar::Match),
            "Separator" => {
                arity(t, "1", t.arity() == 1)?;
                Ok(Grammar::Separator(CharSet::new(string_arg(t, 0)?)))
            }
            "Whitespace" => leaf(t, Grammar::Whitespace),
            "String" => {
                arity(t, "1 or 2", (1..=2).contains(&t.arity()))?;
                let set = CharSet::with_complement(string_arg(t, 0)?);
                let strip = if t.arity() == 2 {
                    Some(CharSet::new(string_arg(t, 1)?))
                } else {
                    None
                };
                Ok(Grammar::String { set, strip })
            }
            "Or" => Ok(Grammar::Or(all(t)?)),
            "Number" => leaf(t, Grammar::Number),
            "Hexval" => leaf(t, Grammar::Hexval),
            "Boolean" => leaf(t, Grammar::Boolean),
            "Float" => leaf(t, Grammar::Float),
            "Ip4Number" => leaf(t, Grammar::Ip4Number),
            "Hostname" => leaf(t, Grammar::Hostname),
            "Username" => leaf(t, Grammar::Username),
            name if name.starts_with(|c: char| c.is_ascii_lowercase()) && t.arity() == 1 => {
                Ok(Grammar::Field {
                    name: name.to_string(),
                    inner: Box::new(Self::from_value(&t.args[0])?),
                })
            }
            name => Err(GrammarError::UnknownTerm {
                name: name.to_string(),
            }),
        }
    }

    /// Decode a grammar from the JSON form of its value
    pub fn from_json(s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let value = Value::from_json(s)?;
        Ok(Self::from_value(&value)?)
    }

    /// Keyword of this node (`"Literal"` for verbatim text, the field name
    /// for fields)
    pub fn kind_name(&self) -> &str {
        match self {
            Grammar::Literal(_) => "Literal",
            Grammar::Optional(_) => "Optional",
            Grammar::Continue(_) => "Continue",
            Grammar::Choice(_) => "Choice",
            Grammar::Sequence(_) => "Sequence",
            Grammar::List { .. } => "List",
            Grammar::Tuple(_) => "Tuple",
            Grammar::Var(_) => "Var",
            Grammar::Name(_) => "Name",
            Grammar::Value(_) => "Value",
            Grammar::Fillup => "Fillup",
            Grammar::Skip => "Skip",
            Grammar::Match => "Match",
            Grammar::Separator(_) => "Separator",
            Grammar::Whitespace => "Whitespace",
            Grammar::String { .. } => "String",
            Grammar::Or(_) => "Or",
            Grammar::Number => "Number",
            Grammar::Hexval => "Hexval",
            Grammar::Boolean => "Boolean",
            Grammar::Float => "Float",
            Grammar::Ip4Number => "Ip4Number",
            Grammar::Hostname => "Hostname",
            Grammar::Username => "Username",
            Grammar::Field { name, .. } => name,
        }
    }

    /// Direct sub-grammars, in declaration order
    pub fn children(&self) -> Vec<&Grammar> {
        match self {
            Grammar::Optional(g)
            | Grammar::Continue(g)
            | Grammar::Name(g)
            | Grammar::Value(g)
            | Grammar::Field { inner: g, .. } => vec![g],
            Grammar::Sequence(gs) | Grammar::Tuple(gs) | Grammar::Var(gs) | Grammar::Or(gs) => {
                gs.iter().collect()
            }
            Grammar::List { element, separator } => vec![element, separator],
            Grammar::Choice(alts) => alts
                .iter()
                .flat_map(|a| std::iter::once(&a.pattern).chain(a.action.as_ref()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Whether this node or any descendant satisfies `pred`
    pub fn any(&self, pred: &dyn Fn(&Grammar) -> bool) -> bool {
        pred(self) || self.children().into_iter().any(|c| c.any(pred))
    }

    /// Encode back into the value form
    pub fn to_value(&self) -> Value {
        let term = |name: &str, args: Vec<Value>| Value::term(name, args);
        let many = |gs: &[Grammar]| gs.iter().map(Grammar::to_value).collect::<Vec<_>>();
        match self {
            Grammar::Literal(s) => Value::string(s.clone()),
            Grammar::Optional(g) => term("Optional", vec![g.to_value()]),
            Grammar::Continue(g) => term("Continue", vec![g.to_value()]),
            Grammar::Choice(alts) => term(
                "Choice",
                alts.iter()
                    .map(|a| {
                        let mut items = vec![a.pattern.to_value()];
                        if let Some(action) = &a.action {
                            items.push(action.to_value());
                        }
                        Value::list(items)
                    })
                    .collect(),
            ),
            Grammar::Sequence(gs) => term("Sequence", many(gs)),
            Grammar::List { element, separator } => {
                term("List", vec![element.to_value(), separator.to_value()])
            }
            Grammar::Tuple(gs) => term("Tuple", many(gs)),
            Grammar::Var(gs) => term("Var", many(gs)),
            Grammar::Name(g) => term("Name", vec![g.to_value()]),
            Grammar::Value(g) => term("Value", vec![g.to_value()]),
            Grammar::Separator(set) => term("Separator", vec![Value::string(set.chars())]),
            Grammar::String { set, strip } => {
                let mut pattern = String::new();
                if set.is_negated() {
                    pattern.push('^');
                }
                pattern.push_str(set.chars());
                let mut args = vec![Value::string(pattern)];
                if let Some(strip) = strip {
                    args.push(Value::string(strip.chars()));
                }
                term("String", args)
            }
            Grammar::Or(gs) => term("Or", many(gs)),
            Grammar::Field { name, inner } => term(name, vec![inner.to_value()]),
            leaf => term(leaf.kind_name(), Vec::new()),
        }
    }

    /// Stable hash of the grammar, used to detect re-declarations that
    /// change nothing
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = ahash::AHasher::default();
        hasher.write(self.to_value().to_string().as_bytes());
        hasher.finish()
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}
