//! Value model
//!
//! [`Value`] is the single data type flowing through the engine. Parsed file
//! contents are values, and so are grammars: a grammar is a tree of
//! [`Term`]s whose names are combinator keywords (`Tuple`, `List`, ...).
//!
//! # Example
//!
//! ```rust
//! use anyagent::engine::value::Value;
//!
//! let v = Value::map(vec![("name", Value::string("host1"))]);
//! assert_eq!(v.get("name").and_then(|n| n.as_str().ok()), Some("host1"));
//! assert!(v.as_list().is_err());
//! ```

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A tagged value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    /// No value
    #[default]
    Void,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// Double precision float
    Float(f64),
    /// String value
    String(String),
    /// Ordered sequence of values
    List(Vec<Value>),
    /// Key/value map, iteration order is unspecified
    Map(HashMap<String, Value>),
    /// Named node with positional arguments
    Term(Term),
}

/// A named node with an ordered argument list
///
/// Used both for data and for grammar nodes, e.g. `Tuple(Name(...), ...)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    /// Term name (combinator keyword for grammar nodes)
    pub name: String,
    /// Positional arguments
    pub args: Vec<Value>,
}

impl Term {
    /// Create a term
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Number of arguments
    #[inline]
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// Argument at `idx`
    #[inline]
    pub fn arg(&self, idx: usize) -> Option<&Value> {
        self.args.get(idx)
    }
}

/// Discriminant of a [`Value`], used in conversion errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `Value::Void`
    Void,
    /// `Value::Bool`
    Bool,
    /// `Value::Int`
    Int,
    /// `Value::Float`
    Float,
    /// `Value::String`
    String,
    /// `Value::List`
    List,
    /// `Value::Map`
    Map,
    /// `Value::Term`
    Term,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Void => "void",
            Self::Bool => "boolean",
            Self::Int => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::List => "list",
            Self::Map => "map",
            Self::Term => "term",
        };
        f.write_str(s)
    }
}

/// A checked conversion was attempted on the wrong kind of value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMismatch {
    /// Kind the caller asked for
    pub expected: ValueKind,
    /// Kind the value actually has
    pub found: ValueKind,
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type mismatch: expected {}, found {}", self.expected, self.found)
    }
}

impl std::error::Error for TypeMismatch {}

impl Value {
    /// Create a boolean value
    pub fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    /// Create an integer value
    pub fn int(n: i64) -> Self {
        Value::Int(n)
    }

    /// Create a float value
    pub fn float(f: f64) -> Self {
        Value::Float(f)
    }

    /// Create a string value
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Create a list value
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(items)
    }

    /// Create a map value from key/value pairs
    pub fn map(pairs: Vec<(impl Into<String>, Value)>) -> Self {
        let mut map = HashMap::with_capacity(pairs.len());
        for (k, v) in pairs {
            map.insert(k.into(), v);
        }
        Value::Map(map)
    }

    /// Create a term value
    pub fn term(name: impl Into<String>, args: Vec<Value>) -> Self {
        Value::Term(Term::new(name, args))
    }

    /// Discriminant of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Void => ValueKind::Void,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
            Value::Term(_) => ValueKind::Term,
        }
    }

    #[inline]
    fn mismatch(&self, expected: ValueKind) -> TypeMismatch {
        TypeMismatch {
            expected,
            found: self.kind(),
        }
    }

    /// Check for `Void`
    #[inline]
    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    /// Check for a string
    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Check for a term
    #[inline]
    pub fn is_term(&self) -> bool {
        matches!(self, Value::Term(_))
    }

    /// Get as boolean
    pub fn as_bool(&self) -> Result<bool, TypeMismatch> {
        match self {
            Value::Bool(b) => Ok(*b),
            _ => Err(self.mismatch(ValueKind::Bool)),
        }
    }

    /// Get as integer
    pub fn as_int(&self) -> Result<i64, TypeMismatch> {
        match self {
            Value::Int(n) => Ok(*n),
            _ => Err(self.mismatch(ValueKind::Int)),
        }
    }

    /// Get as float
    pub fn as_float(&self) -> Result<f64, TypeMismatch> {
        match self {
            Value::Float(f) => Ok(*f),
            _ => Err(self.mismatch(ValueKind::Float)),
        }
    }

    /// Get as string slice
    pub fn as_str(&self) -> Result<&str, TypeMismatch> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(self.mismatch(ValueKind::String)),
        }
    }

    /// Get as list
    pub fn as_list(&self) -> Result<&[Value], TypeMismatch> {
        match self {
            Value::List(items) => Ok(items),
            _ => Err(self.mismatch(ValueKind::List)),
        }
    }

    /// Get as map
    pub fn as_map(&self) -> Result<&HashMap<String, Value>, TypeMismatch> {
        match self {
            Value::Map(m) => Ok(m),
            _ => Err(self.mismatch(ValueKind::Map)),
        }
    }

    /// Get as term
    pub fn as_term(&self) -> Result<&Term, TypeMismatch> {
        match self {
            Value::Term(t) => Ok(t),
            _ => Err(self.mismatch(ValueKind::Term)),
        }
    }

    /// Map lookup, `None` for missing keys and non-maps
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(m) => m.get(key),
            _ => None,
        }
    }

    /// List lookup, `None` when out of range or not a list
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match self {
            Value::List(items) => items.get(index),
            _ => None,
        }
    }

    /// Text used when a value becomes a map key or a line of output:
    /// strings as-is, everything else in term notation.
    pub fn to_text(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Serialize to JSON
    #[inline]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON
    #[inline]
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Term> for Value {
    fn from(t: Term) -> Self {
        Value::Term(t)
    }
}

/// Write `s` as a double-quoted notation string
pub(crate) fn write_quoted(f: &mut impl fmt::Write, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

fn write_args(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, v) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", v)?;
    }
    Ok(())
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}(", self.name)?;
        write_args(f, &self.args)?;
        f.write_str(")")
    }
}

/// Term notation, readable by [`crate::engine::notation::parse`]
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(fl) => {
                let s = fl.to_string();
                if s.contains(['.', 'e', 'E', 'N', 'i']) {
                    f.write_str(&s)
                } else {
                    write!(f, "{}.0", s)
                }
            }
            Value::String(s) => write_quoted(f, s),
            Value::List(items) => {
                f.write_str("[")?;
                write_args(f, items)?;
                f.write_str("]")
            }
            Value::Map(map) => {
                // sorted for stable output
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                f.write_str("$[")?;
                for (i, k) in keys.into_iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_quoted(f, k)?;
                    write!(f, ":{}", map[k])?;
                }
                f.write_str("]")
            }
            Value::Term(t) => write!(f, "{}", t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_conversions() {
        assert_eq!(Value::int(42).as_int(), Ok(42));
        assert_eq!(Value::bool(true).as_bool(), Ok(true));
        assert_eq!(Value::string("x").as_str(), Ok("x"));

        let err = Value::string("x").as_int().unwrap_err();
        assert_eq!(err.expected, ValueKind::Int);
        assert_eq!(err.found, ValueKind::String);
    }

    #[test]
    fn test_map_and_list_lookup() {
        let v = Value::map(vec![("a", Value::int(1))]);
        assert_eq!(v.get("a"), Some(&Value::int(1)));
        assert_eq!(v.get("b"), None);
        assert_eq!(v.get_index(0), None);

        let l = Value::list(vec![Value::int(7)]);
        assert_eq!(l.get_index(0), Some(&Value::int(7)));
        assert_eq!(l.get_index(1), None);
    }

    #[test]
    fn test_display_notation() {
        let t = Value::term(
            "Tuple",
            vec![
                Value::term("Whitespace", vec![]),
                Value::string("a\"b\n"),
                Value::list(vec![Value::int(1), Value::Void]),
            ],
        );
        assert_eq!(
            t.to_string(),
            "`Tuple(`Whitespace(), \"a\\\"b\\n\", [1, nil])"
        );
    }

    #[test]
    fn test_display_float_keeps_point() {
        assert_eq!(Value::float(2.0).to_string(), "2.0");
        assert_eq!(Value::float(0.25).to_string(), "0.25");
    }

    #[test]
    fn test_display_map_sorted() {
        let v = Value::map(vec![("b", Value::int(2)), ("a", Value::int(1))]);
        assert_eq!(v.to_string(), "$[\"a\":1, \"b\":2]");
    }

    #[test]
    fn test_to_text() {
        assert_eq!(Value::string("abc").to_text(), "abc");
        assert_eq!(Value::int(5).to_text(), "5");
    }

    #[test]
    fn test_json_round_trip() {
        let v = Value::term("List", vec![Value::term("Number", vec![]), Value::string(",")]);
        let json = v.to_json().unwrap();
        assert_eq!(Value::from_json(&json).unwrap(), v);
    }
}
