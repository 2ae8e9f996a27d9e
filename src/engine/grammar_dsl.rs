//! Grammar DSL
//!
//! Builder functions for writing grammars in Rust instead of term notation.
//! Each function returns the grammar as a [`Value`], the same form a
//! description file produces, so the result can be handed to
//! [`Grammar::from_value`](super::grammar::Grammar::from_value) or embedded in
//! a [`Description`](super::description::Description).
//!
//! # Example
//!
//! ```rust
//! use anyagent::engine::grammar_dsl::*;
//!
//! // host1 192.168.0.1
//! let hosts = list(
//!     tuple(vec![field("name", string("^ ")), whitespace(), value(ip4_number())]),
//!     lit("\n"),
//! );
//! assert_eq!(
//!     hosts.to_string(),
//!     "`List(`Tuple(`name(`String(\"^ \")), `Whitespace(), `Value(`Ip4Number())), \"\\n\")"
//! );
//! ```

use super::value::Value;

fn atom(name: &str) -> Value {
    Value::term(name, Vec::new())
}

fn wrap(name: &str, inner: Value) -> Value {
    Value::term(name, vec![inner])
}

/// Verbatim text
pub fn lit(text: &str) -> Value {
    Value::string(text)
}

/// `Optional(G)`
pub fn optional(inner: Value) -> Value {
    wrap("Optional", inner)
}

/// `Continue(G)`
pub fn cont(inner: Value) -> Value {
    wrap("Continue", inner)
}

/// `Choice(...)` from alternatives built with [`alt`] or [`alt_action`]
pub fn choice(alternatives: Vec<Value>) -> Value {
    Value::term("Choice", alternatives)
}

/// Choice alternative without an action
pub fn alt(pattern: Value) -> Value {
    Value::list(vec![pattern])
}

/// Choice alternative with an action
pub fn alt_action(pattern: Value, action: Value) -> Value {
    Value::list(vec![pattern, action])
}

/// `Sequence(...)`
pub fn seq(items: Vec<Value>) -> Value {
    Value::term("Sequence", items)
}

/// `List(G, Gsep)`
pub fn list(element: Value, separator: Value) -> Value {
    Value::term("List", vec![element, separator])
}

/// `Tuple(...)`
pub fn tuple(items: Vec<Value>) -> Value {
    Value::term("Tuple", items)
}

/// `Var(...)`
pub fn var(items: Vec<Value>) -> Value {
    Value::term("Var", items)
}

/// `Name(G)`
pub fn name(inner: Value) -> Value {
    wrap("Name", inner)
}

/// `Value(G)`
pub fn value(inner: Value) -> Value {
    wrap("Value", inner)
}

/// Field shorthand `key(G)`; `key` should start with a lowercase letter
pub fn field(key: &str, inner: Value) -> Value {
    wrap(key, inner)
}

/// `Or(...)`
pub fn or(alternatives: Vec<Value>) -> Value {
    Value::term("Or", alternatives)
}

/// `Separator(chars)`
pub fn separator(chars: &str) -> Value {
    wrap("Separator", Value::string(chars))
}

/// `String(set)`
pub fn string(set: &str) -> Value {
    wrap("String", Value::string(set))
}

/// `String(set, strip)`
pub fn string_strip(set: &str, strip: &str) -> Value {
    Value::term("String", vec![Value::string(set), Value::string(strip)])
}

/// `Whitespace()`
pub fn whitespace() -> Value {
    atom("Whitespace")
}

/// `Fillup()`
pub fn fillup() -> Value {
    atom("Fillup")
}

/// `Skip()`
pub fn skip() -> Value {
    atom("Skip")
}

/// `Match()`
pub fn match_() -> Value {
    atom("Match")
}

/// `Number()`
pub fn number() -> Value {
    atom("Number")
}

/// `Hexval()`
pub fn hexval() -> Value {
    atom("Hexval")
}

/// `Boolean()`
pub fn boolean() -> Value {
    atom("Boolean")
}

/// `Float()`
pub fn float() -> Value {
    atom("Float")
}

/// `Ip4Number()`
pub fn ip4_number() -> Value {
    atom("Ip4Number")
}

/// `Hostname()`
pub fn hostname() -> Value {
    atom("Hostname")
}

/// `Username()`
pub fn username() -> Value {
    atom("Username")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::grammar::Grammar;

    #[test]
    fn test_builders_decode() {
        let v = tuple(vec![
            field("key", string_strip("^=", " \t")),
            lit("="),
            field("val", or(vec![number(), boolean(), float()])),
            optional(cont(skip())),
        ]);
        assert!(Grammar::from_value(&v).is_ok());
    }

    #[test]
    fn test_choice_shape() {
        let v = choice(vec![alt_action(lit("on"), match_()), alt(lit("off"))]);
        let t = v.as_term().unwrap();
        assert_eq!(t.args[0].as_list().unwrap().len(), 2);
        assert_eq!(t.args[1].as_list().unwrap().len(), 1);
        assert!(Grammar::from_value(&v).is_ok());
    }

    #[test]
    fn test_atoms_have_no_arguments() {
        for v in [hexval(), hostname(), username(), fillup(), whitespace()] {
            assert_eq!(v.as_term().unwrap().arity(), 0);
        }
    }
}
