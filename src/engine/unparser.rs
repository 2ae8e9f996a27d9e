//! Unparser
//!
//! The write direction of the interpreter: given a grammar node and a value,
//! produce the text that parses back to that value. `None` means the value
//! does not conform to the grammar; `Some("")` is a valid empty rendering
//! (an absent optional element, `Skip()`, ...). A failing required element
//! makes every enclosing structure fail, which the agent reports as a
//! non-conforming write.

use super::grammar::{Alternative, Grammar};
use super::leaf;
use super::parser::{Interpreter, ParseOutcome, FILLUP_KEY, VALUE_KEY};
use super::value::Value;

impl<'a> Interpreter<'a> {
    /// Render `value` with `grammar` as root
    pub fn unparse(&mut self, grammar: &Grammar, value: &Value) -> Option<String> {
        self.context.reset();
        self.unparse_data(grammar, value)
    }

    /// Render one grammar node
    pub fn unparse_data(&mut self, grammar: &Grammar, value: &Value) -> Option<String> {
        self.context.enter_recursive();
        let result = match self.context.check_recursion_limit(self.max_recursion_depth) {
            Ok(()) => self.render(grammar, value),
            Err(e) => {
                log_error!("unparse: {}", e);
                None
            }
        };
        self.context.exit_recursive();
        result
    }

    fn render(&mut self, grammar: &Grammar, value: &Value) -> Option<String> {
        log_debug!("unparse {} with {}", grammar.kind_name(), value);
        match grammar {
            Grammar::Literal(text) => Some(text.clone()),

            Grammar::Optional(inner) => Some(self.unparse_data(inner, value).unwrap_or_default()),

            Grammar::Continue(_) | Grammar::Skip | Grammar::Fillup => Some(String::new()),

            Grammar::Choice(alternatives) => self.unparse_choice(alternatives, value),

            Grammar::Sequence(items) => {
                if let Value::String(text) = value {
                    if self.reparses(grammar, text) {
                        return Some(text.clone());
                    }
                }
                let mut out = String::new();
                for item in items {
                    out.push_str(&self.unparse_data(item, value)?);
                }
                Some(out)
            }

            Grammar::List { element, separator } => {
                let Ok(items) = value.as_list() else {
                    log_error!("unparseList: value has wrong type: {}", value);
                    return None;
                };
                let mut out = String::new();
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(&self.unparse_data(separator, &Value::Void)?);
                    }
                    out.push_str(&self.unparse_data(element, item)?);
                }
                Some(out)
            }

            Grammar::Tuple(items) => {
                let Ok(map) = value.as_map() else {
                    log_error!("unparseTuple: value has wrong type: {}", value);
                    return None;
                };
                let mut out = String::new();
                if self.lines.is_fillup() {
                    if let Some(Value::String(fillup)) = map.get(FILLUP_KEY) {
                        out.push_str(fillup);
                    }
                }
                for item in items {
                    out.push_str(&self.unparse_data(item, value)?);
                }
                Some(out)
            }

            Grammar::Var(items) => {
                let mut out = String::new();
                for item in items {
                    match self.unparse_data(item, value) {
                        Some(text) => out.push_str(&text),
                        None => break,
                    }
                }
                Some(out)
            }

            Grammar::Name(_) => {
                log_error!("unparse Name ()");
                None
            }

            Grammar::Value(inner) => {
                let target = match value {
                    Value::Map(map) => map.get(VALUE_KEY).unwrap_or(value),
                    other => other,
                };
                self.unparse_data(inner, target)
            }

            Grammar::Field { name, inner } => {
                let Value::Map(map) = value else {
                    log_error!("request for element '{}' but value not map", name);
                    return None;
                };
                match map.get(name) {
                    Some(field) => self.unparse_data(inner, field),
                    None => {
                        log_debug!("no value for key '{}' in map", name);
                        None
                    }
                }
            }

            Grammar::Match => match &self.context.current_match {
                Some(matched) if matched.to_text() != value.to_text() => None,
                _ => Some(String::new()),
            },

            Grammar::Separator(set) => Some(leaf::unparse_separator(set)),
            Grammar::Whitespace => Some(leaf::unparse_separator(&self.blanks)),
            Grammar::String { set, strip } => leaf::unparse_string(value, set, strip.as_ref()),

            Grammar::Or(alternatives) => {
                let mut first = None;
                for alternative in alternatives {
                    match self.unparse_data(alternative, value) {
                        Some(text) if !text.is_empty() => return Some(text),
                        Some(text) if first.is_none() => first = Some(text),
                        _ => {}
                    }
                }
                first
            }

            Grammar::Number => leaf::unparse_number(value),
            Grammar::Hexval => leaf::unparse_hexval(value),
            Grammar::Boolean => leaf::unparse_boolean(value),
            Grammar::Float => leaf::unparse_float(value),
            Grammar::Ip4Number => leaf::unparse_ip4_number(value),
            Grammar::Hostname => leaf::unparse_hostname(value),
            Grammar::Username => leaf::unparse_username(value),
        }
    }

    fn unparse_choice(&mut self, alternatives: &[Alternative], value: &Value) -> Option<String> {
        for alternative in alternatives {
            let matched = match (&alternative.pattern, &alternative.action) {
                (Grammar::Literal(text), None) => {
                    if value.as_str() == Ok(text.as_str()) {
                        return Some(text.clone());
                    }
                    continue;
                }
                (pattern, None) => match self.unparse_data(pattern, value) {
                    Some(text) => return Some(text),
                    None => continue,
                },
                (Grammar::Literal(text), Some(_)) => Some(text.clone()),
                (pattern, Some(_)) => self.unparse_data(pattern, value),
            };
            let (Some(matched), Some(action)) = (matched, &alternative.action) else {
                continue;
            };

            let saved = self
                .context
                .current_match
                .replace(Value::string(matched.clone()));
            let rendered = self.unparse_data(action, value);
            self.context.current_match = saved;

            if let Some(rendered) = rendered {
                return Some(matched + &rendered);
            }
        }
        None
    }

    /// Whether `text` parses back completely with `grammar`
    fn reparses(&self, grammar: &Grammar, text: &str) -> bool {
        let lines = self.lines.with_lines(vec![text.to_string()]);
        let mut check = Interpreter::new(&lines, self.read_only)
            .with_max_recursion_depth(self.max_recursion_depth);
        match check.parse(grammar) {
            Ok(ParseOutcome {
                value: Some(Value::String(parsed)),
                cursor,
            }) => parsed == text && lines.at_end_of_text(cursor),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::grammar_dsl::*;
    use crate::engine::lines::LineCache;

    fn unparse(grammar: Value, value: Value) -> Option<String> {
        let g = Grammar::from_value(&grammar).unwrap();
        let lines = LineCache::new(Vec::new(), "#", false);
        Interpreter::new(&lines, false).unparse(&g, &value)
    }

    fn ints(ns: &[i64]) -> Value {
        Value::list(ns.iter().map(|&n| Value::int(n)).collect())
    }

    #[test]
    fn test_list_with_separator() {
        let g = list(number(), separator(","));
        assert_eq!(unparse(g.clone(), ints(&[1, 2, 3])), Some("1,2,3".into()));
        assert_eq!(unparse(g.clone(), ints(&[])), Some("".into()));
        assert_eq!(unparse(g, Value::string("1,2")), None);
    }

    #[test]
    fn test_tuple_fields() {
        let g = tuple(vec![
            field("name", string("^ ")),
            whitespace(),
            value(ip4_number()),
        ]);
        let v = Value::map(vec![
            ("name", Value::string("host1")),
            (VALUE_KEY, Value::int(3232235521)),
        ]);
        assert_eq!(unparse(g, v), Some("host1 192.168.0.1".into()));
    }

    #[test]
    fn test_missing_field_fails_unless_optional() {
        let g = tuple(vec![field("a", number()), optional(field("b", number()))]);
        assert_eq!(
            unparse(g.clone(), Value::map(vec![("a", Value::int(1))])),
            Some("1".into())
        );
        assert_eq!(unparse(g, Value::map(vec![("b", Value::int(1))])), None);
    }

    #[test]
    fn test_type_mismatch_fails() {
        assert_eq!(unparse(number(), Value::string("42")), None);
        assert_eq!(unparse(tuple(vec![lit("x")]), ints(&[1])), None);
    }

    #[test]
    fn test_or_prefers_non_empty() {
        let g = or(vec![optional(number()), boolean()]);
        assert_eq!(unparse(g, Value::bool(true)), Some("yes".into()));
    }

    #[test]
    fn test_choice_literal_and_match() {
        let g = choice(vec![alt(lit("on")), alt(lit("off"))]);
        assert_eq!(unparse(g.clone(), Value::string("off")), Some("off".into()));
        assert_eq!(unparse(g, Value::string("dim")), None);

        let g = choice(vec![
            alt_action(lit("on"), match_()),
            alt_action(lit("off"), match_()),
        ]);
        assert_eq!(unparse(g, Value::string("off")), Some("off".into()));
    }

    #[test]
    fn test_sequence_verbatim_when_it_reparses() {
        let g = seq(vec![number(), lit("."), number()]);
        assert_eq!(unparse(g.clone(), Value::string("10.5")), Some("10.5".into()));
        assert_eq!(unparse(g, Value::string("x.5")), None);
    }

    #[test]
    fn test_skip_and_name() {
        assert_eq!(unparse(skip(), Value::Void), Some(String::new()));
        assert_eq!(unparse(tuple(vec![name(number())]), Value::map(Vec::<(String, Value)>::new())), None);
    }

    #[test]
    fn test_string_strip() {
        let g = string_strip("^=", " ");
        assert_eq!(unparse(g.clone(), Value::string(" k ")), Some("k".into()));
        assert_eq!(unparse(g, Value::string(" k =v")), None);
    }

    #[test]
    fn test_partial_leaf_fails_tuple() {
        let g = tuple(vec![field("h", hostname()), lit(" "), field("n", number())]);
        let entry = |h: &str, n: i64| Value::map(vec![("h", Value::string(h)), ("n", Value::int(n))]);
        assert_eq!(unparse(g.clone(), entry("gw", 1)), Some("gw 1".into()));
        assert_eq!(unparse(g.clone(), entry("1abc", 1)), None);
        assert_eq!(unparse(g.clone(), entry("a b", 1)), None);
        assert_eq!(unparse(g, entry("gw", -7)), None);
    }
}
