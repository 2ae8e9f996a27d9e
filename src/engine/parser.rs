//! Grammar interpreter
//!
//! A recursive-descent interpreter over a decoded [`Grammar`]. Every call to
//! [`Interpreter::parse_data`] gets the cursor, the grammar node and an
//! `optional` flag, and returns:
//! - `Ok(Some(value))` on a match (`Value::Void` for elements that match
//!   without producing anything)
//! - `Ok(None)` when the node does not match; this drives backtracking and
//!   is never logged above debug level
//! - `Err(_)` when the grammar cannot be run at all (authoring defect,
//!   recursion limit)
//!
//! Tuple building state (one name/value frame per open `Tuple`), the
//! continue flag and the last `Choice` match live in a [`ParseContext`]
//! owned by the interpreter, so concurrent parses never share state.
//!
//! # Example
//!
//! ```rust
//! use anyagent::engine::grammar::Grammar;
//! use anyagent::engine::grammar_dsl::*;
//! use anyagent::engine::lines::LineCache;
//! use anyagent::engine::parser::Interpreter;
//! use anyagent::engine::value::Value;
//!
//! let grammar = Grammar::from_value(&list(number(), separator(","))).unwrap();
//! let lines = LineCache::new(vec!["1,2,3".into()], "#", false);
//! let outcome = Interpreter::new(&lines, true).parse(&grammar).unwrap();
//! assert_eq!(
//!     outcome.value,
//!     Some(Value::list(vec![Value::int(1), Value::int(2), Value::int(3)]))
//! );
//! ```

use super::char_class::CharSet;
use super::config::DEFAULT_MAX_RECURSION_DEPTH;
use super::error::ParseError;
use super::grammar::{Alternative, Grammar};
use super::leaf;
use super::lines::{Cursor, LineCache};
use super::value::Value;
use hashbrown::HashMap;

/// Map key under which `Fillup()` stores collected comment lines
pub const FILLUP_KEY: &str = "`FILLUP";

/// Map key for a `Value()` that no `Name()` claimed by the end of its tuple
pub const VALUE_KEY: &str = "value";

/// Pending field of the innermost open `Tuple`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TupleFrame {
    /// Field name, empty while unset
    pub name: String,
    /// Field value, `None` while unset
    pub value: Option<Value>,
}

/// Per-call mutable interpreter state
#[derive(Debug, Clone, Default)]
pub struct ParseContext {
    /// One frame per open `Tuple`, innermost last
    pub frames: Vec<TupleFrame>,

    /// Set by `Continue`, consumed by the enclosing `Tuple`
    pub tuple_continue: bool,

    /// Value matched by the most recent `Choice` alternative
    pub current_match: Option<Value>,

    /// Current recursion depth (tracked during parsing)
    pub current_depth: usize,
}

impl ParseContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything from a previous parse
    pub fn reset(&mut self) {
        self.frames.clear();
        self.tuple_continue = false;
        self.current_match = None;
        self.current_depth = 0;
    }

    /// Enter a recursive call, incrementing depth counter
    #[inline]
    pub fn enter_recursive(&mut self) {
        self.current_depth += 1;
    }

    /// Exit a recursive call, decrementing depth counter
    #[inline]
    pub fn exit_recursive(&mut self) {
        self.current_depth = self.current_depth.saturating_sub(1);
    }

    /// Check if recursion depth exceeds limit
    #[inline]
    pub fn check_recursion_limit(&self, max_depth: usize) -> Result<(), ParseError> {
        if max_depth > 0 && self.current_depth > max_depth {
            return Err(ParseError::RecursionLimitExceeded {
                depth: self.current_depth,
                max_depth,
            });
        }
        Ok(())
    }

    /// Open a tuple frame
    #[inline]
    pub fn push_frame(&mut self) {
        self.frames.push(TupleFrame::default());
    }

    /// Close the innermost tuple frame
    #[inline]
    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Innermost tuple frame
    #[inline]
    pub fn top_frame_mut(&mut self) -> Option<&mut TupleFrame> {
        self.frames.last_mut()
    }

    /// Whether any `Tuple` is open
    #[inline]
    pub fn in_tuple(&self) -> bool {
        !self.frames.is_empty()
    }

    /// Take the top frame's field if both name and a non-void value are set
    fn take_field(&mut self) -> Option<(String, Value)> {
        let frame = self.frames.last_mut()?;
        let ready = !frame.name.is_empty() && frame.value.as_ref().is_some_and(|v| !v.is_void());
        if !ready {
            return None;
        }
        let value = frame.value.take()?;
        Some((std::mem::take(&mut frame.name), value))
    }

    /// Take a value still waiting for a name when its tuple closes
    fn take_unnamed_value(&mut self) -> Option<Value> {
        let frame = self.frames.last_mut()?;
        if !frame.name.is_empty() {
            return None;
        }
        frame.value.take().filter(|v| !v.is_void())
    }
}

/// Result of a top-level parse
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    /// Parsed value, `None` if the root grammar did not match
    pub value: Option<Value>,
    /// Where the interpreter stopped
    pub cursor: Cursor,
}

/// Grammar interpreter over one line cache
pub struct Interpreter<'a> {
    pub(crate) lines: &'a LineCache,
    pub(crate) read_only: bool,
    pub(crate) max_recursion_depth: usize,
    pub(crate) blanks: CharSet,
    /// Mutable state of the current call
    pub context: ParseContext,
}

impl<'a> Interpreter<'a> {
    /// Create an interpreter
    ///
    /// `read_only` mirrors the description's flag: `Name()` is only allowed
    /// for read-only agents, since a name captured from data cannot be
    /// written back.
    pub fn new(lines: &'a LineCache, read_only: bool) -> Self {
        Self {
            lines,
            read_only,
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            blanks: CharSet::blanks(),
            context: ParseContext::new(),
        }
    }

    /// Set the maximum recursion depth (0 = unlimited)
    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    /// Lines this interpreter reads
    #[inline]
    pub fn lines(&self) -> &LineCache {
        self.lines
    }

    /// Parse the whole line cache with `grammar` as root
    pub fn parse(&mut self, grammar: &Grammar) -> Result<ParseOutcome, ParseError> {
        self.context.reset();
        let mut cursor = Cursor::Start;
        let value = self.parse_data(&mut cursor, grammar, false)?;
        Ok(ParseOutcome { value, cursor })
    }

    /// Parse one grammar node at `cursor`
    pub fn parse_data(
        &mut self,
        cursor: &mut Cursor,
        grammar: &Grammar,
        optional: bool,
    ) -> Result<Option<Value>, ParseError> {
        self.context.enter_recursive();
        let result = match self.context.check_recursion_limit(self.max_recursion_depth) {
            Ok(()) => self.dispatch(cursor, grammar, optional),
            Err(e) => Err(e),
        };
        self.context.exit_recursive();
        result
    }

    fn dispatch(
        &mut self,
        cursor: &mut Cursor,
        grammar: &Grammar,
        optional: bool,
    ) -> Result<Option<Value>, ParseError> {
        if self.lines.at_end_of_text(*cursor) {
            *cursor = self.lines.next_line(*cursor);
        }
        if cursor.is_exhausted() {
            // only nodes that consume nothing can still succeed
            return Ok(match grammar {
                Grammar::Optional(_) | Grammar::Skip => Some(Value::Void),
                Grammar::Match => self.context.current_match.clone(),
                _ => None,
            });
        }

        log_debug!(
            "parse {}{} at {:?}",
            if optional { "?" } else { "!" },
            grammar.kind_name(),
            self.lines.rest(*cursor)
        );

        match grammar {
            Grammar::Literal(text) => Ok(self.verbose(cursor, text, optional)),

            Grammar::Optional(inner) => Ok(Some(
                self.parse_data(cursor, inner, true)?.unwrap_or(Value::Void),
            )),

            Grammar::Continue(inner) => {
                let v = self.parse_data(cursor, inner, false)?;
                if v.is_some() {
                    self.context.tuple_continue = true;
                }
                Ok(v)
            }

            Grammar::Choice(alternatives) => self.parse_choice(cursor, alternatives, optional),

            Grammar::Sequence(items) => {
                let start = *cursor;
                for item in items {
                    if self.parse_data(cursor, item, optional)?.is_none() {
                        return Ok(None);
                    }
                }
                Ok(Some(Value::String(self.lines.span(start, *cursor))))
            }

            Grammar::List { element, separator } => {
                self.parse_list(cursor, element, separator, optional)
            }

            Grammar::Tuple(items) => {
                self.context.push_frame();
                let result = self.parse_tuple(cursor, items, optional);
                self.context.pop_frame();
                result
            }

            Grammar::Var(items) => {
                for item in items {
                    if self.parse_data(cursor, item, optional)?.is_none() {
                        break;
                    }
                }
                Ok(Some(Value::Void))
            }

            Grammar::Name(inner) => {
                if !self.read_only {
                    log_error!("'Name' not allowed for writable agents");
                    return Err(ParseError::defect("'Name' not allowed for writable agents"));
                }
                let v = self.parse_data(cursor, inner, false)?;
                if let Some(v) = &v {
                    if let Some(frame) = self.context.top_frame_mut() {
                        frame.name = v.to_text();
                    }
                }
                Ok(v)
            }

            Grammar::Value(inner) => {
                let v = self.parse_data(cursor, inner, false)?;
                if let Some(v) = &v {
                    if let Some(frame) = self.context.top_frame_mut() {
                        frame.value = Some(v.clone());
                    }
                }
                Ok(v)
            }

            Grammar::Field { name, inner } => {
                if !self.context.in_tuple() {
                    log_error!("field '{}' outside of a Tuple", name);
                    return Err(ParseError::defect(format!(
                        "field '{}' outside of a Tuple",
                        name
                    )));
                }
                let v = self.parse_data(cursor, inner, optional)?;
                if let Some(frame) = self.context.top_frame_mut() {
                    frame.name = name.clone();
                    frame.value = v.clone();
                }
                Ok(v)
            }

            Grammar::Fillup => Ok(Some(self.parse_fillup(cursor))),

            Grammar::Skip => Ok(Some(Value::Void)),

            Grammar::Match => Ok(self.context.current_match.clone()),

            Grammar::Separator(set) => Ok(self.separator(cursor, set, optional)),

            Grammar::Whitespace => Ok(self.separator(cursor, &self.blanks, optional)),

            Grammar::String { set, strip } => {
                let rest = self.lines.rest(*cursor);
                match leaf::parse_string(rest, set, strip.as_ref()) {
                    Some((v, n)) => {
                        *cursor = cursor.advance(n);
                        Ok(Some(v))
                    }
                    None => Ok(optional.then(|| Value::string(""))),
                }
            }

            Grammar::Or(alternatives) => {
                for (i, alternative) in alternatives.iter().enumerate() {
                    let last = i + 1 == alternatives.len();
                    let mut attempt = *cursor;
                    if let Some(v) = self.parse_data(&mut attempt, alternative, last && optional)? {
                        *cursor = attempt;
                        return Ok(Some(v));
                    }
                }
                log_debug!("Or() failed");
                Ok(Some(Value::Void))
            }

            Grammar::Number => Ok(self.leaf(cursor, leaf::parse_number)),
            Grammar::Hexval => Ok(self.leaf(cursor, leaf::parse_hexval)),
            Grammar::Boolean => Ok(self.leaf(cursor, leaf::parse_boolean)),
            Grammar::Float => Ok(self.leaf(cursor, leaf::parse_float)),
            Grammar::Ip4Number => Ok(self.leaf(cursor, leaf::parse_ip4_number)),
            Grammar::Hostname => Ok(self.leaf(cursor, leaf::parse_hostname)),
            Grammar::Username => Ok(self.leaf(cursor, leaf::parse_username)),
        }
    }

    fn leaf(&self, cursor: &mut Cursor, parse: fn(&str) -> Option<(Value, usize)>) -> Option<Value> {
        let (value, consumed) = parse(self.lines.rest(*cursor))?;
        *cursor = cursor.advance(consumed);
        Some(value)
    }

    fn verbose(&self, cursor: &mut Cursor, text: &str, optional: bool) -> Option<Value> {
        match leaf::parse_verbose(self.lines.rest(*cursor), text) {
            Some(n) => {
                *cursor = cursor.advance(n);
                Some(Value::string(text))
            }
            None => optional.then_some(Value::Void),
        }
    }

    fn separator(&self, cursor: &mut Cursor, set: &CharSet, optional: bool) -> Option<Value> {
        let rest = self.lines.rest(*cursor);
        let n = leaf::parse_separator(rest, set);
        if n == 0 && !optional {
            return None;
        }
        let value = Value::string(&rest[..n]);
        *cursor = cursor.advance(n);
        Some(value)
    }

    fn parse_choice(
        &mut self,
        cursor: &mut Cursor,
        alternatives: &[Alternative],
        optional: bool,
    ) -> Result<Option<Value>, ParseError> {
        for (i, alternative) in alternatives.iter().enumerate() {
            let mut attempt = *cursor;
            self.context.current_match = self.parse_data(&mut attempt, &alternative.pattern, false)?;
            if self.context.current_match.is_some() {
                log_debug!("choice ({}) match", i);
                *cursor = attempt;
                return match &alternative.action {
                    Some(action) => self.parse_data(cursor, action, optional),
                    None => Ok(self.context.current_match.clone()),
                };
            }
        }
        Ok(None)
    }

    fn parse_list(
        &mut self,
        cursor: &mut Cursor,
        element: &Grammar,
        separator: &Grammar,
        mut optional: bool,
    ) -> Result<Option<Value>, ParseError> {
        let mut items = Vec::new();
        loop {
            let before = *cursor;
            let Some(v) = self.parse_data(cursor, element, optional)? else {
                break;
            };
            optional = false;
            if !v.is_void() {
                items.push(v);
            }
            if self.parse_data(cursor, separator, false)?.is_none() {
                break;
            }
            if *cursor == before {
                log_debug!("list made no progress, stopping");
                break;
            }
        }
        Ok(Some(Value::List(items)))
    }

    fn parse_tuple(
        &mut self,
        cursor: &mut Cursor,
        items: &[Grammar],
        mut optional: bool,
    ) -> Result<Option<Value>, ParseError> {
        let mut map = HashMap::new();
        self.context.tuple_continue = false;
        let mut round_start = *cursor;
        let mut i = 0;
        while i < items.len() {
            if self.parse_data(cursor, &items[i], optional)?.is_none() {
                if !optional {
                    return Ok(None);
                }
                break;
            }
            if let Some((name, value)) = self.context.take_field() {
                log_debug!("map add {}:{}", name, value);
                map.insert(name, value);
            }
            if self.context.tuple_continue && i + 1 == items.len() {
                self.context.tuple_continue = false;
                if *cursor == round_start {
                    break;
                }
                round_start = *cursor;
                i = 0;
                optional = true;
                continue;
            }
            i += 1;
        }
        if let Some(value) = self.context.take_unnamed_value() {
            map.entry(VALUE_KEY.to_string()).or_insert(value);
        }
        Ok(Some(Value::Map(map)))
    }

    fn parse_fillup(&mut self, cursor: &mut Cursor) -> Value {
        if !self.lines.is_fillup() || !self.context.in_tuple() {
            log_warn!("Fillup() ignored: needs fillup mode and an enclosing Tuple");
            return Value::Void;
        }
        let (text, next) = self.lines.comment_run(*cursor);
        *cursor = next;
        let value = Value::String(text);
        if let Some(frame) = self.context.top_frame_mut() {
            frame.name = FILLUP_KEY.to_string();
            frame.value = Some(value.clone());
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::grammar_dsl::*;

    fn cache(lines: &[&str]) -> LineCache {
        LineCache::new(lines.iter().map(|s| s.to_string()).collect(), "#", false)
    }

    fn run(grammar: Value, lines: &[&str]) -> Option<Value> {
        let g = Grammar::from_value(&grammar).unwrap();
        let lines = cache(lines);
        Interpreter::new(&lines, true).parse(&g).unwrap().value
    }

    #[test]
    fn test_hostname_line() {
        assert_eq!(
            run(hostname(), &["myhost.example.com"]),
            Some(Value::string("myhost.example.com"))
        );
    }

    #[test]
    fn test_tuple_with_field_and_value() {
        let g = tuple(vec![
            field("name", string("^ ")),
            whitespace(),
            value(ip4_number()),
        ]);
        let v = run(g, &["host1 192.168.0.1"]).unwrap();
        assert_eq!(
            v,
            Value::map(vec![
                ("name", Value::string("host1")),
                (VALUE_KEY, Value::int(3232235521)),
            ])
        );
    }

    #[test]
    fn test_name_value_pairs() {
        let g = list(
            tuple(vec![name(username()), lit("="), value(number())]),
            lit("\n"),
        );
        let v = run(g, &["a=1\n", "b=2\n"]).unwrap();
        assert_eq!(
            v,
            Value::list(vec![
                Value::map(vec![("a", Value::int(1))]),
                Value::map(vec![("b", Value::int(2))]),
            ])
        );
    }

    #[test]
    fn test_name_rejected_when_writable() {
        let g = Grammar::from_value(&tuple(vec![name(username())])).unwrap();
        let lines = cache(&["abc"]);
        let err = Interpreter::new(&lines, false).parse(&g).unwrap_err();
        assert!(matches!(err, ParseError::Defect { .. }));
    }

    #[test]
    fn test_field_outside_tuple_is_defect() {
        let g = Grammar::from_value(&field("x", number())).unwrap();
        let lines = cache(&["1"]);
        assert!(Interpreter::new(&lines, true).parse(&g).is_err());
    }

    #[test]
    fn test_choice_records_match() {
        let g = choice(vec![alt_action(lit("on"), skip()), alt_action(lit("off"), skip())]);
        assert_eq!(run(g, &["off"]), Some(Value::Void));

        let g = choice(vec![alt_action(lit("on"), match_()), alt_action(lit("off"), match_())]);
        assert_eq!(run(g, &["off"]), Some(Value::string("off")));
    }

    #[test]
    fn test_choice_first_match_wins() {
        let g = choice(vec![alt(lit("yes")), alt(lit("y"))]);
        assert_eq!(run(g, &["yes"]), Some(Value::string("yes")));
    }

    #[test]
    fn test_choice_fails_without_match() {
        let g = choice(vec![alt(lit("on")), alt(lit("off"))]);
        assert_eq!(run(g, &["maybe"]), None);
    }

    #[test]
    fn test_or_backtracks() {
        let g = or(vec![seq(vec![number(), lit("x")]), hostname()]);
        assert_eq!(run(g, &["abc"]), Some(Value::string("abc")));
    }

    #[test]
    fn test_or_without_match_is_void() {
        assert_eq!(run(or(vec![lit("x"), lit("y")]), &["z"]), Some(Value::Void));
        assert_eq!(
            run(optional(or(vec![number()])), &["abc"]),
            Some(Value::Void)
        );

        // a void field is left out of the map; "z" is still there to match
        let g = tuple(vec![field("v", or(vec![number(), boolean()])), lit("z")]);
        assert_eq!(
            run(g, &["z"]),
            Some(Value::map(Vec::<(String, Value)>::new()))
        );
    }

    #[test]
    fn test_sequence_returns_span() {
        let g = seq(vec![number(), lit("."), number()]);
        assert_eq!(run(g, &["10.5 rest"]), Some(Value::string("10.5")));
    }

    #[test]
    fn test_comment_lines_skipped() {
        assert_eq!(run(number(), &["# comment", "42", ""]), Some(Value::int(42)));
    }

    #[test]
    fn test_empty_file_matches_optional_list() {
        let g = list(number(), lit("\n"));
        assert_eq!(run(g, &[]), Some(Value::list(vec![])));
    }

    #[test]
    fn test_list_stops_without_progress() {
        let g = list(optional(number()), optional(lit(",")));
        assert_eq!(run(g, &["x"]), Some(Value::list(vec![])));
    }

    #[test]
    fn test_tuple_continue_repeats() {
        // any number of ",n" items; the last one wins the unnamed value
        let g = tuple(vec![var(vec![lit(","), value(number())]), cont(skip())]);
        let lines = cache(&[",1,2,3\n"]);
        let grammar = Grammar::from_value(&g).unwrap();
        let outcome = Interpreter::new(&lines, true).parse(&grammar).unwrap();
        assert_eq!(
            outcome.value,
            Some(Value::map(vec![(VALUE_KEY, Value::int(3))]))
        );
        assert_eq!(lines.rest(outcome.cursor), "\n");
    }

    #[test]
    fn test_recursion_limit() {
        let mut g = number();
        for _ in 0..20 {
            g = optional(g);
        }
        let grammar = Grammar::from_value(&g).unwrap();
        let lines = cache(&["1"]);
        let err = Interpreter::new(&lines, true)
            .with_max_recursion_depth(10)
            .parse(&grammar)
            .unwrap_err();
        assert!(matches!(err, ParseError::RecursionLimitExceeded { .. }));
    }

    #[test]
    fn test_fillup_collects_comments() {
        let g = Grammar::from_value(&tuple(vec![fillup(), field("n", number())])).unwrap();
        let lines = LineCache::new(vec!["# a\n".into(), "# b\n".into(), "7\n".into()], "#", true);
        let v = Interpreter::new(&lines, true).parse(&g).unwrap().value.unwrap();
        assert_eq!(v.get(FILLUP_KEY), Some(&Value::string("# a\n# b\n")));
        assert_eq!(v.get("n"), Some(&Value::int(7)));
    }

    #[test]
    fn test_ip4_failure_keeps_cursor() {
        let g = or(vec![ip4_number(), string("^\n")]);
        assert_eq!(run(g, &["1.2.3.x"]), Some(Value::string("1.2.3.x")));
    }
}
