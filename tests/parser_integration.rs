//! Integration tests for the grammar interpreter
//!
//! These tests cover parsing and unparsing through the public API:
//! - Leaf types and literals
//! - Lists, tuples and fields
//! - Choice alternatives and `Match()`
//! - Comment handling and fillup mode
//! - Authoring defects

use anyagent::engine::{
    grammar_dsl::*, Grammar, Interpreter, LineCache, ParseError, Value,
};

fn lines(raw: &[&str]) -> LineCache {
    LineCache::new(raw.iter().map(|s| s.to_string()).collect(), "#", false)
}

fn grammar(value: Value) -> Grammar {
    Grammar::from_value(&value).expect("grammar should decode")
}

fn parse(g: &Grammar, raw: &[&str]) -> Option<Value> {
    let cache = lines(raw);
    Interpreter::new(&cache, true)
        .parse(g)
        .expect("parse should not abort")
        .value
}

fn unparse(g: &Grammar, value: &Value) -> Option<String> {
    let cache = lines(&[]);
    Interpreter::new(&cache, false).unparse(g, value)
}

// ============================================================================
// Leaf Types
// ============================================================================

#[test]
fn test_hostname_round_trip() {
    let g = grammar(hostname());
    let parsed = parse(&g, &["myhost.example.com"]).expect("hostname should match");
    assert_eq!(parsed, Value::string("myhost.example.com"));
    assert_eq!(unparse(&g, &parsed).as_deref(), Some("myhost.example.com"));
}

#[test]
fn test_number_skips_comments_and_blank_lines() {
    let g = grammar(number());
    assert_eq!(parse(&g, &["# comment", "42", ""]), Some(Value::int(42)));
}

#[test]
fn test_leaf_mismatch_is_no_match() {
    assert_eq!(parse(&grammar(number()), &["abc"]), None);
    assert_eq!(parse(&grammar(ip4_number()), &["10.0.300.1"]), None);
    assert_eq!(parse(&grammar(boolean()), &["maybe"]), None);
}

#[test]
fn test_hexval_float_boolean() {
    assert_eq!(parse(&grammar(hexval()), &["0xff"]), Some(Value::int(255)));
    assert_eq!(parse(&grammar(float()), &["2.5"]), Some(Value::float(2.5)));
    assert_eq!(parse(&grammar(boolean()), &["no"]), Some(Value::bool(false)));
    assert_eq!(unparse(&grammar(float()), &Value::float(2.5)).as_deref(), Some("2.500000"));
}

// ============================================================================
// Lists and Tuples
// ============================================================================

#[test]
fn test_number_list_round_trip() {
    let g = grammar(list(number(), separator(",")));
    let parsed = parse(&g, &["1,2,3"]).expect("list always matches");
    assert_eq!(
        parsed,
        Value::list(vec![Value::int(1), Value::int(2), Value::int(3)])
    );
    assert_eq!(unparse(&g, &parsed).as_deref(), Some("1,2,3"));
}

#[test]
fn test_list_over_lines() {
    let g = grammar(list(number(), lit("\n")));
    assert_eq!(
        parse(&g, &["1\n", "# two\n", "3\n"]),
        Some(Value::list(vec![Value::int(1), Value::int(3)]))
    );
}

#[test]
fn test_host_entry_round_trip() {
    let g = grammar(tuple(vec![
        field("name", string("^ ")),
        whitespace(),
        value(ip4_number()),
    ]));
    let parsed = parse(&g, &["host1 192.168.0.1"]).expect("tuple should match");
    assert_eq!(
        parsed,
        Value::map(vec![
            ("name", Value::string("host1")),
            ("value", Value::int(3232235521)),
        ])
    );
    assert_eq!(unparse(&g, &parsed).as_deref(), Some("host1 192.168.0.1"));
}

#[test]
fn test_tuple_ignores_whitespace_width() {
    let g = grammar(tuple(vec![
        field("name", string("^ \t")),
        whitespace(),
        value(number()),
    ]));
    let narrow = parse(&g, &["a 1"]);
    let wide = parse(&g, &["a \t  1"]);
    assert_eq!(narrow, wide);
    let rendered = unparse(&g, &narrow.clone().unwrap()).unwrap();
    assert_eq!(parse(&g, &[rendered.as_str()]), narrow);
}

#[test]
fn test_name_value_pairs_per_line() {
    let g = grammar(list(
        tuple(vec![name(string("^=\n")), lit("="), value(number())]),
        lit("\n"),
    ));
    let parsed = parse(&g, &["a=1\n", "b=2\n"]).unwrap();
    assert_eq!(
        parsed,
        Value::list(vec![
            Value::map(vec![("a", Value::int(1))]),
            Value::map(vec![("b", Value::int(2))]),
        ])
    );
}

#[test]
fn test_optional_fields() {
    let g = grammar(tuple(vec![
        field("key", string("^ =")),
        optional(tuple(vec![lit("="), field("val", number())])),
    ]));
    assert_eq!(
        parse(&g, &["k"]),
        Some(Value::map(vec![("key", Value::string("k"))]))
    );
}

// ============================================================================
// Choice and Match
// ============================================================================

#[test]
fn test_choice_first_alternative_wins() {
    let g = grammar(choice(vec![alt(lit("yes")), alt(lit("y"))]));
    assert_eq!(parse(&g, &["yes"]), Some(Value::string("yes")));
    assert_eq!(parse(&g, &["y"]), Some(Value::string("y")));
}

#[test]
fn test_choice_action_and_match() {
    let state = choice(vec![
        alt_action(lit("on"), skip()),
        alt_action(lit("off"), skip()),
    ]);
    assert_eq!(parse(&grammar(state.clone()), &["off"]), Some(Value::Void));

    let g = grammar(tuple(vec![field("state", state), field("seen", match_())]));
    assert_eq!(
        parse(&g, &["off\n"]),
        Some(Value::map(vec![("seen", Value::string("off"))]))
    );
}

#[test]
fn test_choice_unparse_uses_match() {
    let g = grammar(choice(vec![
        alt_action(lit("on"), match_()),
        alt_action(lit("off"), match_()),
    ]));
    assert_eq!(unparse(&g, &Value::string("off")).as_deref(), Some("off"));
    assert_eq!(unparse(&g, &Value::string("dim")), None);
}

// ============================================================================
// Unparse Failures
// ============================================================================

#[test]
fn test_string_for_number_does_not_conform() {
    let g = grammar(number());
    assert_eq!(unparse(&g, &Value::string("42")), None);
}

#[test]
fn test_list_element_failure_fails_whole_list() {
    let g = grammar(list(number(), separator(",")));
    let v = Value::list(vec![Value::int(1), Value::string("x")]);
    assert_eq!(unparse(&g, &v), None);
}

// ============================================================================
// Fillup Mode
// ============================================================================

#[test]
fn test_fillup_keeps_comments() {
    let g = grammar(list(
        tuple(vec![fillup(), field("n", number()), lit("\n")]),
        skip(),
    ));
    let cache = LineCache::new(
        vec!["# first\n".into(), "1\n".into(), "2\n".into()],
        "#",
        true,
    );
    let mut interpreter = Interpreter::new(&cache, false);
    let parsed = interpreter.parse(&g).unwrap().value.unwrap();
    let items = parsed.as_list().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].get("`FILLUP"), Some(&Value::string("# first\n")));
    assert_eq!(items[0].get("n"), Some(&Value::int(1)));

    let rendered = interpreter.unparse(&g, &parsed).unwrap();
    assert_eq!(rendered, "# first\n1\n2\n");
}

// ============================================================================
// Defects
// ============================================================================

#[test]
fn test_name_in_writable_parse_aborts() {
    let g = grammar(tuple(vec![name(number())]));
    let cache = lines(&["1"]);
    let err = Interpreter::new(&cache, false).parse(&g).unwrap_err();
    assert!(matches!(err, ParseError::Defect { .. }));
}

#[test]
fn test_recursion_limit() {
    let mut g = number();
    for _ in 0..50 {
        g = optional(g);
    }
    let g = grammar(g);
    let cache = lines(&["1"]);
    let err = Interpreter::new(&cache, true)
        .with_max_recursion_depth(10)
        .parse(&g)
        .unwrap_err();
    assert!(matches!(err, ParseError::RecursionLimitExceeded { .. }));
}

#[test]
fn test_unknown_combinator_rejected() {
    let bad = Value::term("Regex", vec![Value::string(".*")]);
    assert!(Grammar::from_value(&bad).is_err());
}
