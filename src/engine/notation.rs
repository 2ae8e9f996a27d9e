//! Term notation reader
//!
//! Reads the textual form that [`Value`]'s `Display` produces, so grammar
//! descriptions can live in files instead of Rust code:
//!
//! ```text
//! `Description(
//!     `File("/etc/hosts"), "#", false,
//!     `List(`Tuple(`ip(`String("^ \t")), `Whitespace(), `name(`Hostname())), "\n")
//! )
//! ```
//!
//! Supported forms: `nil`, `true`, `false`, integers (decimal, `0x` hex,
//! optional sign), floats, double-quoted strings with `\n \t \r \\ \" \xHH`
//! escapes, lists `[a, b]`, maps `$["k": v]`, and terms `` `Name(args) ``
//! (the backquote is optional). `//` and `/* */` comments are skipped.
//!
//! # Example
//!
//! ```rust
//! use anyagent::engine::{notation, value::Value};
//!
//! let v = notation::parse("`List(`Number(), \",\")").unwrap();
//! assert_eq!(v.as_term().unwrap().name, "List");
//! ```

use super::source_location::SourcePosition;
use super::value::{Term, Value};
use hashbrown::HashMap;
use std::fmt;

/// Syntax error in notation text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotationError {
    /// What went wrong
    pub message: String,
    /// Where it went wrong
    pub position: SourcePosition,
}

impl fmt::Display for NotationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "notation error at {}: {}", self.position, self.message)
    }
}

impl std::error::Error for NotationError {}

/// Parse a complete notation text into a value
pub fn parse(input: &str) -> Result<Value, NotationError> {
    let mut reader = Reader::new(input);
    let value = reader.value()?;
    reader.skip_trivia()?;
    if reader.pos < reader.bytes.len() {
        return Err(reader.error("unexpected trailing input"));
    }
    Ok(value)
}

struct Reader<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> NotationError {
        NotationError {
            message: message.into(),
            position: SourcePosition::from_offset(self.input, self.pos),
        }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_trivia(&mut self) -> Result<(), NotationError> {
        loop {
            match self.peek() {
                Some(b) if b.is_ascii_whitespace() => self.pos += 1,
                Some(b'/') if self.bytes.get(self.pos + 1) == Some(&b'/') => {
                    match memchr::memchr(b'\n', &self.bytes[self.pos..]) {
                        Some(n) => self.pos += n + 1,
                        None => self.pos = self.bytes.len(),
                    }
                }
                Some(b'/') if self.bytes.get(self.pos + 1) == Some(&b'*') => {
                    match memchr::memmem::find(&self.bytes[self.pos + 2..], b"*/") {
                        Some(n) => self.pos += n + 4,
                        None => return Err(self.error("unterminated comment")),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn expect(&mut self, b: u8) -> Result<(), NotationError> {
        self.skip_trivia()?;
        if self.peek() == Some(b) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", b as char)))
        }
    }

    fn value(&mut self) -> Result<Value, NotationError> {
        self.skip_trivia()?;
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some(b'"') => self.string().map(Value::String),
            Some(b'[') => {
                self.pos += 1;
                self.sequence(b']').map(Value::List)
            }
            Some(b'$') => self.map(),
            Some(b'`') => {
                self.pos += 1;
                self.term()
            }
            Some(b) if b == b'-' || b == b'+' || b.is_ascii_digit() => self.number(),
            Some(b) if b.is_ascii_alphabetic() || b == b'_' => self.word(),
            Some(b) => Err(self.error(format!("unexpected character '{}'", b as char))),
        }
    }

    fn ident(&mut self) -> Result<&'a str, NotationError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        if start == self.pos {
            return Err(self.error("expected identifier"));
        }
        Ok(&self.input[start..self.pos])
    }

    fn word(&mut self) -> Result<Value, NotationError> {
        let start = self.pos;
        let ident = self.ident()?;
        match ident {
            "nil" => return Ok(Value::Void),
            "true" => return Ok(Value::Bool(true)),
            "false" => return Ok(Value::Bool(false)),
            _ => {}
        }
        self.pos = start;
        self.term()
    }

    fn term(&mut self) -> Result<Value, NotationError> {
        let name = self.ident()?.to_string();
        self.expect(b'(')?;
        let args = self.sequence(b')')?;
        Ok(Value::Term(Term::new(name, args)))
    }

    /// Comma separated values up to `close`, which is consumed
    fn sequence(&mut self, close: u8) -> Result<Vec<Value>, NotationError> {
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok(items);
            }
            items.push(self.value()?);
            self.skip_trivia()?;
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b) if b == close => {}
                _ => return Err(self.error(format!("expected ',' or '{}'", close as char))),
            }
        }
    }

    fn map(&mut self) -> Result<Value, NotationError> {
        self.pos += 1;
        if self.peek() != Some(b'[') {
            return Err(self.error("expected '[' after '$'"));
        }
        self.pos += 1;
        let mut map = HashMap::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some(b']') {
                self.pos += 1;
                return Ok(Value::Map(map));
            }
            let key = self.value()?.to_text();
            self.expect(b':')?;
            let value = self.value()?;
            map.insert(key, value);
            self.skip_trivia()?;
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {}
                _ => return Err(self.error("expected ',' or ']'")),
            }
        }
    }

    fn number(&mut self) -> Result<Value, NotationError> {
        let start = self.pos;
        if matches!(self.peek(), Some(b'-') | Some(b'+')) {
            self.pos += 1;
        }
        let digits_start = self.pos;
        if self.bytes[self.pos..].starts_with(b"0x") || self.bytes[self.pos..].starts_with(b"0X") {
            self.pos += 2;
            let hex_start = self.pos;
            while self.peek().is_some_and(|b| b.is_ascii_hexdigit()) {
                self.pos += 1;
            }
            let n = i64::from_str_radix(&self.input[hex_start..self.pos], 16)
                .map_err(|_| self.error("bad hex literal"))?;
            let negative = self.bytes[start] == b'-';
            return Ok(Value::Int(if negative { -n } else { n }));
        }

        let mut is_float = false;
        while let Some(b) = self.peek() {
            match b {
                b'0'..=b'9' => {}
                b'.' | b'e' | b'E' => is_float = true,
                b'-' | b'+' if is_float && matches!(self.bytes[self.pos - 1], b'e' | b'E') => {}
                _ => break,
            }
            self.pos += 1;
        }
        if self.pos == digits_start {
            return Err(self.error("expected digits"));
        }
        let text = &self.input[start..self.pos];
        if is_float {
            text.parse::<f64>()
                .map(Value::Float)
                .map_err(|_| self.error(format!("bad float literal '{}'", text)))
        } else {
            text.parse::<i64>()
                .map(Value::Int)
                .map_err(|_| self.error(format!("bad integer literal '{}'", text)))
        }
    }

    fn string(&mut self) -> Result<String, NotationError> {
        self.pos += 1;
        let mut out = String::new();
        let mut chars = self.input[self.pos..].char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.pos += i + 1;
                    return Ok(out);
                }
                '\\' => {
                    let Some((_, esc)) = chars.next() else {
                        break;
                    };
                    match esc {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        'e' => out.push('\x1b'),
                        '\\' => out.push('\\'),
                        '"' => out.push('"'),
                        'x' => {
                            let hex: String = chars.by_ref().take(2).map(|(_, c)| c).collect();
                            let code = u8::from_str_radix(&hex, 16).map_err(|_| {
                                self.error(format!("bad escape '\\x{}'", hex))
                            })?;
                            out.push(code as char);
                        }
                        other => out.push(other),
                    }
                }
                c => out.push(c),
            }
        }
        Err(self.error("unterminated string"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars() {
        assert_eq!(parse("nil").unwrap(), Value::Void);
        assert_eq!(parse("true").unwrap(), Value::Bool(true));
        assert_eq!(parse(" -42 ").unwrap(), Value::Int(-42));
        assert_eq!(parse("0x1F").unwrap(), Value::Int(31));
        assert_eq!(parse("1.5").unwrap(), Value::Float(1.5));
        assert_eq!(parse("\"a\\tb\\\"\"").unwrap(), Value::string("a\tb\""));
    }

    #[test]
    fn test_terms_with_and_without_backquote() {
        let a = parse("`Tuple(`name(`Number()), \"=\")").unwrap();
        let b = parse("Tuple(name(Number()), \"=\")").unwrap();
        assert_eq!(a, b);
        let t = a.as_term().unwrap();
        assert_eq!(t.name, "Tuple");
        assert_eq!(t.arity(), 2);
    }

    #[test]
    fn test_collections() {
        let v = parse("[1, [2, 3], $[\"k\": \"v\"],]").unwrap();
        let items = v.as_list().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[2].get("k"), Some(&Value::string("v")));
    }

    #[test]
    fn test_comments_are_skipped() {
        let v = parse("// header\n`Skip( /* nothing */ )").unwrap();
        assert_eq!(v, Value::term("Skip", vec![]));
    }

    #[test]
    fn test_display_reads_back() {
        let v = Value::term(
            "Choice",
            vec![Value::list(vec![Value::string("on\n"), Value::term("Match", vec![])])],
        );
        assert_eq!(parse(&v.to_string()).unwrap(), v);
    }

    #[test]
    fn test_error_position() {
        let err = parse("`List(\n  `Number() `Skip())").unwrap_err();
        assert_eq!(err.position.line, 2);
    }

    #[test]
    fn test_unterminated_string() {
        assert!(parse("\"abc").is_err());
        assert!(parse("[1, 2").is_err());
    }
}
