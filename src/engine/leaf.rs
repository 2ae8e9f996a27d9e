//! Leaf-type parsers and unparsers
//!
//! Pure functions over the unconsumed text of the current line. A parser
//! returns the value and the number of bytes it consumed, or `None` when it
//! does not match; the interpreter advances the cursor only on success, so a
//! failed leaf leaves the position untouched for backtracking.
//!
//! Unparsers return `None` when the value would not parse back to itself:
//! wrong type, out of range, or text outside the atom's character class.
//!
//! Character classes are ASCII, as in C locale.

use super::char_class::CharSet;
use super::value::Value;

#[inline]
fn digit_run(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// `Number()`: maximal run of ASCII digits
///
/// A run that does not fit an `i64` does not match.
pub fn parse_number(text: &str) -> Option<(Value, usize)> {
    let n = digit_run(text.as_bytes());
    if n == 0 {
        return None;
    }
    text[..n].parse::<i64>().ok().map(|v| (Value::Int(v), n))
}

/// Inverse of [`parse_number`]; negative values have no digit-only form
pub fn unparse_number(value: &Value) -> Option<String> {
    let n = value.as_int().ok()?;
    (n >= 0).then(|| n.to_string())
}

/// `Hexval()`: optional `0x`/`0X`, then hex digits
///
/// Digits beyond 64 bits wrap, as the value is accumulated in a machine
/// word.
pub fn parse_hexval(text: &str) -> Option<(Value, usize)> {
    let bytes = text.as_bytes();
    let prefixed = bytes.len() > 2
        && bytes[0] == b'0'
        && matches!(bytes[1], b'x' | b'X')
        && bytes[2].is_ascii_hexdigit();
    let start = if prefixed { 2 } else { 0 };
    let digits = bytes[start..]
        .iter()
        .take_while(|b| b.is_ascii_hexdigit())
        .count();
    if digits == 0 {
        return None;
    }
    let mut acc: u64 = 0;
    for &b in &bytes[start..start + digits] {
        let d = (b as char).to_digit(16).unwrap_or(0) as u64;
        acc = acc.wrapping_shl(4) | d;
    }
    Some((Value::Int(acc as i64), start + digits))
}

/// Inverse of [`parse_hexval`]: lowercase, no prefix
pub fn unparse_hexval(value: &Value) -> Option<String> {
    value.as_int().ok().map(|n| format!("{:x}", n))
}

/// `Boolean()`: `yes` or `no`
pub fn parse_boolean(text: &str) -> Option<(Value, usize)> {
    if text.starts_with("yes") {
        Some((Value::Bool(true), 3))
    } else if text.starts_with("no") {
        Some((Value::Bool(false), 2))
    } else {
        None
    }
}

/// Inverse of [`parse_boolean`]
pub fn unparse_boolean(value: &Value) -> Option<String> {
    value
        .as_bool()
        .ok()
        .map(|b| if b { "yes" } else { "no" }.to_string())
}

/// `Float()`: digits, optional `.`, digits
///
/// Needs at least one digit or the dot; a lone `.` reads as `0.0`.
pub fn parse_float(text: &str) -> Option<(Value, usize)> {
    let bytes = text.as_bytes();
    let int_part = digit_run(bytes);
    let mut n = int_part;
    let has_dot = bytes.get(n) == Some(&b'.');
    if has_dot {
        n += 1;
        n += digit_run(&bytes[n..]);
    }
    if int_part == 0 && !has_dot {
        return None;
    }
    let literal = &text[..n];
    let value = if literal == "." {
        0.0
    } else {
        literal.parse::<f64>().ok()?
    };
    Some((Value::Float(value), n))
}

/// Inverse of [`parse_float`], six decimals
pub fn unparse_float(value: &Value) -> Option<String> {
    let f = value.as_float().ok()?;
    (f.is_finite() && f.is_sign_positive()).then(|| format!("{:.6}", f))
}

/// `Ip4Number()`: four dot separated octets packed into one integer
pub fn parse_ip4_number(text: &str) -> Option<(Value, usize)> {
    let bytes = text.as_bytes();
    let mut pos = 0;
    let mut packed: i64 = 0;
    for octet in 0..4 {
        if octet > 0 {
            if bytes.get(pos) != Some(&b'.') {
                return None;
            }
            pos += 1;
        }
        let n = digit_run(&bytes[pos..]);
        if n == 0 {
            return None;
        }
        let part: u32 = text[pos..pos + n].parse().ok()?;
        if part > 255 {
            return None;
        }
        packed = (packed << 8) | part as i64;
        pos += n;
    }
    Some((Value::Int(packed), pos))
}

/// Inverse of [`parse_ip4_number`]
pub fn unparse_ip4_number(value: &Value) -> Option<String> {
    let n = u32::try_from(value.as_int().ok()?).ok()?;
    Some(format!(
        "{}.{}.{}.{}",
        (n >> 24) & 0xff,
        (n >> 16) & 0xff,
        (n >> 8) & 0xff,
        n & 0xff
    ))
}

/// Length of the hostname prefix of `bytes`
///
/// Alphabetic start, then alphanumerics, `_`, and `.` when followed by a
/// letter.
fn hostname_len(bytes: &[u8]) -> usize {
    if !bytes.first().is_some_and(|b| b.is_ascii_alphabetic()) {
        return 0;
    }
    let mut n = 1;
    while let Some(&b) = bytes.get(n) {
        let accepted = b.is_ascii_alphanumeric()
            || b == b'_'
            || (b == b'.' && bytes.get(n + 1).is_some_and(|c| c.is_ascii_alphabetic()));
        if !accepted {
            break;
        }
        n += 1;
    }
    n
}

fn username_len(bytes: &[u8]) -> usize {
    if !bytes.first().is_some_and(|b| b.is_ascii_alphabetic()) {
        return 0;
    }
    bytes.iter().take_while(|b| b.is_ascii_alphanumeric()).count()
}

/// `Hostname()`
pub fn parse_hostname(text: &str) -> Option<(Value, usize)> {
    match hostname_len(text.as_bytes()) {
        0 => None,
        n => Some((Value::string(&text[..n]), n)),
    }
}

/// `s` itself when `len` covers all of it and it is not empty
fn whole(s: &str, len: usize) -> Option<String> {
    (len > 0 && len == s.len()).then(|| s.to_string())
}

/// Inverse of [`parse_hostname`]
pub fn unparse_hostname(value: &Value) -> Option<String> {
    let s = value.as_str().ok()?;
    whole(s, hostname_len(s.as_bytes()))
}

/// `Username()`
pub fn parse_username(text: &str) -> Option<(Value, usize)> {
    match username_len(text.as_bytes()) {
        0 => None,
        n => Some((Value::string(&text[..n]), n)),
    }
}

/// Inverse of [`parse_username`]
pub fn unparse_username(value: &Value) -> Option<String> {
    let s = value.as_str().ok()?;
    whole(s, username_len(s.as_bytes()))
}

/// Literal match: number of bytes consumed
#[inline]
pub fn parse_verbose(text: &str, literal: &str) -> Option<usize> {
    text.starts_with(literal).then_some(literal.len())
}

/// `Separator(chars)` / `Whitespace()`: byte length of the run, possibly 0
#[inline]
pub fn parse_separator(text: &str, set: &CharSet) -> usize {
    set.span(text)
}

/// Inverse of [`parse_separator`]: one representative character
pub fn unparse_separator(set: &CharSet) -> String {
    set.first().map(String::from).unwrap_or_default()
}

/// `String(set[, strip])`
///
/// Returns `None` for a zero-length run unless the set is empty; the
/// caller decides whether that is acceptable.
pub fn parse_string(text: &str, set: &CharSet, strip: Option<&CharSet>) -> Option<(Value, usize)> {
    let n = set.span(text);
    if n == 0 && !set.is_empty() {
        return None;
    }
    let captured = &text[..n];
    let captured = strip.map_or(captured, |s| s.trim(captured));
    Some((Value::string(captured), n))
}

/// Inverse of [`parse_string`]
///
/// The value is stripped first; what remains must lie wholly inside `set`
/// and be non-empty unless the set string is.
pub fn unparse_string(value: &Value, set: &CharSet, strip: Option<&CharSet>) -> Option<String> {
    let s = value.as_str().ok()?;
    let s = strip.map_or(s, |st| st.trim(s));
    let n = set.span(s);
    (n == s.len() && (n > 0 || set.is_empty())).then(|| s.to_string())
}
