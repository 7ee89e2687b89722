//! Numeric value recovery from source and assertion text.
//!
//! Text handed to [`evaluate`] comes from untrusted files. It is screened
//! against a character whitelist, a length cap and a parenthesis balance
//! check, then evaluated by a small recursive-descent parser that only knows
//! numbers, `+ - * /` and parentheses. Anything else yields `None` and the
//! caller treats the text as an opaque expression.

use once_cell::sync::Lazy;
use regex::Regex;

/// Values closer than this are the same number.
pub const NUMERIC_TOLERANCE: f64 = 0.001;

pub const MAX_EXPRESSION_LEN: usize = 100;

static SAFE_EXPRESSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\d\s+\-*/().]+$").unwrap());

static SUFFIXED_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)(?:_?(?:f32|f64|i8|i16|i32|i64|u8|u16|u32|u64|usize|isize|[fFdDmMlL]))?$",
    )
    .unwrap()
});

static APPROX_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bapprox\s*\(\s*([^,)]+)").unwrap());

static NUMBER_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^\w.])(-?\d+(?:\.\d+)?)\b").unwrap());

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < NUMERIC_TOLERANCE
}

/// Evaluate a whitelisted arithmetic expression.
pub fn evaluate(expr: &str) -> Option<f64> {
    let expr = expr.trim();
    if expr.is_empty() || expr.len() > MAX_EXPRESSION_LEN || !SAFE_EXPRESSION.is_match(expr) {
        return None;
    }
    if !parens_balanced(expr) {
        return None;
    }

    let mut parser = Parser {
        bytes: expr.as_bytes(),
        pos: 0,
    };
    let value = parser.expression()?;
    parser.skip_ws();
    (parser.pos == parser.bytes.len() && value.is_finite()).then_some(value)
}

fn parens_balanced(expr: &str) -> bool {
    let mut depth = 0i32;
    for c in expr.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn skip_ws(&mut self) {
        while self.bytes.get(self.pos).is_some_and(u8::is_ascii_whitespace) {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.bytes.get(self.pos).copied()
    }

    fn expression(&mut self) -> Option<f64> {
        let mut value = self.term()?;
        while let Some(op @ (b'+' | b'-')) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == b'+' { value + rhs } else { value - rhs };
        }
        Some(value)
    }

    fn term(&mut self) -> Option<f64> {
        let mut value = self.factor()?;
        while let Some(op @ (b'*' | b'/')) = self.peek() {
            self.pos += 1;
            let rhs = self.factor()?;
            value = if op == b'*' {
                value * rhs
            } else if rhs == 0.0 {
                return None;
            } else {
                value / rhs
            };
        }
        Some(value)
    }

    fn factor(&mut self) -> Option<f64> {
        match self.peek()? {
            b'-' => {
                self.pos += 1;
                self.factor().map(|v| -v)
            }
            b'+' => {
                self.pos += 1;
                self.factor()
            }
            b'(' => {
                self.pos += 1;
                let value = self.expression()?;
                (self.peek()? == b')').then(|| {
                    self.pos += 1;
                    value
                })
            }
            _ => self.number(),
        }
    }

    fn number(&mut self) -> Option<f64> {
        let start = self.pos;
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_digit() || *b == b'.')
        {
            self.pos += 1;
        }
        std::str::from_utf8(&self.bytes[start..self.pos])
            .ok()?
            .parse()
            .ok()
    }
}

/// Best-effort numeric reading of an assertion or source value.
///
/// Accepts plain and suffixed literals (`90.0d`, `0.85m`, `1_000u32`),
/// `approx(...)` wrappers, whitelisted arithmetic and, as a last resort, a
/// text containing exactly one numeric literal (`BigDecimal("90.00")`).
pub fn parse_numeric(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let inner = APPROX_CALL
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(text);
    let compact = inner.replace('_', "");
    let unsuffixed = compact.trim_end_matches(|c: char| "fFdDmMlL".contains(c) && compact.len() > 1);

    if let Some(caps) = SUFFIXED_LITERAL.captures(&compact) {
        return caps[1].parse().ok();
    }
    if let Some(value) = evaluate(unsuffixed) {
        return Some(value);
    }

    let mut literals = NUMBER_LITERAL.captures_iter(inner);
    let only = literals.next()?;
    if literals.next().is_some() {
        return None;
    }
    only[1].parse().ok()
}

/// Every numeric literal in a line of code, with string contents removed.
pub fn numeric_literals(line: &str) -> Vec<f64> {
    let cleaned = crate::parsers::common::strip_literals(line);
    NUMBER_LITERAL
        .captures_iter(&cleaned)
        .filter_map(|caps| caps[1].parse().ok())
        .collect()
}
