//! Structured values pulled out of a source method body.

use super::expression::{evaluate, numeric_literals, parse_numeric};
use crate::parsers::common::{is_comment_line, strip_literals};
use once_cell::sync::Lazy;
use regex::Regex;

static RETURN_STMT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*return\s+(.+?)\s*;?\s*$").unwrap());

static LITERAL_ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(\w+)\s*(?::\s*[\w<>\[\]]+\s*)?:?=\s*(-?\d+(?:\.\d+)?)(?:_?[a-zA-Z]\w*)?\s*;?\s*$",
    )
    .unwrap()
});

static THROW_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:throw|throws|raise|panic!|Err\s*\(|errors\.New|fmt\.Errorf|reject\s*\()").unwrap()
});

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceValueKind {
    /// `return <literal or evaluable expression>`
    Return,
    /// `NAME = <literal>`
    Constant,
    /// A literal operand inside any other expression.
    Calculation,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SourceValue {
    pub kind: SourceValueKind,
    pub value: f64,
    /// 1-indexed file line.
    pub line: usize,
    /// The trimmed source line the value came from.
    pub context: String,
}

/// Extract every numeric value from `body`, whose first line is file line
/// `first_line`.
///
/// A `return` whose whole expression evaluates yields a single `Return`
/// value; its operands are not reported separately.
pub fn extract_source_values(body: &str, first_line: usize) -> Vec<SourceValue> {
    let mut values = Vec::new();

    for (offset, line) in body.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_comment_line(trimmed) {
            continue;
        }
        let cleaned = strip_literals(line);
        let line_no = first_line + offset;
        let push = |values: &mut Vec<SourceValue>, kind, value| {
            values.push(SourceValue {
                kind,
                value,
                line: line_no,
                context: trimmed.to_string(),
            })
        };

        if let Some(caps) = RETURN_STMT.captures(&cleaned) {
            if let Some(value) = evaluate(&caps[1]).or_else(|| exact_literal(&caps[1])) {
                push(&mut values, SourceValueKind::Return, value);
                continue;
            }
        }
        if let Some(caps) = LITERAL_ASSIGNMENT.captures(&cleaned) {
            if let Ok(value) = caps[2].parse() {
                push(&mut values, SourceValueKind::Constant, value);
                continue;
            }
        }
        for value in numeric_literals(line) {
            push(&mut values, SourceValueKind::Calculation, value);
        }
    }
    values
}

fn exact_literal(expr: &str) -> Option<f64> {
    let expr = expr.trim();
    expr.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '.')
        .then(|| parse_numeric(expr))
        .flatten()
        .filter(|_| !expr.contains(char::is_whitespace))
}

/// Whether any line of `text` raises, throws, panics or returns an error.
pub fn has_throw_token(text: &str) -> bool {
    text.lines()
        .filter(|line| !is_comment_line(line.trim()))
        .any(|line| THROW_TOKEN.is_match(&strip_literals(line)))
}
