//! Last-resort inference: which single constant change would make the test
//! pass?

use crate::ast::compare::format_number;
use crate::core::{AssertionType, TestSourcePair};
use crate::detection::expression::{approx_eq, parse_numeric};
use crate::detection::values::{extract_source_values, SourceValue};
use serde::{Deserialize, Serialize};

const NEAR_MISS_RANGE: (f64, f64) = (1.0, 100.0);
const MAX_NEAR_MISS_GAP: f64 = 20.0;
const MAX_RATE_GAP: f64 = 20.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueMismatchKind {
    NearMiss,
    Percentage,
    Threshold,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueMismatch {
    pub kind: ValueMismatchKind,
    pub expected: f64,
    pub actual: f64,
    pub test_line: usize,
    pub code_line: usize,
    pub context: String,
    pub description: String,
    pub confidence: f64,
}

pub fn detect_value_mismatch(pair: &TestSourcePair) -> Option<ValueMismatch> {
    let expected: Vec<(usize, f64)> = pair
        .test
        .assertions
        .iter()
        .filter(|a| a.assertion_type == AssertionType::Equals)
        .filter_map(|a| {
            a.expected
                .as_deref()
                .and_then(parse_numeric)
                .map(|e| (a.line_number, e))
        })
        .collect();
    let values = extract_source_values(&pair.source.body, pair.source.line_number);

    let unexplained: Vec<(usize, f64)> = expected
        .into_iter()
        .filter(|(_, e)| !values.iter().any(|v| approx_eq(v.value, *e)))
        .collect();

    let checks: [fn(f64, &SourceValue) -> Option<(ValueMismatchKind, f64, String, f64)>; 3] =
        [near_miss, percentage, threshold];
    for check in checks {
        for (test_line, e) in &unexplained {
            for value in &values {
                if let Some((kind, actual, description, confidence)) = check(*e, value) {
                    return Some(ValueMismatch {
                        kind,
                        expected: *e,
                        actual,
                        test_line: *test_line,
                        code_line: value.line,
                        context: value.context.clone(),
                        description,
                        confidence,
                    });
                }
            }
        }
    }
    None
}

fn is_small_integer(v: f64) -> bool {
    v.fract() == 0.0 && v >= NEAR_MISS_RANGE.0 && v <= NEAR_MISS_RANGE.1
}

fn near_miss(expected: f64, value: &SourceValue) -> Option<(ValueMismatchKind, f64, String, f64)> {
    let gap = (expected - value.value).abs();
    (is_small_integer(expected) && is_small_integer(value.value) && (1.0..=MAX_NEAR_MISS_GAP).contains(&gap))
        .then(|| {
            (
                ValueMismatchKind::NearMiss,
                value.value,
                format!(
                    "Changing {} to {} on line {} would make the test pass",
                    format_number(value.value),
                    format_number(expected),
                    value.line
                ),
                0.85,
            )
        })
}

fn percentage(expected: f64, value: &SourceValue) -> Option<(ValueMismatchKind, f64, String, f64)> {
    if !(80.0..100.0).contains(&expected) || value.value <= 0.0 || value.value >= 1.0 {
        return None;
    }
    let percent = (value.value * 100.0).round();
    let (gap, implied, replacement) = if value.value >= 0.5 {
        ((percent - expected).abs(), percent, expected / 100.0)
    } else {
        (((100.0 - expected) - percent).abs(), 100.0 - percent, (100.0 - expected) / 100.0)
    };
    (gap > 0.0 && gap <= MAX_RATE_GAP).then(|| {
        (
            ValueMismatchKind::Percentage,
            implied,
            format!(
                "Rate mismatch: changing {} to {} on line {} would make the test pass",
                format_number(value.value),
                format_number(replacement),
                value.line
            ),
            0.8,
        )
    })
}

fn threshold(expected: f64, value: &SourceValue) -> Option<(ValueMismatchKind, f64, String, f64)> {
    let compares = ["<", ">", "<=", ">="]
        .iter()
        .any(|op| value.context.contains(&format!(" {op} ")));
    let gap = (expected - value.value).abs();
    let close = gap <= (value.value.abs() * 0.1).max(1.0);
    (compares && gap > 0.0 && close).then(|| {
        (
            ValueMismatchKind::Threshold,
            value.value,
            format!(
                "Threshold mismatch: the comparison on line {} uses {} but the test implies {}",
                value.line,
                format_number(value.value),
                format_number(expected)
            ),
            0.75,
        )
    })
}
