//! Stage 1: read the divergence straight out of a real failure message.

use super::{DetectionInput, DetectionStrategy};
use crate::core::{DetectionStage, Divergence, DivergenceResult, DivergenceType};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

const STRUCTURED_CONFIDENCE: f64 = 0.95;
const EXCEPTION_CONFIDENCE: f64 = 0.92;
const GENERIC_CONFIDENCE: f64 = 0.90;

/// Which capture group holds which side.
#[derive(Clone, Copy)]
enum Sides {
    ExpectedFirst,
    ActualFirst,
}

struct FailureShape {
    regex: Regex,
    sides: Sides,
    label: &'static str,
}

impl FailureShape {
    fn new(pattern: &str, sides: Sides, label: &'static str) -> Self {
        Self {
            regex: Regex::new(pattern).unwrap(),
            sides,
            label,
        }
    }
}

static FAILURE_SHAPES: Lazy<Vec<FailureShape>> = Lazy::new(|| {
    use Sides::*;
    vec![
        // JUnit / TestNG
        FailureShape::new(r"expected:\s*<([^>]*)>\s*but was:\s*<([^>]*)>", ExpectedFirst, "JUnit"),
        FailureShape::new(r"expected \[([^\]]*)\] but found \[([^\]]*)\]", ExpectedFirst, "TestNG"),
        // Jest / Vitest
        FailureShape::new(r"(?s)Expected:\s*(.+?)\s*\n\s*Received:\s*([^\n]+)", ExpectedFirst, "Jest"),
        // Chai, actual first
        FailureShape::new(
            r"(?m)expected (.+?) to (?:deeply |strictly )?equal (.+?)\s*$",
            ActualFirst,
            "Chai",
        ),
        // testify
        FailureShape::new(r"(?s)expected:\s*(.+?)\s*\n\s*actual\s*:\s*([^\n]+)", ExpectedFirst, "testify"),
        // NUnit
        FailureShape::new(r"(?s)Expected:\s*(.+?)\s*\n\s*But was:\s*([^\n]+)", ExpectedFirst, "NUnit"),
        // xUnit
        FailureShape::new(r"(?s)Expected:\s*(.+?)\s*\n\s*Actual:\s*([^\n]+)", ExpectedFirst, "xUnit"),
        // Rust assert_eq!
        FailureShape::new(r"(?s)left:\s*(.+?)\s*\n\s*right:\s*([^\n]+)", ActualFirst, "assert_eq"),
        // pytest rewritten assert
        FailureShape::new(r"(?m)assert (.+?) == (.+?)\s*$", ActualFirst, "pytest"),
        // unittest
        FailureShape::new(r"(?m)AssertionError:\s*(.+?) != (.+?)\s*$", ActualFirst, "unittest"),
        // node:assert strict
        FailureShape::new(r"(\S+)\s*!==\s*(\S+)", ActualFirst, "strict equality"),
        FailureShape::new(
            r"(?im)expected\s+(.+?),?\s+but\s+(?:got|was|received)\s+(.+?)\s*$",
            ExpectedFirst,
            "generic",
        ),
    ]
});

static EXCEPTION_VOCABULARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:exception|thrown|throws?|raised?|panicked|traceback|rejected)\b|\w+(?:Exception|Error)\b")
        .unwrap()
});

static EXCEPTION_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\w+(?:Exception|Error))\b").unwrap());

/// Assertion failures are named like exceptions but mean "values differ".
const ASSERTION_ERROR_NAMES: &[&str] = &["AssertionError", "AssertionFailedError", "ComparisonFailure"];

pub struct RealErrorStrategy;

#[async_trait]
impl DetectionStrategy for RealErrorStrategy {
    fn stage(&self) -> DetectionStage {
        DetectionStage::RealError
    }

    async fn detect(&self, input: &DetectionInput<'_>) -> Option<DivergenceResult> {
        let message = input.real_error?.trim();
        if message.is_empty() {
            return None;
        }
        let test = &input.pair.test;
        let test_line = test
            .assertions
            .first()
            .map(|a| a.line_number)
            .unwrap_or(test.line_number);
        Some(interpret_failure(message, test_line, input.pair.source.line_number))
    }
}

/// Turn a failure message into a divergence. Always yields one: an
/// unrecognised message still proves the test failed.
pub fn interpret_failure(message: &str, test_line: usize, code_line: usize) -> DivergenceResult {
    for shape in FAILURE_SHAPES.iter() {
        let Some(caps) = shape.regex.captures(message) else {
            continue;
        };
        let (expected, actual) = match shape.sides {
            Sides::ExpectedFirst => (clean(&caps[1]), clean(&caps[2])),
            Sides::ActualFirst => (clean(&caps[2]), clean(&caps[1])),
        };
        if expected.is_empty() || actual.is_empty() || expected == actual {
            continue;
        }
        return DivergenceResult::found(
            Divergence {
                divergence_type: DivergenceType::ReturnValueMismatch,
                description: format!("Test expected {expected} but got {actual}"),
                test_line,
                code_line,
                expected,
                actual,
            },
            STRUCTURED_CONFIDENCE,
            format!("Parsed {} failure message", shape.label),
            DetectionStage::RealError,
        );
    }

    let exception = EXCEPTION_NAME
        .captures_iter(message)
        .map(|caps| caps[1].to_string())
        .find(|name| !ASSERTION_ERROR_NAMES.contains(&name.as_str()));
    let mentions_exception = exception.is_some()
        || EXCEPTION_VOCABULARY
            .find_iter(message)
            .any(|m| !ASSERTION_ERROR_NAMES.contains(&m.as_str()));

    if mentions_exception {
        let thrown = exception.unwrap_or_else(|| "an exception".to_string());
        return DivergenceResult::found(
            Divergence {
                divergence_type: DivergenceType::ExceptionMismatch,
                description: format!("Test run failed with {thrown}"),
                test_line,
                code_line,
                expected: "no exception".to_string(),
                actual: thrown,
            },
            EXCEPTION_CONFIDENCE,
            "Failure message reports an exception",
            DetectionStage::RealError,
        );
    }

    DivergenceResult::found(
        Divergence {
            divergence_type: DivergenceType::ReturnValueMismatch,
            description: format!("Test failed: {}", first_line(message)),
            test_line,
            code_line,
            expected: "test to pass".to_string(),
            actual: first_line(message).to_string(),
        },
        GENERIC_CONFIDENCE,
        "Unrecognised failure message",
        DetectionStage::RealError,
    )
}

fn clean(value: &str) -> String {
    value
        .trim()
        .trim_end_matches([',', '.'])
        .trim_matches('`')
        .trim()
        .to_string()
}

fn first_line(message: &str) -> &str {
    message.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or(message)
}
