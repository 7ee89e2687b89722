//! Stage 3: compare asserted numbers against the numbers in the method.
//!
//! Sub-checks run in order and the first hit wins: AST comparison, the
//! "close but wrong" ratio band, the percentage/rate confusion, and a missing
//! throw. When nothing fires the stage falls through to mutation inference.

use super::expression::{approx_eq, parse_numeric};
use super::values::{extract_source_values, has_throw_token, SourceValue};
use super::{DetectionInput, DetectionStrategy};
use crate::ast::{self, AstComparison};
use crate::core::{
    Assertion, AssertionType, DetectionStage, Divergence, DivergenceResult, DivergenceType,
    TestSourcePair,
};
use async_trait::async_trait;
use tracing::debug;

const AST_CONFIDENCE: f64 = 0.80;
const RATIO_CONFIDENCE: f64 = 0.75;
const RATE_CONFIDENCE: f64 = 0.75;
const THROW_CONFIDENCE: f64 = 0.70;
const NOTHING_FOUND_CONFIDENCE: f64 = 0.60;

/// Ratio band for "close but wrong" values, exclusive.
const RATIO_BAND: (f64, f64) = (0.7, 1.3);
const MAX_RATE_GAP: f64 = 20.0;

pub struct StaticAnalysisStrategy;

#[async_trait]
impl DetectionStrategy for StaticAnalysisStrategy {
    fn stage(&self) -> DetectionStage {
        DetectionStage::StaticAnalysis
    }

    async fn detect(&self, input: &DetectionInput<'_>) -> Option<DivergenceResult> {
        let found = analyze_pair(input);
        if found.is_none() {
            debug!(
                test = %input.pair.test.name,
                confidence = NOTHING_FOUND_CONFIDENCE,
                "Static analysis found no divergence"
            );
        }
        found
    }
}

pub fn analyze_pair(input: &DetectionInput<'_>) -> Option<DivergenceResult> {
    let pair = input.pair;
    ast_mismatch(input)
        .or_else(|| {
            let expected = numeric_expectations(&pair.test.assertions);
            let values = extract_source_values(&pair.source.body, pair.source.line_number);
            let unexplained: Vec<_> = expected
                .into_iter()
                .filter(|(_, e)| !values.iter().any(|v| explains(v.value, *e)))
                .collect();
            ratio_mismatch(&unexplained, &values).or_else(|| rate_mismatch(&unexplained, &values))
        })
        .or_else(|| missing_throw(pair))
}

fn ast_mismatch(input: &DetectionInput<'_>) -> Option<DivergenceResult> {
    let pair = input.pair;
    let language = input.language()?;
    match ast::compare_pair(
        &pair.test.body,
        pair.test.line_number,
        &pair.source.body,
        pair.source.line_number,
        input.source_file_text,
        language,
    ) {
        AstComparison::Mismatch(m) => Some(DivergenceResult::found(
            Divergence {
                divergence_type: DivergenceType::ReturnValueMismatch,
                description: m.description,
                test_line: m.test_line,
                code_line: m.code_line,
                expected: ast::compare::format_number(m.expected),
                actual: ast::compare::format_number(m.actual),
            },
            AST_CONFIDENCE,
            "AST comparison of assertion and source values",
            DetectionStage::StaticAnalysis,
        )),
        AstComparison::Consistent | AstComparison::NoComparison => None,
    }
}

/// Equality assertions with a numeric expected side.
fn numeric_expectations(assertions: &[Assertion]) -> Vec<(&Assertion, f64)> {
    assertions
        .iter()
        .filter(|a| a.assertion_type == AssertionType::Equals)
        .filter_map(|a| a.expected.as_deref().and_then(parse_numeric).map(|e| (a, e)))
        .collect()
}

/// A source value accounts for an expected one directly or as a percentage
/// in either representation.
fn explains(value: f64, expected: f64) -> bool {
    approx_eq(value, expected)
        || (value > 0.0 && value < 1.0
            && (approx_eq(100.0 * (1.0 - value), expected) || approx_eq(100.0 * value, expected)))
}

fn ratio_mismatch(expected: &[(&Assertion, f64)], values: &[SourceValue]) -> Option<DivergenceResult> {
    for (assertion, e) in expected {
        if *e == 0.0 {
            continue;
        }
        let hit = values.iter().find(|v| {
            let ratio = v.value / e;
            (v.value - e).abs() >= 1.0 && ratio > RATIO_BAND.0 && ratio < RATIO_BAND.1
        });
        if let Some(value) = hit {
            return Some(DivergenceResult::found(
                Divergence {
                    divergence_type: DivergenceType::ReturnValueMismatch,
                    description: format!(
                        "Test expects {} but the method uses {} (`{}`)",
                        ast::compare::format_number(*e),
                        ast::compare::format_number(value.value),
                        value.context
                    ),
                    test_line: assertion.line_number,
                    code_line: value.line,
                    expected: ast::compare::format_number(*e),
                    actual: ast::compare::format_number(value.value),
                },
                RATIO_CONFIDENCE,
                "Asserted value is close to but different from a source value",
                DetectionStage::StaticAnalysis,
            ));
        }
    }
    None
}

/// Discount-style confusion between a result (`90`) and the fraction that
/// produces it (`0.85` as a multiplier, `0.15` as a rate).
fn rate_mismatch(expected: &[(&Assertion, f64)], values: &[SourceValue]) -> Option<DivergenceResult> {
    for (assertion, e) in expected {
        if !(80.0..100.0).contains(e) {
            continue;
        }
        for value in values.iter().filter(|v| v.value > 0.0 && v.value < 1.0) {
            let percent = (value.value * 100.0).round();
            let (gap, implied) = if value.value >= 0.5 {
                ((percent - e).abs(), percent)
            } else {
                (((100.0 - e) - percent).abs(), 100.0 - percent)
            };
            if gap > 0.0 && gap <= MAX_RATE_GAP {
                return Some(DivergenceResult::found(
                    Divergence {
                        divergence_type: DivergenceType::ReturnValueMismatch,
                        description: format!(
                            "Rate mismatch: test expects {} ({}% rate) but the method applies {} (`{}`), giving {}",
                            ast::compare::format_number(*e),
                            ast::compare::format_number(100.0 - e),
                            ast::compare::format_number(value.value),
                            value.context,
                            ast::compare::format_number(implied),
                        ),
                        test_line: assertion.line_number,
                        code_line: value.line,
                        expected: ast::compare::format_number(*e),
                        actual: ast::compare::format_number(implied),
                    },
                    RATE_CONFIDENCE,
                    "Percentage and rate representations disagree",
                    DetectionStage::StaticAnalysis,
                ));
            }
        }
    }
    None
}

fn missing_throw(pair: &TestSourcePair) -> Option<DivergenceResult> {
    let throws = pair
        .test
        .assertions
        .iter()
        .find(|a| a.assertion_type == AssertionType::Throws)?;
    if has_throw_token(&pair.source.body) {
        return None;
    }
    let exception = throws
        .expected
        .as_deref()
        .map(exception_name)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "an exception".to_string());

    Some(DivergenceResult::found(
        Divergence {
            divergence_type: DivergenceType::ExceptionMismatch,
            description: format!(
                "Test expects {} but {} never throws",
                exception, pair.source.name
            ),
            test_line: throws.line_number,
            code_line: pair.source.line_number,
            expected: exception,
            actual: "no exception thrown".to_string(),
        },
        THROW_CONFIDENCE,
        "Expected exception has no throw site in the method",
        DetectionStage::StaticAnalysis,
    ))
}

/// `IllegalArgumentException.class`, `typeof(ArgumentException)` and
/// `ValueError` all name the same thing.
fn exception_name(raw: &str) -> String {
    let raw = raw.trim();
    let raw = raw
        .strip_prefix("typeof(")
        .and_then(|r| r.strip_suffix(')'))
        .unwrap_or(raw);
    raw.trim_end_matches(".class")
        .trim_end_matches("::class")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::sample_pair;
    use pretty_assertions::assert_eq;

    fn run(test_body: &str, source_body: &str) -> Option<DivergenceResult> {
        let pair = sample_pair(test_body, source_body);
        analyze_pair(&DetectionInput::new(&pair))
    }

    #[test]
    fn test_multiplier_rate_mismatch() {
        let result = run(
            "assertEquals(90.0, calc.calculate(100.0), 0.01);",
            "public double calculate(double price) {\n    return price * 0.85;\n}",
        )
        .unwrap();
        let divergence = result.divergence.unwrap();
        assert_eq!(divergence.divergence_type, DivergenceType::ReturnValueMismatch);
        assert!(divergence.description.contains("Rate mismatch"));
        assert_eq!(divergence.expected, "90");
        assert_eq!(divergence.actual, "85");
        assert_eq!(divergence.code_line, 2);
        assert_eq!(result.confidence, 0.75);
    }

    #[test]
    fn test_fractional_rate_mismatch() {
        let result = run(
            "assertEquals(90, calc.calculate(100));",
            "public double calculate(double price) {\n    double off = price * 0.15;\n    return price - off;\n}",
        )
        .unwrap();
        assert_eq!(result.divergence.unwrap().actual, "85");
    }

    #[test]
    fn test_ratio_band() {
        let result = run(
            "assertEquals(50, calc.calculate(10));",
            "public int calculate(int n) {\n    return n * 45;\n}",
        )
        .unwrap();
        let divergence = result.divergence.unwrap();
        assert_eq!((divergence.expected.as_str(), divergence.actual.as_str()), ("50", "45"));
        assert_eq!(result.confidence, 0.75);
    }

    #[test]
    fn test_matching_literal_is_no_divergence() {
        assert!(run(
            "assertEquals(10, calc.calculate(1));",
            "public int calculate(int n) {\n    return n * 10;\n}",
        )
        .is_none());
        assert!(run(
            "assertEquals(85, calc.calculate(100));",
            "public double calculate(double p) {\n    return p * 0.85;\n}",
        )
        .is_none());
    }

    #[test]
    fn test_unrelated_magnitudes_are_ignored() {
        assert!(run(
            "assertEquals(5, calc.calculate(1));",
            "public int calculate(int n) {\n    return n + 1000;\n}",
        )
        .is_none());
    }

    #[test]
    fn test_missing_throw() {
        let result = run(
            "assertThrows(IllegalArgumentException.class, () -> calc.calculate(-1));",
            "public int calculate(int n) {\n    return n * 2;\n}",
        )
        .unwrap();
        let divergence = result.divergence.unwrap();
        assert_eq!(divergence.divergence_type, DivergenceType::ExceptionMismatch);
        assert_eq!(divergence.expected, "IllegalArgumentException");
        assert_eq!(result.confidence, 0.70);
    }

    #[test]
    fn test_throw_present_is_fine() {
        assert!(run(
            "assertThrows(IllegalArgumentException.class, () -> calc.calculate(-1));",
            "public int calculate(int n) {\n    if (n < 0) throw new IllegalArgumentException();\n    return n;\n}",
        )
        .is_none());
    }

    #[test]
    fn test_exception_name() {
        assert_eq!(exception_name("IllegalArgumentException.class"), "IllegalArgumentException");
        assert_eq!(exception_name("typeof(ArgumentException)"), "ArgumentException");
        assert_eq!(exception_name("ValueError"), "ValueError");
    }
}
