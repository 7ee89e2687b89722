use super::AstAnalysisResult;
use crate::detection::expression::NUMERIC_TOLERANCE;

/// Rate constants that differ by less than this are the same rate.
const RATE_EPSILON: f64 = 0.001;

#[derive(Clone, Debug, PartialEq)]
pub struct AstMismatch {
    pub expected: f64,
    pub actual: f64,
    pub description: String,
    pub test_line: usize,
    pub code_line: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AstComparison {
    Mismatch(AstMismatch),
    /// Some asserted value is explained by the source.
    Consistent,
    /// Nothing comparable on one side or the other.
    NoComparison,
}

/// Compare asserted numbers against source returns, then against rate
/// constants read as `100 * (1 - rate)`.
pub fn compare(test: &AstAnalysisResult, source: &AstAnalysisResult) -> AstComparison {
    let mut consistent = false;

    for assertion in &test.assertions {
        let Some(expected) = assertion.expected_value else {
            continue;
        };

        let numeric_returns: Vec<_> = source
            .returns
            .iter()
            .filter_map(|r| r.value.map(|v| (r, v)))
            .collect();
        if !numeric_returns.is_empty() {
            if numeric_returns.iter().any(|(_, v)| (v - expected).abs() < NUMERIC_TOLERANCE) {
                consistent = true;
                continue;
            }
            let Some((ret, actual)) = numeric_returns.into_iter().min_by(|(_, a), (_, b)| {
                (a - expected).abs().total_cmp(&(b - expected).abs())
            }) else {
                continue;
            };
            return AstComparison::Mismatch(AstMismatch {
                expected,
                actual,
                description: format!(
                    "Test expects {} but the method returns {}",
                    format_number(expected),
                    ret.raw
                ),
                test_line: assertion.line,
                code_line: ret.line,
            });
        }

        let rates: Vec<_> = source
            .constants
            .iter()
            .filter_map(|c| c.value.map(|v| (c, v)))
            .filter(|(_, v)| *v > 0.0 && *v < 1.0)
            .collect();
        if rates
            .iter()
            .any(|(_, rate)| (100.0 * (1.0 - rate) - expected).abs() < NUMERIC_TOLERANCE * 10.0)
        {
            consistent = true;
            continue;
        }
        if !(80.0..100.0).contains(&expected) {
            continue;
        }
        let implied = (100.0 - expected) / 100.0;
        if let Some((constant, rate)) = rates
            .into_iter()
            .find(|(_, rate)| (implied - rate).abs() > RATE_EPSILON)
        {
            return AstComparison::Mismatch(AstMismatch {
                expected,
                actual: 100.0 * (1.0 - rate),
                description: format!(
                    "Rate mismatch: test expects {} ({}% rate) but {} = {} implies {}",
                    format_number(expected),
                    format_number(implied * 100.0),
                    constant.name,
                    constant.raw,
                    format_number(100.0 * (1.0 - rate)),
                ),
                test_line: assertion.line,
                code_line: constant.line,
            });
        }
    }

    if consistent {
        AstComparison::Consistent
    } else {
        AstComparison::NoComparison
    }
}

/// `90` rather than `90.0`, and no float noise like `85.00000000000001`.
pub fn format_number(value: f64) -> String {
    let rounded = (value * 10_000.0).round() / 10_000.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded}")
    }
}
