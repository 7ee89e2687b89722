//! Verdicts that do not need divergence detection: failures caused by the
//! environment or by timing, and pairs too thin to judge.

use super::recommendation::build_recommendation;
use crate::core::{RecommendedAction, TestSourcePair, Verdict, VerdictType};
use once_cell::sync::Lazy;
use regex::Regex;

const SCREENED_CONFIDENCE: f64 = 0.6;
const INSUFFICIENT_DATA_CONFIDENCE: f64 = 0.3;

static ENVIRONMENT_ERROR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)command not found|ModuleNotFoundError|Cannot find module|ECONNREFUSED|no such file or directory|permission denied|OutOfMemory",
    )
    .unwrap()
});

static TIMING_ERROR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)timed out|\btimeout\b|deadline exceeded|\bflaky\b|\brace\b").unwrap());

/// Classify a real failure that says nothing about the code under test.
pub fn screen_failure(message: &str, pair: &TestSourcePair) -> Option<Verdict> {
    let (verdict_type, action, reason) = if let Some(m) = ENVIRONMENT_ERROR.find(message) {
        (
            VerdictType::EnvironmentIssue,
            RecommendedAction::CheckEnvironment,
            format!("The failure comes from the environment ({})", m.as_str()),
        )
    } else if let Some(m) = TIMING_ERROR.find(message) {
        (
            VerdictType::FlakyTest,
            RecommendedAction::AddRetry,
            format!("The failure looks timing-dependent ({})", m.as_str()),
        )
    } else {
        return None;
    };

    Some(Verdict {
        verdict_type,
        confidence: SCREENED_CONFIDENCE,
        reason,
        explanation: first_line(message),
        recommendation: build_recommendation(verdict_type, action, pair, None),
        is_regression: false,
    })
}

/// A pair with an empty test or method body cannot be judged.
pub fn insufficient_data(pair: &TestSourcePair) -> Option<Verdict> {
    if !pair.test.body.trim().is_empty() && !pair.source.body.trim().is_empty() {
        return None;
    }
    Some(Verdict {
        verdict_type: VerdictType::EnvironmentIssue,
        confidence: INSUFFICIENT_DATA_CONFIDENCE,
        reason: "Insufficient data to compare test and code".to_string(),
        explanation: format!(
            "{} or {} has an empty body",
            pair.test.name, pair.source.name
        ),
        recommendation: build_recommendation(
            VerdictType::EnvironmentIssue,
            RecommendedAction::Investigate,
            pair,
            None,
        ),
        is_regression: false,
    })
}

/// Stand-in verdict for a pair whose analysis never finished.
pub fn analysis_failed(pair: &TestSourcePair) -> Verdict {
    Verdict {
        verdict_type: VerdictType::EnvironmentIssue,
        confidence: INSUFFICIENT_DATA_CONFIDENCE,
        reason: "Analysis did not complete".to_string(),
        explanation: format!("analysis of {} against {} aborted", pair.test.name, pair.source.name),
        recommendation: build_recommendation(
            VerdictType::EnvironmentIssue,
            RecommendedAction::Investigate,
            pair,
            None,
        ),
        is_regression: false,
    }
}

fn first_line(message: &str) -> String {
    message.lines().next().unwrap_or("").trim().to_string()
}
