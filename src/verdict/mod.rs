//! Verdict engine: one [`AnalysisResult`] in, one [`Verdict`] out.
//!
//! The decision depends on whether a divergence was found and, if so, on
//! which side changed last:
//!
//! | divergence | source newer | source commit | verdict |
//! |------------|--------------|---------------|---------|
//! | none       | -            | -             | PASSED (0.99) |
//! | yes        | yes          | intentional   | OUTDATED_TEST |
//! | yes        | yes          | fix           | CODE_BUG, regression |
//! | yes        | no / unknown | any           | CODE_BUG |
//!
//! A fix-vocabulary source commit marks any CODE_BUG as a regression.

pub mod environment;
pub mod intent;
pub mod recommendation;

use crate::ai::{AiBridge, FixRequest};
use crate::core::{
    AnalysisResult, CommitInfo, DivergenceType, RecommendedAction, Verdict, VerdictType,
};
use recommendation::{action_for, build_recommendation};
use std::sync::Arc;
use tracing::debug;

pub const PASSED_CONFIDENCE: f64 = 0.99;
pub const MAX_CONFIDENCE: f64 = 0.99;

const BASE_CONFIDENCE: f64 = 0.7;
const CLEAR_MESSAGE_BOOST: f64 = 0.1;
const STRONG_CORRELATION_BOOST: f64 = 0.05;
const RETURN_VALUE_BOOST: f64 = 0.1;

#[derive(Default)]
pub struct VerdictEngine {
    ai: Option<Arc<dyn AiBridge>>,
}

impl VerdictEngine {
    pub fn new(ai: Option<Arc<dyn AiBridge>>) -> Self {
        Self { ai }
    }

    /// [`classify`], then a best-effort AI fix suggestion for actionable
    /// verdicts. Bridge failures leave the recommendation without one.
    pub async fn determine(&self, result: &AnalysisResult) -> Verdict {
        let mut verdict = classify(result);
        if !matches!(
            verdict.verdict_type,
            VerdictType::OutdatedTest | VerdictType::CodeBug
        ) {
            return verdict;
        }
        let Some(bridge) = &self.ai else {
            return verdict;
        };
        if !bridge.check_availability().await {
            return verdict;
        }

        let request = FixRequest {
            test_code: result.pair.test.body.clone(),
            source_code: result.pair.source.body.clone(),
            error_message: result
                .divergence
                .divergence
                .as_ref()
                .map(|d| d.description.clone())
                .unwrap_or_default(),
            file_path: match verdict.recommendation.action {
                RecommendedAction::UpdateTest => result.pair.test.file_path.clone(),
                _ => result.pair.source.file_path.clone(),
            },
        };
        match bridge.suggest_fix(&request).await {
            Ok(fix) => verdict.recommendation.suggested_fix = Some(fix.suggestion),
            Err(err) => debug!(test = %result.pair.test.name, "No AI fix suggestion: {}", err),
        }
        verdict
    }
}

/// The verdict without any AI enrichment.
pub fn classify(result: &AnalysisResult) -> Verdict {
    let pair = &result.pair;
    let Some(divergence) = result
        .divergence
        .divergence
        .as_ref()
        .filter(|_| result.divergence.has_divergence)
    else {
        return Verdict {
            verdict_type: VerdictType::Passed,
            confidence: PASSED_CONFIDENCE,
            reason: "Test expectations match the code".to_string(),
            explanation: result.divergence.details.clone(),
            recommendation: build_recommendation(
                VerdictType::Passed,
                RecommendedAction::NoAction,
                pair,
                None,
            ),
            is_regression: false,
        };
    };

    let git = &result.git_context;
    let source_commit = git.source_commit.as_ref();
    let source_newer = match (source_commit, git.test_commit.as_ref()) {
        (Some(source), Some(test)) => source.date > test.date,
        _ => false,
    };
    let fix_commit = source_commit.is_some_and(|c| intent::is_fix_message(&c.message));

    let verdict_type = if source_newer && !fix_commit {
        VerdictType::OutdatedTest
    } else {
        VerdictType::CodeBug
    };
    let is_regression = verdict_type == VerdictType::CodeBug && fix_commit;

    let mut confidence = BASE_CONFIDENCE;
    if source_commit.is_some_and(|c| intent::is_clear_message(c.summary())) {
        confidence += CLEAR_MESSAGE_BOOST;
    }
    if pair.correlation_type.is_strong() {
        confidence += STRONG_CORRELATION_BOOST;
    }
    if divergence.divergence_type == DivergenceType::ReturnValueMismatch {
        confidence += RETURN_VALUE_BOOST;
    }
    let confidence = confidence.min(MAX_CONFIDENCE);

    let reason = match (verdict_type, source_commit) {
        (VerdictType::OutdatedTest, Some(commit)) => format!(
            "The code was changed on purpose after the test was written ({})",
            commit.summary()
        ),
        (_, Some(commit)) if is_regression => format!(
            "The code diverges from the test and its last change looks like a faulty fix ({})",
            commit.summary()
        ),
        _ => "The code does not do what the test expects".to_string(),
    };

    let explanation = format!(
        "{}. Expected {}, got {}. {}",
        divergence.description.trim_end_matches('.'),
        divergence.expected,
        divergence.actual,
        timeline(source_commit, git.test_commit.as_ref())
    );

    let action = action_for(verdict_type);
    Verdict {
        verdict_type,
        confidence,
        reason,
        explanation: explanation.trim_end().to_string(),
        recommendation: build_recommendation(verdict_type, action, pair, Some(divergence)),
        is_regression,
    }
}

fn timeline(source: Option<&CommitInfo>, test: Option<&CommitInfo>) -> String {
    match (source, test) {
        (Some(source), Some(test)) => format!(
            "Source last changed {} ({}); test last changed {} ({}).",
            source.date.format("%Y-%m-%d"),
            source.summary(),
            test.date.format("%Y-%m-%d"),
            test.summary()
        ),
        (Some(source), None) => format!(
            "Source last changed {} ({}); the test has no history.",
            source.date.format("%Y-%m-%d"),
            source.summary()
        ),
        _ => "No git history available.".to_string(),
    }
}
