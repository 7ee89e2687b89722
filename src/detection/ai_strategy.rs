//! Stage 2: ask the AI bridge whether the test and method disagree.

use super::{DetectionInput, DetectionStrategy};
use crate::ai::AiBridge;
use crate::core::{AssertionType, DetectionStage, Divergence, DivergenceResult, DivergenceType};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

const EXTRACTED_CONFIDENCE: f64 = 0.85;
const PHRASE_ONLY_CONFIDENCE: f64 = 0.80;

static DIVERGENCE_PHRASES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:mismatch|does not match|doesn't match|test\b.*\bfails?|will fail|diverges?|divergence|inconsistent|incorrect|discrepancy)\b",
    )
    .unwrap()
});

static NEGATIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:no (?:divergence|mismatch|discrepancy)|does not diverge|doesn't diverge|matches the (?:implementation|code)|(?:is|are) consistent with|no issues?)\b",
    )
    .unwrap()
});

static EXPECTS_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bexpects?\s+(?:a\s+|an\s+|the\s+)?(?:value\s+(?:of\s+)?)?`?(-?\d+(?:\.\d+)?|\w+)`?").unwrap()
});

static RETURNS_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:returns?|produces?|computes?|yields?)\s+(?:a\s+|an\s+|the\s+)?(?:value\s+(?:of\s+)?)?`?(-?\d+(?:\.\d+)?|\w+)`?").unwrap()
});

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?\d+(?:\.\d+)?").unwrap());

static EXCEPTION_TALK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:exception|throws?|thrown|raises?|error)\b").unwrap());

pub struct AiStrategy {
    bridge: Arc<dyn AiBridge>,
}

impl AiStrategy {
    pub fn new(bridge: Arc<dyn AiBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl DetectionStrategy for AiStrategy {
    fn stage(&self) -> DetectionStage {
        DetectionStage::AiComparison
    }

    async fn detect(&self, input: &DetectionInput<'_>) -> Option<DivergenceResult> {
        if !self.bridge.check_availability().await {
            debug!("AI bridge unavailable, skipping AI comparison");
            return None;
        }
        let pair = input.pair;
        let reply = match self
            .bridge
            .explain_divergence(&pair.test.body, &pair.source.body)
            .await
        {
            Ok(reply) => reply,
            Err(err) => {
                debug!(test = %pair.test.name, "AI comparison failed: {}", err);
                return None;
            }
        };

        let expects_exception = pair
            .test
            .assertions
            .iter()
            .any(|a| a.assertion_type == AssertionType::Throws);
        let test_line = pair
            .test
            .assertions
            .first()
            .map(|a| a.line_number)
            .unwrap_or(pair.test.line_number);

        match interpret_reply(&reply, expects_exception) {
            Some(found) => Some(DivergenceResult::found(
                Divergence {
                    divergence_type: found.divergence_type,
                    description: found.summary,
                    test_line,
                    code_line: pair.source.line_number,
                    expected: found.expected,
                    actual: found.actual,
                },
                found.confidence,
                "AI comparison reported a divergence",
                DetectionStage::AiComparison,
            )),
            None => {
                debug!(
                    test = %pair.test.name,
                    confidence = PHRASE_ONLY_CONFIDENCE,
                    "AI comparison found no divergence"
                );
                None
            }
        }
    }
}

/// What the reply claims, when it claims a divergence at all.
#[derive(Clone, Debug, PartialEq)]
pub struct AiFinding {
    pub divergence_type: DivergenceType,
    pub expected: String,
    pub actual: String,
    pub summary: String,
    pub confidence: f64,
}

pub fn indicates_divergence(reply: &str) -> bool {
    DIVERGENCE_PHRASES.is_match(reply) && !NEGATIONS.is_match(reply)
}

/// Scan a free-text reply for a divergence claim and, when possible, the
/// value pair behind it.
pub fn interpret_reply(reply: &str, test_expects_exception: bool) -> Option<AiFinding> {
    if !indicates_divergence(reply) {
        return None;
    }

    let divergence_type = if test_expects_exception && EXCEPTION_TALK.is_match(reply) {
        DivergenceType::ExceptionMismatch
    } else {
        DivergenceType::ReturnValueMismatch
    };

    let expected = extract_value(&EXPECTS_VALUE, reply);
    let actual = extract_value(&RETURNS_VALUE, reply);
    let confidence = if expected.is_some() && actual.is_some() {
        EXTRACTED_CONFIDENCE
    } else {
        PHRASE_ONLY_CONFIDENCE
    };

    Some(AiFinding {
        divergence_type,
        expected: expected.unwrap_or_else(|| "see AI explanation".to_string()),
        actual: actual.unwrap_or_else(|| "see AI explanation".to_string()),
        summary: summarize(reply),
        confidence,
    })
}

/// Prefer a numeric capture; fall back to the first word-like one.
fn extract_value(pattern: &Regex, reply: &str) -> Option<String> {
    let captures: Vec<String> = pattern
        .captures_iter(reply)
        .map(|caps| caps[1].to_string())
        .collect();
    captures
        .iter()
        .find(|c| NUMBER.is_match(c))
        .or_else(|| captures.first())
        .cloned()
}

fn summarize(reply: &str) -> String {
    let sentence = reply
        .split_terminator(['.', '\n'])
        .map(str::trim)
        .find(|s| DIVERGENCE_PHRASES.is_match(s))
        .unwrap_or_else(|| reply.trim());
    let mut summary: String = sentence.chars().take(200).collect();
    if sentence.chars().count() > 200 {
        summary.push_str("...");
    }
    summary
}
