//! Test-to-source pairing.
//!
//! A greedy matcher: for each test the first method that satisfies a rule
//! wins, and rules are tried strongest first across the whole method pool.
//! Tests that match nothing are dropped.

use crate::core::{CorrelationType, SourceMethod, TestCase, TestSourcePair};
use tracing::debug;

const EXACT_NAME_CONFIDENCE: f64 = 0.9;
const PARTIAL_NAME_CONFIDENCE: f64 = 0.7;
const CALL_SITE_CONFIDENCE: f64 = 0.8;

/// Strip test-ish prefixes and suffixes and case-fold.
///
/// `test_add`, `testAdd`, `TestAdd`, `shouldAdd`, `should_add`, `add_test`
/// and `AddTest` all normalise to `add`.
pub fn normalize_test_name(name: &str) -> String {
    let mut trimmed = name.trim();

    for prefix in ["test_", "should_", "should "] {
        if let Some(rest) = strip_prefix_ignore_case(trimmed, prefix) {
            trimmed = rest;
        }
    }
    for prefix in ["test", "Test", "should"] {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            if rest.starts_with(|c: char| c.is_ascii_uppercase() || c == '_') {
                trimmed = rest.trim_start_matches('_');
            }
        }
    }
    for suffix in ["_test", "Test", "_should"] {
        if let Some(rest) = trimmed.strip_suffix(suffix) {
            if !rest.is_empty() {
                trimmed = rest;
            }
        }
    }
    trimmed.to_lowercase()
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &text[prefix.len()..])
}

/// Whether `body` contains `name(` as a call, not as the tail of a longer
/// identifier.
fn has_call_site(body: &str, name: &str) -> bool {
    let needle = format!("{name}(");
    body.match_indices(&needle).any(|(at, _)| {
        body[..at]
            .chars()
            .next_back()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_'))
    })
}

fn match_test(test: &TestCase, methods: &[SourceMethod]) -> Option<(usize, f64, CorrelationType)> {
    let normalized = normalize_test_name(&test.name);
    if !normalized.is_empty() {
        let folded: Vec<String> = methods.iter().map(|m| m.name.to_lowercase()).collect();

        if let Some(idx) = folded.iter().position(|name| *name == normalized) {
            return Some((idx, EXACT_NAME_CONFIDENCE, CorrelationType::NamingConvention));
        }
        if let Some(idx) = folded.iter().position(|name| {
            !name.is_empty() && (normalized.contains(name.as_str()) || name.contains(&normalized))
        }) {
            return Some((idx, PARTIAL_NAME_CONFIDENCE, CorrelationType::NamingConvention));
        }
    }

    methods
        .iter()
        .position(|m| !m.name.is_empty() && has_call_site(&test.body, &m.name))
        .map(|idx| (idx, CALL_SITE_CONFIDENCE, CorrelationType::CallGraph))
}

/// Pair every test with the method it most plausibly exercises.
pub fn correlate(tests: &[TestCase], methods: &[SourceMethod]) -> Vec<TestSourcePair> {
    tests
        .iter()
        .filter_map(|test| {
            let Some((idx, confidence, correlation_type)) = match_test(test, methods) else {
                debug!("No source method correlates with test {}", test.name);
                return None;
            };
            Some(TestSourcePair {
                test: test.clone(),
                source: methods[idx].clone(),
                confidence,
                correlation_type,
            })
        })
        .collect()
}
