//! Best-effort parsing of free-text AI replies.
//!
//! Replies are expected to contain `SECTION:` headers. Anything may be
//! missing; missing sections come back empty rather than as errors.

use super::FixSuggestion;
use crate::core::{CodeBehavior, TestExpectation};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static SECTION_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?im)^\s*(?:\*\*|#+\s*)?(DESCRIPTION|INPUTS|OUTPUTS|EXCEPTIONS|SIDE EFFECTS|RETURNS|ERRORS|SUGGESTION|EXPLANATION)(?:\*\*)?\s*:(?:\*\*)?[ \t]*",
    )
    .unwrap()
});

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[\w+-]*[ \t]*\n(.*?)```").unwrap());

/// Split a reply into its named sections, keyed upper-case.
pub fn sections(reply: &str) -> HashMap<String, String> {
    let headers: Vec<(usize, usize, String)> = SECTION_HEADER
        .captures_iter(reply)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some((whole.start(), whole.end(), caps[1].to_uppercase()))
        })
        .collect();

    let mut found = HashMap::new();
    for (i, (_, body_start, name)) in headers.iter().enumerate() {
        let body_end = headers.get(i + 1).map_or(reply.len(), |next| next.0);
        found
            .entry(name.clone())
            .or_insert_with(|| reply[*body_start..body_end].trim().to_string());
    }
    found
}

/// Bullet or line items of a section; "none" style answers are empty.
pub fn list_items(section: &str) -> Vec<String> {
    section
        .lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(['-', '*', '•'])
                .trim()
                .to_string()
        })
        .filter(|item| !item.is_empty() && !is_none_answer(item))
        .collect()
}

fn is_none_answer(item: &str) -> bool {
    matches!(
        item.to_ascii_lowercase().trim_end_matches('.'),
        "none" | "n/a" | "nothing" | "no exceptions" | "no side effects" | "no errors"
    )
}

fn section_text(found: &HashMap<String, String>, name: &str) -> String {
    found.get(name).cloned().unwrap_or_default()
}

fn section_list(found: &HashMap<String, String>, name: &str) -> Vec<String> {
    found.get(name).map(|s| list_items(s)).unwrap_or_default()
}

/// Without a DESCRIPTION header the first paragraph stands in for one.
fn description(found: &HashMap<String, String>, reply: &str) -> String {
    found.get("DESCRIPTION").cloned().unwrap_or_else(|| {
        reply
            .split("\n\n")
            .map(str::trim)
            .find(|p| !p.is_empty())
            .unwrap_or_default()
            .to_string()
    })
}

pub fn parse_test_expectation(reply: &str) -> TestExpectation {
    let found = sections(reply);
    TestExpectation {
        description: description(&found, reply),
        expected_inputs: section_list(&found, "INPUTS"),
        expected_outputs: section_list(&found, "OUTPUTS"),
        expected_exceptions: section_list(&found, "EXCEPTIONS"),
    }
}

pub fn parse_code_behavior(reply: &str) -> CodeBehavior {
    let found = sections(reply);
    CodeBehavior {
        description: description(&found, reply),
        side_effects: section_list(&found, "SIDE EFFECTS"),
        return_behavior: section_text(&found, "RETURNS"),
        error_conditions: section_list(&found, "ERRORS"),
    }
}

/// First fenced code block, if any.
pub fn extract_code_block(text: &str) -> Option<String> {
    CODE_FENCE
        .captures(text)
        .map(|caps| caps[1].trim_end().to_string())
        .filter(|code| !code.trim().is_empty())
}

/// The suggestion is the fenced block when there is one, otherwise the
/// SUGGESTION section text.
pub fn parse_fix_suggestion(reply: &str) -> Option<FixSuggestion> {
    let found = sections(reply);
    let suggestion_text = section_text(&found, "SUGGESTION");
    let suggestion = extract_code_block(&suggestion_text)
        .or_else(|| extract_code_block(reply))
        .or_else(|| (!suggestion_text.is_empty()).then(|| suggestion_text.clone()))?;
    Some(FixSuggestion {
        suggestion,
        explanation: section_text(&found, "EXPLANATION"),
    })
}
