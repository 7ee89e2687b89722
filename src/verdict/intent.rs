//! Commit message classification.
//!
//! A message is "intentional" unless it uses fix vocabulary. Messages that
//! match neither vocabulary count as intentional.

use once_cell::sync::Lazy;
use regex::Regex;

static CONVENTIONAL_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:feat|fix|refactor|update|add|implement|improve|enhance|change|modify|perf|style|docs|test|chore|build|ci)(?:\([^)]*\))?!?:\s",
    )
    .unwrap()
});

static TICKET_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z]{2,}-\d+\b").unwrap());

static FIX_VOCABULARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:fix(?:e[sd]|ing)?|bugs?|typo|oops|revert(?:s|ed)?|hotfix|patch(?:es|ed)?|bugfix|workaround)\b")
        .unwrap()
});

/// True when the message reads like an accidental-break repair.
pub fn is_fix_message(message: &str) -> bool {
    FIX_VOCABULARY.is_match(message)
}

pub fn is_intentional_change(message: &str) -> bool {
    !is_fix_message(message)
}

/// Conventional-commit or ticket-ID shaped.
pub fn is_clear_message(message: &str) -> bool {
    CONVENTIONAL_PREFIX.is_match(message) || TICKET_ID.is_match(message)
}
