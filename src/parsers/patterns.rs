//! Table-driven assertion extraction.
//!
//! Every language parser owns a static table of [`AssertionPattern`] rows,
//! one per assertion idiom. [`scan_assertions`] runs the whole table over a
//! test body line by line; each row that matches a line yields one
//! [`Assertion`], so a line written in two idioms produces two records.

use super::common::{balanced_args, is_comment_line, split_top_level};
use crate::core::{Assertion, AssertionType};
use regex::Regex;

/// Where one side of an assertion comes from.
#[derive(Debug, Clone, Copy)]
pub enum Arg {
    /// Positional argument of the call whose `(` ends the match.
    Index(usize),
    /// Regex capture group.
    Group(usize),
    /// Argument of the subject call that opens the chain, e.g. `expect(x)`.
    Subject,
    /// Constant implied by the idiom, e.g. `true` for `assertTrue`.
    Fixed(&'static str),
    None,
}

pub struct AssertionPattern {
    pub regex: Regex,
    pub kind: AssertionType,
    pub expected: Arg,
    pub actual: Arg,
    /// Row is skipped when the line contains any of these substrings.
    pub skip_if: &'static [&'static str],
}

impl AssertionPattern {
    pub fn new(pattern: &str, kind: AssertionType, expected: Arg, actual: Arg) -> Self {
        Self {
            regex: Regex::new(pattern).expect("assertion pattern must compile"),
            kind,
            expected,
            actual,
            skip_if: &[],
        }
    }

    pub fn skip_if(mut self, needles: &'static [&'static str]) -> Self {
        self.skip_if = needles;
        self
    }

    fn apply(&self, line: &str, line_number: usize) -> Option<Assertion> {
        if self.skip_if.iter().any(|needle| line.contains(needle)) {
            return None;
        }
        let caps = self.regex.captures(line)?;
        let whole = caps.get(0)?;

        let call_args: Vec<String> = whole
            .end()
            .checked_sub(1)
            .and_then(|open| balanced_args(line, open))
            .map(split_top_level)
            .unwrap_or_default();

        let subject = || -> Option<String> {
            let open = whole.start() + line[whole.start()..].find('(')?;
            balanced_args(line, open).map(|s| s.trim().to_string())
        };

        let resolve = |arg: Arg| -> Option<String> {
            let value = match arg {
                Arg::Index(i) => call_args.get(i).cloned(),
                Arg::Group(g) => caps.get(g).map(|m| m.as_str().to_string()),
                Arg::Subject => subject(),
                Arg::Fixed(v) => Some(v.to_string()),
                Arg::None => None,
            }?;
            let value = clean_value(&value);
            (!value.is_empty()).then_some(value)
        };

        Some(Assertion {
            assertion_type: self.kind,
            expected: resolve(self.expected),
            actual: resolve(self.actual),
            line_number,
            raw: line.trim().to_string(),
        })
    }
}

/// Trim whitespace, trailing statement punctuation and `.class` suffixes.
fn clean_value(value: &str) -> String {
    let trimmed = value.trim().trim_end_matches([';', ',']).trim();
    trimmed
        .strip_suffix(".class")
        .or_else(|| trimmed.strip_suffix("::class"))
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

/// Run every row of `table` over `body`. `first_line` is the 1-indexed file
/// line of the body's first line.
pub fn scan_assertions(body: &str, first_line: usize, table: &[AssertionPattern]) -> Vec<Assertion> {
    body.lines()
        .enumerate()
        .filter(|(_, line)| !is_comment_line(line.trim()))
        .flat_map(|(offset, line)| {
            table
                .iter()
                .filter_map(move |row| row.apply(line, first_line + offset))
        })
        .collect()
}
