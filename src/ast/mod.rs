//! Higher-fidelity value extraction for the static-analysis stage.
//!
//! TypeScript/JavaScript and Python are parsed with tree-sitter; every other
//! language, and any file tree-sitter cannot make sense of, goes through the
//! line-oriented fallback. Both paths produce the same
//! [`AstAnalysisResult`], so [`compare`] never needs to know which one ran.

pub mod compare;
pub mod fallback;
pub mod javascript;
pub mod python;

pub use compare::{compare, AstComparison, AstMismatch};

use crate::core::Language;
use tracing::debug;

/// An assertion whose expected side was located.
#[derive(Clone, Debug, PartialEq)]
pub struct AstAssertion {
    /// Matcher or assertion function, e.g. `toBe`, `assertEquals`, `==`.
    pub matcher: String,
    pub expected: Option<String>,
    pub expected_value: Option<f64>,
    pub line: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AstReturn {
    pub raw: String,
    /// Set when the returned expression is a literal or pure arithmetic.
    pub value: Option<f64>,
    pub line: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AstConstant {
    pub name: String,
    pub raw: String,
    pub value: Option<f64>,
    pub is_const: bool,
    pub line: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AstCalculation {
    pub expression: String,
    pub operator: String,
    /// Free identifiers referenced by the expression.
    pub variables: Vec<String>,
    pub line: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AstAnalysisResult {
    pub assertions: Vec<AstAssertion>,
    pub returns: Vec<AstReturn>,
    pub constants: Vec<AstConstant>,
    pub calculations: Vec<AstCalculation>,
}

impl AstAnalysisResult {
    pub fn is_empty(&self) -> bool {
        self.assertions.is_empty()
            && self.returns.is_empty()
            && self.constants.is_empty()
            && self.calculations.is_empty()
    }
}

/// Analyze `text`, whose first line is file line `first_line`.
pub fn analyze(text: &str, language: Language, first_line: usize) -> AstAnalysisResult {
    let parsed = match language {
        Language::TypeScript | Language::JavaScript => javascript::analyze(text, language, first_line),
        Language::Python => python::analyze(text, first_line),
        _ => None,
    };
    parsed.unwrap_or_else(|| {
        debug!("Using line-oriented analysis for {} snippet", language);
        fallback::analyze(text, language, first_line)
    })
}

/// Compare the test body against the source method, taking constants from
/// the whole source file when it is available.
pub fn compare_pair(
    test_body: &str,
    test_first_line: usize,
    source_body: &str,
    source_first_line: usize,
    source_file: Option<&str>,
    language: Language,
) -> AstComparison {
    let test = analyze(test_body, language, test_first_line);
    let mut source = analyze(source_body, language, source_first_line);

    if let Some(file) = source_file {
        let file_constants = analyze(file, language, 1).constants;
        for constant in file_constants {
            if !source.constants.iter().any(|c| c.name == constant.name) {
                source.constants.push(constant);
            }
        }
    }
    compare(&test, &source)
}

/// Shorthand used by both tree-sitter walkers.
pub(crate) fn numeric_value(text: &str) -> Option<f64> {
    crate::detection::expression::evaluate(text)
        .or_else(|| crate::detection::expression::parse_numeric(text).filter(|_| is_plain_literal(text)))
}

fn is_plain_literal(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty()
        && text.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '.')
        && !text.contains(char::is_whitespace)
}
