//! Line-oriented extraction for languages without a grammar here.

use super::{numeric_value, AstAnalysisResult, AstAssertion, AstCalculation, AstConstant, AstReturn};
use crate::core::{AssertionType, Language, TestFramework};
use crate::parsers::common::{is_comment_line, strip_literals};
use crate::parsers::get_parser;
use once_cell::sync::Lazy;
use regex::Regex;

static RETURN_STMT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*return\s+(.+?)\s*;?\s*$").unwrap());

static DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*((?:(?:public|private|protected|internal|static|final|const|readonly|let|var|val|pub(?:\(crate\))?)\s+)*)(?:[\w<>\[\],.?]+\s+)?([A-Za-z_]\w*)\s*(?::\s*[\w<>\[\]&]+\s*)?:?=\s*([^=;][^;]*?)\s*;?\s*$",
    )
    .unwrap()
});

static BINARY_OP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z_][\w.]*|\d+(?:\.\d+)?|\))\s*([-+*/%])\s*([A-Za-z_(]|\d)").unwrap()
});

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Za-z_]\w*\b").unwrap());

const CONST_MARKERS: &[&str] = &["final", "const", "readonly"];

const KEYWORDS: &[&str] = &[
    "return", "new", "this", "self", "true", "false", "null", "nil", "None", "var", "let", "const",
];

pub fn analyze(text: &str, language: Language, first_line: usize) -> AstAnalysisResult {
    let mut result = AstAnalysisResult {
        assertions: assertions(text, language, first_line),
        ..Default::default()
    };

    for (offset, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_comment_line(trimmed) {
            continue;
        }
        let cleaned = strip_literals(line);
        let line_no = first_line + offset;

        if let Some(caps) = RETURN_STMT.captures(&cleaned) {
            let raw = caps[1].trim().to_string();
            result.returns.push(AstReturn {
                value: numeric_value(&raw),
                raw,
                line: line_no,
            });
        } else if let Some(caps) = DECLARATION.captures(&cleaned) {
            let modifiers = &caps[1];
            let name = caps[2].to_string();
            let raw = caps[3].trim().to_string();
            let is_const = modifiers
                .split_whitespace()
                .any(|m| CONST_MARKERS.contains(&m))
                || is_screaming_case(&name);
            result.constants.push(AstConstant {
                value: numeric_value(&raw),
                name,
                raw,
                is_const,
                line: line_no,
            });
        }

        if let Some(caps) = BINARY_OP.captures(&cleaned) {
            let expression = RETURN_STMT
                .captures(&cleaned)
                .map(|c| c[1].to_string())
                .unwrap_or_else(|| cleaned.trim().trim_end_matches(';').to_string());
            result.calculations.push(AstCalculation {
                variables: free_identifiers(&expression),
                operator: caps[2].to_string(),
                expression,
                line: line_no,
            });
        }
    }
    result
}

/// Reuse the language parser's assertion table; only equality assertions
/// carry an expected value worth comparing.
fn assertions(text: &str, language: Language, first_line: usize) -> Vec<AstAssertion> {
    let parser = get_parser(language);
    let framework = match parser.detect_framework(text) {
        TestFramework::Unknown => default_framework(language),
        framework => framework,
    };
    parser
        .extract_assertions(text, first_line, framework)
        .into_iter()
        .filter(|a| a.assertion_type == AssertionType::Equals)
        .map(|a| AstAssertion {
            matcher: a.raw.split('(').next().unwrap_or_default().trim().to_string(),
            expected_value: a.expected.as_deref().and_then(crate::detection::expression::parse_numeric),
            expected: a.expected,
            line: a.line_number,
        })
        .collect()
}

fn default_framework(language: Language) -> TestFramework {
    match language {
        Language::Java => TestFramework::Junit5,
        Language::TypeScript | Language::JavaScript => TestFramework::Jest,
        Language::Python => TestFramework::Pytest,
        Language::Go => TestFramework::GoTest,
        Language::Rust => TestFramework::RustTest,
        Language::CSharp => TestFramework::Nunit,
    }
}

fn is_screaming_case(name: &str) -> bool {
    name.len() > 1
        && name.chars().any(|c| c.is_ascii_uppercase())
        && name.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

fn free_identifiers(expression: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for m in IDENTIFIER.find_iter(expression) {
        let name = m.as_str();
        let is_member = expression[..m.start()].ends_with('.');
        if !is_member && !KEYWORDS.contains(&name) && !seen.iter().any(|s: &String| s == name) {
            seen.push(name.to_string());
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_java_constants_returns_and_calculations() {
        let source = indoc! {r#"
            private static final double PREMIUM_RATE = 0.15;
            private int retries = 3;
            public double discounted(double price) {
                return price * (1 - PREMIUM_RATE);
            }
            public int fixed() {
                return 42;
            }
        "#};
        let result = analyze(source, Language::Java, 1);

        assert_eq!(result.constants.len(), 2);
        assert_eq!(result.constants[0].name, "PREMIUM_RATE");
        assert_eq!(result.constants[0].value, Some(0.15));
        assert!(result.constants[0].is_const);
        assert_eq!(result.constants[1].name, "retries");
        assert!(!result.constants[1].is_const);

        assert_eq!(result.returns.len(), 2);
        assert_eq!(result.returns[0].value, None);
        assert_eq!(result.returns[1].value, Some(42.0));
        assert_eq!(result.returns[1].line, 7);

        assert_eq!(result.calculations.len(), 1);
        assert_eq!(result.calculations[0].operator, "*");
        assert_eq!(
            result.calculations[0].variables,
            vec!["price".to_string(), "PREMIUM_RATE".to_string()]
        );
    }

    #[test]
    fn test_java_assertions_keep_expected_value() {
        let body = "assertEquals(90.0, service.discounted(100.0), 0.01);\nassertTrue(ok);";
        let result = analyze(body, Language::Java, 20);
        assert_eq!(result.assertions.len(), 1);
        assert_eq!(result.assertions[0].expected_value, Some(90.0));
        assert_eq!(result.assertions[0].line, 20);
    }

    #[test]
    fn test_go_short_declaration() {
        let result = analyze("rate := 0.2\nreturn total * rate", Language::Go, 1);
        assert_eq!(result.constants[0].name, "rate");
        assert_eq!(result.constants[0].value, Some(0.2));
        assert_eq!(result.calculations[0].variables, vec!["total", "rate"]);
    }
}
