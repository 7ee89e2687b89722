//! Static expectation and behaviour summaries, used when no AI bridge is
//! available or when it fails.

use crate::core::{AssertionType, CodeBehavior, TestCase, TestExpectation, SourceMethod};
use crate::parsers::common::is_comment_line;
use once_cell::sync::Lazy;
use regex::Regex;

static RETURN_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*return\b\s*(.*?)\s*;?\s*$").unwrap());

static ERROR_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:throw\s+new\s+\w+|throw\b|raise\b|panic!|Err\s*\(|errors\.New|fmt\.Errorf)").unwrap()
});

static SIDE_EFFECT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:this\.|self\.)\w+(?:\.\w+)*\s*(?:[+\-*/]?=)[^=]").unwrap()
});

pub fn expectation_from_assertions(test: &TestCase) -> TestExpectation {
    let mut expected_outputs = Vec::new();
    let mut expected_exceptions = Vec::new();
    let mut expected_inputs = Vec::new();

    for assertion in &test.assertions {
        match assertion.assertion_type {
            AssertionType::Throws => {
                if let Some(exception) = &assertion.expected {
                    expected_exceptions.push(exception.clone());
                }
            }
            _ => {
                if let Some(expected) = &assertion.expected {
                    expected_outputs.push(expected.clone());
                }
            }
        }
        if let Some(actual) = &assertion.actual {
            expected_inputs.push(actual.clone());
        }
    }

    let description = match (test.assertions.len(), expected_exceptions.is_empty()) {
        (0, _) => format!("{} makes no assertions", test.name),
        (n, true) => format!("{} checks {} value(s)", test.name, n),
        (n, false) => format!(
            "{} checks {} value(s) and expects {}",
            test.name,
            n,
            expected_exceptions.join(", ")
        ),
    };

    TestExpectation {
        description,
        expected_inputs,
        expected_outputs,
        expected_exceptions,
    }
}

pub fn behavior_from_body(method: &SourceMethod) -> CodeBehavior {
    let code_lines = method
        .body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_comment_line(line));

    let mut returns = Vec::new();
    let mut error_conditions = Vec::new();
    let mut side_effects = Vec::new();
    for line in code_lines {
        if let Some(caps) = RETURN_LINE.captures(line) {
            let value = caps.get(1).map_or("", |m| m.as_str());
            if !value.is_empty() {
                returns.push(value.to_string());
            }
        }
        if ERROR_LINE.is_match(line) {
            error_conditions.push(line.trim_end_matches(';').to_string());
        }
        if SIDE_EFFECT_LINE.is_match(line) {
            side_effects.push(line.trim_end_matches(';').to_string());
        }
    }

    let return_behavior = if returns.is_empty() {
        "No explicit return".to_string()
    } else {
        format!("Returns {}", returns.join(" or "))
    };
    let description = match &method.class_name {
        Some(class) => format!("{}.{}: {}", class, method.name, return_behavior),
        None => format!("{}: {}", method.name, return_behavior),
    };

    CodeBehavior {
        description,
        side_effects,
        return_behavior,
        error_conditions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::sample_pair;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_expectation_splits_outputs_and_exceptions() {
        let pair = sample_pair(
            indoc! {"
                assertEquals(90, calc.calculate(100));
                assertThrows(IllegalArgumentException.class, () -> calc.calculate(-1));
            "},
            "return price * 0.85;",
        );
        let expectation = expectation_from_assertions(&pair.test);
        assert_eq!(expectation.expected_outputs, vec!["90".to_string()]);
        assert_eq!(
            expectation.expected_exceptions,
            vec!["IllegalArgumentException".to_string()]
        );
        assert!(expectation.description.contains("expects IllegalArgumentException"));
    }

    #[test]
    fn test_behavior_collects_returns_and_errors() {
        let pair = sample_pair(
            "assertEquals(90, calc.calculate(100));",
            indoc! {"
                public double calculate(double price) {
                    // guard
                    if (price < 0) throw new IllegalArgumentException(\"negative\");
                    this.calls += 1;
                    return price * 0.85;
                }
            "},
        );
        let behavior = behavior_from_body(&pair.source);
        assert_eq!(behavior.return_behavior, "Returns price * 0.85");
        assert_eq!(behavior.error_conditions.len(), 1);
        assert_eq!(behavior.side_effects, vec!["this.calls += 1".to_string()]);
        assert!(behavior.description.starts_with("Calc.calculate"));
    }

    #[test]
    fn test_behavior_without_return() {
        let pair = sample_pair("", "void log() { System.out.println(1); }");
        assert_eq!(behavior_from_body(&pair.source).return_behavior, "No explicit return");
    }
}
