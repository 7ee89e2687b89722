//! Python: pytest and unittest.

use super::common::{extract_indent_body, indent_of, is_comment_line, join_signature, split_top_level};
use super::patterns::{scan_assertions, Arg, AssertionPattern};
use super::{build_test_case, LanguageParser};
use crate::core::{Assertion, AssertionType, Language, Parameter, SourceMethod, TestCase, TestFramework};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static DEF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:async\s+)?def\s+(\w+)\s*\(").unwrap());

static CLASS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*class\s+(\w+)").unwrap());

static RETURN_ANNOTATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\)\s*->\s*(.+?)\s*:\s*$").unwrap());

static PARAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\*{0,2}(\w+)\s*(?::\s*(.+?))?\s*(?:=\s*(.+))?$").unwrap()
});

static ASSERTIONS: Lazy<Vec<AssertionPattern>> = Lazy::new(|| {
    use AssertionType::*;
    vec![
        // bare assert
        AssertionPattern::new(
            r"^\s*assert\s+(.+?)\s*==\s*(.+?)(?:\s*,\s*.+)?$",
            Equals,
            Arg::Group(2),
            Arg::Group(1),
        ),
        AssertionPattern::new(
            r"^\s*assert\s+(.+?)\s*!=\s*(.+?)(?:\s*,\s*.+)?$",
            Other,
            Arg::Group(2),
            Arg::Group(1),
        ),
        AssertionPattern::new(
            r"^\s*assert\s+(.+?)\s+is\s+(True|False)\b",
            Truthy,
            Arg::Group(2),
            Arg::Group(1),
        ),
        AssertionPattern::new(
            r"^\s*assert\s+(.+?)\s+is\s+(?:not\s+)?None\b",
            Other,
            Arg::Fixed("None"),
            Arg::Group(1),
        ),
        AssertionPattern::new(
            r"^\s*assert\s+(.+?)\s+in\s+(.+?)(?:\s*,\s*.+)?$",
            Contains,
            Arg::Group(1),
            Arg::Group(2),
        )
        .skip_if(&[" not in "]),
        AssertionPattern::new(
            r"^\s*assert\s+(.+?)\s+not\s+in\s+(.+)$",
            Other,
            Arg::Group(1),
            Arg::Group(2),
        ),
        AssertionPattern::new(
            r"^\s*assert\s+(.+?)(?:\s*,\s*.+)?$",
            Truthy,
            Arg::Fixed("True"),
            Arg::Group(1),
        )
        .skip_if(&["==", "!=", " is ", " in "]),
        // unittest
        AssertionPattern::new(
            r"\bself\.assert(?:Equal|Equals|AlmostEqual)\s*\(",
            Equals,
            Arg::Index(1),
            Arg::Index(0),
        ),
        AssertionPattern::new(
            r"\bself\.assert(?:NotEqual|NotAlmostEqual)\s*\(",
            Other,
            Arg::Index(1),
            Arg::Index(0),
        ),
        AssertionPattern::new(
            r"\bself\.assertTrue\s*\(",
            Truthy,
            Arg::Fixed("True"),
            Arg::Index(0),
        ),
        AssertionPattern::new(
            r"\bself\.assertFalse\s*\(",
            Truthy,
            Arg::Fixed("False"),
            Arg::Index(0),
        ),
        AssertionPattern::new(r"\bself\.assertIn\s*\(", Contains, Arg::Index(0), Arg::Index(1)),
        AssertionPattern::new(
            r"\bself\.assertRaises(?:Regex)?\s*\(",
            Throws,
            Arg::Index(0),
            Arg::None,
        ),
        AssertionPattern::new(
            r"\bself\.assertIsNone\s*\(",
            Other,
            Arg::Fixed("None"),
            Arg::Index(0),
        ),
        AssertionPattern::new(
            r"\bself\.assert(?:NotIn|IsNotNone|Greater|GreaterEqual|Less|LessEqual|IsInstance|Is|IsNot|Regex|CountEqual|DictEqual|ListEqual)\s*\(",
            Other,
            Arg::Index(1),
            Arg::Index(0),
        ),
        // pytest
        AssertionPattern::new(r"\bpytest\.raises\s*\(", Throws, Arg::Index(0), Arg::None),
    ]
});

pub struct PythonParser;

impl PythonParser {
    /// The class whose body directly contains the definition at `idx`.
    fn enclosing_class(lines: &[&str], idx: usize) -> Option<String> {
        let indent = indent_of(lines[idx]);
        if indent == 0 {
            return None;
        }
        lines[..idx]
            .iter()
            .rev()
            .filter(|line| !line.trim().is_empty() && !is_comment_line(line.trim()))
            .find(|line| indent_of(line) < indent && !line.trim_start().starts_with('@'))
            .and_then(|line| CLASS.captures(line))
            .map(|caps| caps[1].to_string())
    }
}

impl LanguageParser for PythonParser {
    fn language(&self) -> Language {
        Language::Python
    }

    fn detect_framework(&self, content: &str) -> TestFramework {
        if content.contains("import pytest") || content.contains("from pytest") || content.contains("@pytest.") {
            TestFramework::Pytest
        } else if content.contains("import unittest") || content.contains("from unittest") {
            TestFramework::Unittest
        } else if content.contains("def test") {
            TestFramework::Pytest
        } else {
            TestFramework::Unknown
        }
    }

    fn extract_tests(&self, content: &str, path: &Path, framework: TestFramework) -> Vec<TestCase> {
        let lines: Vec<&str> = content.lines().collect();
        lines
            .iter()
            .enumerate()
            .filter_map(|(idx, line)| {
                let name = DEF.captures(line)?[1].to_string();
                if !name.starts_with("test") {
                    return None;
                }
                let span = extract_indent_body(&lines, idx)?;
                Some(build_test_case(self, name, path, &span, framework))
            })
            .collect()
    }

    fn extract_methods(&self, content: &str, path: &Path) -> Vec<SourceMethod> {
        let lines: Vec<&str> = content.lines().collect();
        lines
            .iter()
            .enumerate()
            .filter_map(|(idx, line)| {
                let name = DEF.captures(line)?[1].to_string();
                if name.starts_with("__") && name.ends_with("__") {
                    return None;
                }
                let span = extract_indent_body(&lines, idx)?;
                let (signature, _) = join_signature(&lines, idx, 20);
                let parameters = signature
                    .find('(')
                    .and_then(|open| super::common::balanced_args(&signature, open))
                    .map(|list| self.parse_parameters(list))
                    .unwrap_or_default();
                let return_type = RETURN_ANNOTATION
                    .captures(&signature)
                    .map(|caps| caps[1].to_string());

                Some(SourceMethod {
                    name,
                    file_path: path.to_path_buf(),
                    line_number: span.start_line,
                    end_line: span.end_line,
                    parameters,
                    return_type,
                    body: span.text,
                    class_name: Self::enclosing_class(&lines, idx),
                })
            })
            .collect()
    }

    fn extract_assertions(
        &self,
        body: &str,
        first_line: usize,
        _framework: TestFramework,
    ) -> Vec<Assertion> {
        scan_assertions(body, first_line, &ASSERTIONS)
    }

    fn parse_parameters(&self, list: &str) -> Vec<Parameter> {
        split_top_level(list)
            .iter()
            .map(|param| param.trim())
            .filter(|param| !matches!(*param, "self" | "cls" | "*" | "/"))
            .filter_map(|param| PARAM.captures(param))
            .map(|caps| Parameter {
                name: caps[1].to_string(),
                param_type: caps
                    .get(2)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_else(|| "Any".to_string()),
                default_value: caps.get(3).map(|m| m.as_str().trim().to_string()),
            })
            .collect()
    }
}
