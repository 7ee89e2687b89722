//! Java: JUnit 4/5, TestNG, AssertJ and Hamcrest.

use super::common::{extract_brace_body, is_comment_line, join_signature, split_top_level};
use super::patterns::{scan_assertions, Arg, AssertionPattern};
use super::{build_test_case, LanguageParser};
use crate::core::{Assertion, AssertionType, Language, Parameter, SourceMethod, TestCase, TestFramework};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static TEST_ANNOTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*@(?:Test|ParameterizedTest|RepeatedTest|TestTemplate|TestFactory)\b").unwrap()
});

static LEGACY_TEST_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*public\s+void\s+(test\w*)\s*\(").unwrap());

static METHOD_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:(?:public|protected|private|static|final|synchronized|abstract|native|default|strictfp)\s+)*(?:<[^>]+>\s+)?([\w.$]+(?:<.*>)?(?:\[\])*)\s+(\w+)\s*\(",
    )
    .unwrap()
});

static CLASS_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:class|interface|enum|record)\s+(\w+)").unwrap());

static PARAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:@\w+(?:\([^)]*\))?\s+)*(?:final\s+)?(.+?)\s+(\w+)$").unwrap()
});

const MODIFIERS: &[&str] = &[
    "public", "protected", "private", "static", "final", "synchronized", "abstract", "native",
    "default", "strictfp",
];

static ASSERTIONS: Lazy<Vec<AssertionPattern>> = Lazy::new(|| {
    use AssertionType::*;
    vec![
        // JUnit
        AssertionPattern::new(r"\bassertEquals\s*\(", Equals, Arg::Index(0), Arg::Index(1)),
        AssertionPattern::new(r"\bassertArrayEquals\s*\(", Equals, Arg::Index(0), Arg::Index(1)),
        AssertionPattern::new(r"\bassertSame\s*\(", Equals, Arg::Index(0), Arg::Index(1)),
        AssertionPattern::new(r"\bassertNotEquals\s*\(", Other, Arg::Index(0), Arg::Index(1)),
        AssertionPattern::new(r"\bassertTrue\s*\(", Truthy, Arg::Fixed("true"), Arg::Index(0)),
        AssertionPattern::new(r"\bassertFalse\s*\(", Truthy, Arg::Fixed("false"), Arg::Index(0)),
        AssertionPattern::new(r"\bassertNull\s*\(", Other, Arg::Fixed("null"), Arg::Index(0)),
        AssertionPattern::new(r"\bassertNotNull\s*\(", Other, Arg::Fixed("not null"), Arg::Index(0)),
        AssertionPattern::new(r"\bassertThrows\s*\(", Throws, Arg::Index(0), Arg::None),
        AssertionPattern::new(r"\bassertDoesNotThrow\s*\(", Other, Arg::None, Arg::None),
        AssertionPattern::new(r"(?:^|[^\w.])fail\s*\(", Other, Arg::None, Arg::Index(0)),
        // AssertJ
        AssertionPattern::new(
            r"\bassertThat\s*\(.*\)\s*\.isEqualTo\s*\(",
            Equals,
            Arg::Index(0),
            Arg::Subject,
        ),
        AssertionPattern::new(
            r"\bassertThat\s*\(.*\)\s*\.(?:contains|containsExactly|containsOnly)\s*\(",
            Contains,
            Arg::Index(0),
            Arg::Subject,
        ),
        AssertionPattern::new(
            r"\bassertThat\s*\(.*\)\s*\.isTrue\s*\(",
            Truthy,
            Arg::Fixed("true"),
            Arg::Subject,
        ),
        AssertionPattern::new(
            r"\bassertThat\s*\(.*\)\s*\.isFalse\s*\(",
            Truthy,
            Arg::Fixed("false"),
            Arg::Subject,
        ),
        AssertionPattern::new(
            r"\bassertThatThrownBy\b(?:.*\.isInstanceOf\s*\(\s*([\w.]+?)(?:\.class)?\s*\))?",
            Throws,
            Arg::Group(1),
            Arg::None,
        ),
        AssertionPattern::new(
            r"\bassertThatExceptionOfType\s*\(",
            Throws,
            Arg::Index(0),
            Arg::None,
        ),
        // Hamcrest
        AssertionPattern::new(
            r"\bassertThat\s*\(\s*([^,()]+?)\s*,\s*(?:is|equalTo)\s*\(\s*(?:equalTo\s*\()?\s*(.+?)\s*\)+\s*;?\s*$",
            Equals,
            Arg::Group(2),
            Arg::Group(1),
        ),
    ]
});

pub struct JavaParser;

impl JavaParser {
    fn enclosing_class(lines: &[&str], idx: usize) -> Option<String> {
        lines[..=idx]
            .iter()
            .rev()
            .find_map(|line| CLASS_DECL.captures(line))
            .map(|caps| caps[1].to_string())
    }

    fn test_declaration_after(lines: &[&str], annotation_idx: usize) -> Option<(usize, String)> {
        lines
            .iter()
            .enumerate()
            .skip(annotation_idx + 1)
            .take(8)
            .filter(|(_, line)| !line.trim_start().starts_with('@'))
            .find_map(|(idx, line)| {
                METHOD_DECL
                    .captures(line)
                    .map(|caps| (idx, caps[2].to_string()))
            })
    }
}

impl LanguageParser for JavaParser {
    fn language(&self) -> Language {
        Language::Java
    }

    fn detect_framework(&self, content: &str) -> TestFramework {
        if content.contains("org.junit.jupiter") {
            TestFramework::Junit5
        } else if content.contains("org.testng") {
            TestFramework::Testng
        } else if content.contains("org.junit.Test")
            || content.contains("org.junit.Assert")
            || content.contains("junit.framework")
        {
            TestFramework::Junit4
        } else if content.contains("@Test") {
            TestFramework::Junit5
        } else {
            TestFramework::Unknown
        }
    }

    fn extract_tests(&self, content: &str, path: &Path, framework: TestFramework) -> Vec<TestCase> {
        let lines: Vec<&str> = content.lines().collect();
        let annotated = lines.iter().any(|l| TEST_ANNOTATION.is_match(l));

        let declarations: Vec<(usize, String)> = if annotated {
            lines
                .iter()
                .enumerate()
                .filter(|(_, line)| TEST_ANNOTATION.is_match(line))
                .filter_map(|(idx, _)| Self::test_declaration_after(&lines, idx))
                .collect()
        } else {
            lines
                .iter()
                .enumerate()
                .filter_map(|(idx, line)| {
                    LEGACY_TEST_DECL
                        .captures(line)
                        .map(|caps| (idx, caps[1].to_string()))
                })
                .collect()
        };

        declarations
            .into_iter()
            .filter_map(|(idx, name)| {
                let span = extract_brace_body(&lines, idx, 5)?;
                Some(build_test_case(self, name, path, &span, framework))
            })
            .collect()
    }

    fn extract_methods(&self, content: &str, path: &Path) -> Vec<SourceMethod> {
        let lines: Vec<&str> = content.lines().collect();
        let mut methods = Vec::new();

        for (idx, line) in lines.iter().enumerate() {
            if is_comment_line(line.trim()) {
                continue;
            }
            let Some(caps) = METHOD_DECL.captures(line) else {
                continue;
            };
            let return_type = caps[1].to_string();
            let name = caps[2].to_string();
            if MODIFIERS.contains(&return_type.as_str())
                || super::common::is_control_keyword(&return_type)
                || super::common::is_control_keyword(&name)
            {
                continue;
            }

            let (signature, _) = join_signature(&lines, idx, 10);
            let Some(span) = extract_brace_body(&lines, idx, 5) else {
                continue;
            };
            let parameters = signature
                .find('(')
                .and_then(|open| super::common::balanced_args(&signature, open))
                .map(|list| self.parse_parameters(list))
                .unwrap_or_default();

            methods.push(SourceMethod {
                name,
                file_path: path.to_path_buf(),
                line_number: span.start_line,
                end_line: span.end_line,
                parameters,
                return_type: Some(return_type),
                body: span.text,
                class_name: Self::enclosing_class(&lines, idx),
            });
        }
        methods
    }

    fn extract_assertions(
        &self,
        body: &str,
        first_line: usize,
        framework: TestFramework,
    ) -> Vec<Assertion> {
        let mut assertions = scan_assertions(body, first_line, &ASSERTIONS);
        if framework == TestFramework::Testng {
            // TestNG puts the actual value first.
            for assertion in assertions.iter_mut().filter(|a| {
                a.raw.contains("assertEquals") || a.raw.contains("assertNotEquals")
            }) {
                std::mem::swap(&mut assertion.expected, &mut assertion.actual);
            }
        }
        assertions
    }

    fn parse_parameters(&self, list: &str) -> Vec<Parameter> {
        split_top_level(list)
            .iter()
            .filter_map(|param| PARAM.captures(param.trim()))
            .map(|caps| Parameter {
                name: caps[2].to_string(),
                param_type: caps[1].trim().to_string(),
                default_value: None,
            })
            .collect()
    }
}
