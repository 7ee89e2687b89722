//! C#: NUnit, xUnit, MSTest and FluentAssertions.

use super::common::{
    balanced_args, extract_brace_body, is_comment_line, is_control_keyword, join_signature,
    split_top_level, BodySpan,
};
use super::patterns::{scan_assertions, Arg, AssertionPattern};
use super::{build_test_case, LanguageParser};
use crate::core::{Assertion, AssertionType, Language, Parameter, SourceMethod, TestCase, TestFramework};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static TEST_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\[(?:Test|Fact|Theory|TestMethod|DataTestMethod|TestCase)\b").unwrap()
});

static METHOD_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:(?:public|private|protected|internal|static|virtual|override|abstract|async|sealed|extern|new|partial|unsafe)\s+)*([\w.]+(?:<.*?>)?(?:\[\])*\??)\s+(\w+)\s*(?:<[^>]*>)?\s*\(",
    )
    .unwrap()
});

static TYPE_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:class|struct|record|interface)\s+(\w+)").unwrap()
});

static PARAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\[[^\]]*\]\s*)?(?:(?:ref|out|in|params|this)\s+)?(.+?)\s+(\w+)(?:\s*=\s*(.+))?$")
        .unwrap()
});

const MODIFIERS: &[&str] = &[
    "public", "private", "protected", "internal", "static", "virtual", "override", "abstract",
    "async", "sealed", "extern", "new", "partial", "unsafe", "var", "await",
];

static ASSERTIONS: Lazy<Vec<AssertionPattern>> = Lazy::new(|| {
    use AssertionType::*;
    vec![
        // NUnit / xUnit / MSTest classic
        AssertionPattern::new(r"\bAssert\.(?:AreEqual|Equal)\s*\(", Equals, Arg::Index(0), Arg::Index(1)),
        AssertionPattern::new(
            r"\bAssert\.(?:AreNotEqual|NotEqual)\s*\(",
            Other,
            Arg::Index(0),
            Arg::Index(1),
        ),
        AssertionPattern::new(
            r"\bAssert\.(?:IsTrue|True)\s*\(",
            Truthy,
            Arg::Fixed("true"),
            Arg::Index(0),
        ),
        AssertionPattern::new(
            r"\bAssert\.(?:IsFalse|False)\s*\(",
            Truthy,
            Arg::Fixed("false"),
            Arg::Index(0),
        ),
        AssertionPattern::new(
            r"\bAssert\.(?:IsNull|Null|IsNotNull|NotNull)\s*\(",
            Other,
            Arg::Fixed("null"),
            Arg::Index(0),
        ),
        AssertionPattern::new(
            r"\bAssert\.(?:Throws|ThrowsAsync|ThrowsException|ThrowsExceptionAsync)\s*<\s*([\w.]+)\s*>",
            Throws,
            Arg::Group(1),
            Arg::None,
        ),
        AssertionPattern::new(
            r"\b(?:Assert|StringAssert|CollectionAssert)\.Contains\s*\(",
            Contains,
            Arg::Index(0),
            Arg::Index(1),
        ),
        // NUnit constraint model
        AssertionPattern::new(
            r"\bAssert\.That\s*\(\s*(.+?)\s*,\s*Is\.EqualTo\s*\(",
            Equals,
            Arg::Index(0),
            Arg::Group(1),
        ),
        AssertionPattern::new(
            r"\bAssert\.That\s*\(\s*(.+?)\s*,\s*Is\.True\b",
            Truthy,
            Arg::Fixed("true"),
            Arg::Group(1),
        ),
        AssertionPattern::new(
            r"\bAssert\.That\s*\(\s*(.+?)\s*,\s*Is\.False\b",
            Truthy,
            Arg::Fixed("false"),
            Arg::Group(1),
        ),
        AssertionPattern::new(
            r"\bAssert\.That\s*\(\s*(.+?)\s*,\s*Does\.Contain\s*\(",
            Contains,
            Arg::Index(0),
            Arg::Group(1),
        ),
        // FluentAssertions
        AssertionPattern::new(
            r"^\s*(.+?)\s*\.Should\(\)\s*\.Be\s*\(",
            Equals,
            Arg::Index(0),
            Arg::Group(1),
        ),
        AssertionPattern::new(
            r"^\s*(.+?)\s*\.Should\(\)\s*\.BeEquivalentTo\s*\(",
            Equals,
            Arg::Index(0),
            Arg::Group(1),
        ),
        AssertionPattern::new(
            r"^\s*(.+?)\s*\.Should\(\)\s*\.BeTrue\s*\(",
            Truthy,
            Arg::Fixed("true"),
            Arg::Group(1),
        ),
        AssertionPattern::new(
            r"^\s*(.+?)\s*\.Should\(\)\s*\.BeFalse\s*\(",
            Truthy,
            Arg::Fixed("false"),
            Arg::Group(1),
        ),
        AssertionPattern::new(
            r"^\s*(.+?)\s*\.Should\(\)\s*\.Contain\s*\(",
            Contains,
            Arg::Index(0),
            Arg::Group(1),
        ),
        AssertionPattern::new(
            r"\.Should\(\)\s*\.Throw(?:Exactly)?(?:Async)?\s*<\s*([\w.]+)\s*>",
            Throws,
            Arg::Group(1),
            Arg::None,
        ),
    ]
});

pub struct CSharpParser;

impl CSharpParser {
    fn type_spans(lines: &[&str]) -> Vec<(BodySpan, String)> {
        lines
            .iter()
            .enumerate()
            .filter(|(_, line)| !is_comment_line(line.trim()))
            .filter_map(|(idx, line)| {
                let name = TYPE_DECL.captures(line)?[1].to_string();
                extract_brace_body(lines, idx, 3).map(|span| (span, name))
            })
            .collect()
    }

    fn declaration(line: &str) -> Option<(String, String)> {
        let caps = METHOD_DECL.captures(line)?;
        let return_type = caps[1].to_string();
        let name = caps[2].to_string();
        if MODIFIERS.contains(&return_type.as_str())
            || is_control_keyword(&return_type)
            || is_control_keyword(&name)
            || return_type == "class"
        {
            return None;
        }
        Some((return_type, name))
    }
}

impl LanguageParser for CSharpParser {
    fn language(&self) -> Language {
        Language::CSharp
    }

    fn detect_framework(&self, content: &str) -> TestFramework {
        if content.contains("using NUnit") {
            TestFramework::Nunit
        } else if content.contains("using Xunit") {
            TestFramework::Xunit
        } else if content.contains("Microsoft.VisualStudio.TestTools") {
            TestFramework::Mstest
        } else if content.contains("[Fact") || content.contains("[Theory") {
            TestFramework::Xunit
        } else if content.contains("[TestMethod") {
            TestFramework::Mstest
        } else if content.contains("[Test") {
            TestFramework::Nunit
        } else {
            TestFramework::Unknown
        }
    }

    fn extract_tests(&self, content: &str, path: &Path, framework: TestFramework) -> Vec<TestCase> {
        let lines: Vec<&str> = content.lines().collect();
        let mut tests = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for (attr_idx, _) in lines.iter().enumerate().filter(|(_, l)| TEST_ATTR.is_match(l)) {
            let found = lines
                .iter()
                .enumerate()
                .skip(attr_idx + 1)
                .take(8)
                .filter(|(_, line)| !line.trim_start().starts_with('['))
                .find_map(|(idx, line)| Self::declaration(line).map(|(_, name)| (idx, name)));
            let Some((idx, name)) = found else {
                continue;
            };
            // `[Theory]` followed by several `[InlineData]` rows or stacked
            // `[TestCase]` attributes point at the same method.
            if !seen.insert(idx) {
                continue;
            }
            if let Some(span) = extract_brace_body(&lines, idx, 5) {
                tests.push(build_test_case(self, name, path, &span, framework));
            }
        }
        tests
    }

    fn extract_methods(&self, content: &str, path: &Path) -> Vec<SourceMethod> {
        let lines: Vec<&str> = content.lines().collect();
        let types = Self::type_spans(&lines);
        let mut methods = Vec::new();

        for (idx, line) in lines.iter().enumerate() {
            if is_comment_line(line.trim()) {
                continue;
            }
            let Some((return_type, name)) = Self::declaration(line) else {
                continue;
            };
            let (signature, _) = join_signature(&lines, idx, 10);
            let span = match extract_brace_body(&lines, idx, 5) {
                Some(span) => span,
                None if signature.contains("=>") => BodySpan {
                    start_line: idx + 1,
                    end_line: idx + 1,
                    text: line.to_string(),
                },
                None => continue,
            };

            let name_at = signature.find(name.as_str()).unwrap_or(0);
            let parameters = signature[name_at..]
                .find('(')
                .and_then(|open| balanced_args(&signature, open + name_at))
                .map(|list| self.parse_parameters(list))
                .unwrap_or_default();

            let class_name = types
                .iter()
                .filter(|(span, _)| span.start_line - 1 < idx && idx < span.end_line)
                .last()
                .map(|(_, name)| name.clone());

            methods.push(SourceMethod {
                name,
                file_path: path.to_path_buf(),
                line_number: span.start_line,
                end_line: span.end_line,
                parameters,
                return_type: Some(return_type),
                body: span.text,
                class_name,
            });
        }
        methods
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
            .filter_map(|param| PARAM.captures(param.trim()))
            .map(|caps| Parameter {
                name: caps[2].to_string(),
                param_type: caps[1].trim().to_string(),
                default_value: caps.get(3).map(|m| m.as_str().trim().to_string()),
            })
            .collect()
    }
}
