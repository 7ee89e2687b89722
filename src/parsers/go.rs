//! Go: `testing` and testify.

use super::common::{balanced_args, extract_brace_body, is_comment_line, join_signature, split_top_level};
use super::patterns::{scan_assertions, Arg, AssertionPattern};
use super::{build_test_case, LanguageParser};
use crate::core::{Assertion, AssertionType, Language, Parameter, SourceMethod, TestCase, TestFramework};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static TEST_FUNC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^func\s+(Test\w*)\s*\(\s*\w+\s+\*testing\.T\s*\)").unwrap()
});

static FUNC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^func\s+(?:\(\s*(?:\w+\s+)?\*?\s*(\w+)(?:\[[^\]]*\])?\s*\)\s*)?(\w+)\s*(?:\[[^\]]*\])?\s*\(",
    )
    .unwrap()
});

static ASSERTIONS: Lazy<Vec<AssertionPattern>> = Lazy::new(|| {
    use AssertionType::*;
    vec![
        // testify
        AssertionPattern::new(
            r"\b(?:assert|require)\.(?:Equal|Equalf|EqualValues|Exactly|InDelta|InEpsilon)\s*\(",
            Equals,
            Arg::Index(1),
            Arg::Index(2),
        ),
        AssertionPattern::new(
            r"\b(?:assert|require)\.(?:NotEqual|NotEqualValues)\s*\(",
            Other,
            Arg::Index(1),
            Arg::Index(2),
        ),
        AssertionPattern::new(
            r"\b(?:assert|require)\.True\s*\(",
            Truthy,
            Arg::Fixed("true"),
            Arg::Index(1),
        ),
        AssertionPattern::new(
            r"\b(?:assert|require)\.False\s*\(",
            Truthy,
            Arg::Fixed("false"),
            Arg::Index(1),
        ),
        AssertionPattern::new(
            r"\b(?:assert|require)\.(?:Error|EqualError|ErrorIs|ErrorContains|ErrorAs)\s*\(",
            Throws,
            Arg::Index(2),
            Arg::Index(1),
        ),
        AssertionPattern::new(
            r"\b(?:assert|require)\.(?:Panics|PanicsWithValue|PanicsWithError)\s*\(",
            Throws,
            Arg::Fixed("panic"),
            Arg::None,
        ),
        AssertionPattern::new(
            r"\b(?:assert|require)\.(?:Contains|Containsf)\s*\(",
            Contains,
            Arg::Index(2),
            Arg::Index(1),
        ),
        AssertionPattern::new(
            r"\b(?:assert|require)\.(?:Nil|NotNil|NoError|Empty|NotEmpty|Zero|Len|Greater|GreaterOrEqual|Less|LessOrEqual|Same|Regexp|ElementsMatch|Subset|NotContains|NotPanics)\s*\(",
            Other,
            Arg::Index(2),
            Arg::Index(1),
        ),
        // standard library
        AssertionPattern::new(
            r"^\s*if\s+(?:\w+\s*:=[^;]*;\s*)?(.+?)\s*!=\s*(.+?)\s*\{",
            Equals,
            Arg::Group(2),
            Arg::Group(1),
        )
        .skip_if(&["nil"]),
        AssertionPattern::new(
            r"\breflect\.DeepEqual\s*\(",
            Equals,
            Arg::Index(1),
            Arg::Index(0),
        ),
    ]
});

pub struct GoParser;

impl GoParser {
    fn return_type(signature: &str, name: &str) -> Option<String> {
        let name_at = signature.find(name)?;
        let open = signature[name_at..].find('(')? + name_at;
        let args = balanced_args(signature, open)?;
        let rest = signature.get(open + args.len() + 2..)?;
        let ty = rest.split('{').next()?.trim();
        (!ty.is_empty()).then(|| ty.to_string())
    }
}

impl LanguageParser for GoParser {
    fn language(&self) -> Language {
        Language::Go
    }

    fn detect_framework(&self, content: &str) -> TestFramework {
        if content.contains("github.com/stretchr/testify") {
            TestFramework::Testify
        } else if content.contains("\"testing\"") {
            TestFramework::GoTest
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
                let name = TEST_FUNC.captures(line)?[1].to_string();
                let span = extract_brace_body(&lines, idx, 3)?;
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
            let Some(caps) = FUNC.captures(line) else {
                continue;
            };
            let name = caps[2].to_string();
            let receiver = caps.get(1).map(|m| m.as_str().to_string());

            let (signature, _) = join_signature(&lines, idx, 10);
            if signature.contains("*testing.") {
                continue;
            }
            let Some(span) = extract_brace_body(&lines, idx, 5) else {
                continue;
            };

            let name_at = signature.find(name.as_str()).unwrap_or(0);
            let parameters = signature[name_at..]
                .find('(')
                .and_then(|open| balanced_args(&signature, open + name_at))
                .map(|list| self.parse_parameters(list))
                .unwrap_or_default();

            methods.push(SourceMethod {
                return_type: Self::return_type(&signature, &name),
                name,
                file_path: path.to_path_buf(),
                line_number: span.start_line,
                end_line: span.end_line,
                parameters,
                body: span.text,
                class_name: receiver,
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

    /// Go lets consecutive parameters share a type (`a, b int`), so types
    /// are carried backwards from the last named parameter.
    fn parse_parameters(&self, list: &str) -> Vec<Parameter> {
        let parts = split_top_level(list);
        let named = parts.iter().any(|p| p.trim().contains(char::is_whitespace));

        if !named {
            return parts
                .iter()
                .map(|ty| Parameter {
                    name: String::new(),
                    param_type: ty.trim().to_string(),
                    default_value: None,
                })
                .collect();
        }

        let mut carried = String::new();
        let mut params: Vec<Parameter> = parts
            .iter()
            .rev()
            .map(|part| {
                let part = part.trim();
                match part.split_once(char::is_whitespace) {
                    Some((name, ty)) => {
                        carried = ty.trim().to_string();
                        Parameter {
                            name: name.to_string(),
                            param_type: carried.clone(),
                            default_value: None,
                        }
                    }
                    None => Parameter {
                        name: part.to_string(),
                        param_type: carried.clone(),
                        default_value: None,
                    },
                }
            })
            .collect();
        params.reverse();
        params
    }
}
