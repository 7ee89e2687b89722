//! Rust: `#[test]`, `#[tokio::test]` and `#[rstest]`.

use super::common::{
    balanced_args, extract_brace_body, is_comment_line, join_signature, split_top_level, BodySpan,
};
use super::patterns::{scan_assertions, Arg, AssertionPattern};
use super::{build_test_case, LanguageParser};
use crate::core::{Assertion, AssertionType, Language, Parameter, SourceMethod, TestCase, TestFramework};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static TEST_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*#\[(?:tokio::test|async_std::test|test|rstest|test_case)\b").unwrap()
});

static SHOULD_PANIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*#\[should_panic(?:\s*\(\s*expected\s*=\s*"([^"]*)"\s*\))?"#).unwrap()
});

static FN_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?(?:extern\s+"[^"]*"\s+)?fn\s+(\w+)"#,
    )
    .unwrap()
});

static IMPL_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*impl\b(?:<[^{]*?>)?\s+(?:[\w:<>, ]+?\s+for\s+)?(?:[\w:]+::)?(\w+)").unwrap()
});

static RETURN_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"->\s*(.+?)\s*(?:\bwhere\b|\{|;|$)").unwrap());

static PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:mut\s+)?(.+?)\s*:\s*(.+)$").unwrap());

static ASSERTIONS: Lazy<Vec<AssertionPattern>> = Lazy::new(|| {
    use AssertionType::*;
    vec![
        AssertionPattern::new(r"\bassert_eq!\s*\(", Equals, Arg::Index(1), Arg::Index(0)),
        AssertionPattern::new(r"\bassert_ne!\s*\(", Other, Arg::Index(1), Arg::Index(0)),
        AssertionPattern::new(r"\bassert!\s*\(", Truthy, Arg::Fixed("true"), Arg::Index(0)),
        AssertionPattern::new(r"\bassert_matches!\s*\(", Other, Arg::Index(1), Arg::Index(0)),
        AssertionPattern::new(r"\.unwrap_err\s*\(\s*\)", Throws, Arg::None, Arg::None),
    ]
});

pub struct RustParser;

impl RustParser {
    fn impl_spans(lines: &[&str]) -> Vec<(BodySpan, String)> {
        lines
            .iter()
            .enumerate()
            .filter_map(|(idx, line)| {
                let name = IMPL_DECL.captures(line)?[1].to_string();
                extract_brace_body(lines, idx, 3).map(|span| (span, name))
            })
            .collect()
    }

    /// Walk the attributes after a test attribute to the `fn` line.
    fn test_fn_after(lines: &[&str], attr_idx: usize) -> Option<(usize, String, Option<Assertion>)> {
        let mut panic_attr = None;
        for (idx, line) in lines.iter().enumerate().skip(attr_idx + 1).take(6) {
            if let Some(caps) = SHOULD_PANIC.captures(line) {
                let expected = caps
                    .get(1)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_else(|| "panic".to_string());
                panic_attr = Some((expected, line.trim().to_string()));
                continue;
            }
            if line.trim_start().starts_with("#[") || line.trim().is_empty() {
                continue;
            }
            let caps = FN_DECL.captures(line)?;
            let assertion = panic_attr.map(|(expected, raw)| Assertion {
                assertion_type: AssertionType::Throws,
                expected: Some(expected),
                actual: None,
                line_number: idx + 1,
                raw,
            });
            return Some((idx, caps[1].to_string(), assertion));
        }
        None
    }
}

impl LanguageParser for RustParser {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn detect_framework(&self, content: &str) -> TestFramework {
        if content.lines().any(|line| TEST_ATTR.is_match(line)) {
            TestFramework::RustTest
        } else {
            TestFramework::Unknown
        }
    }

    fn extract_tests(&self, content: &str, path: &Path, framework: TestFramework) -> Vec<TestCase> {
        let lines: Vec<&str> = content.lines().collect();
        lines
            .iter()
            .enumerate()
            .filter(|(_, line)| TEST_ATTR.is_match(line))
            .filter_map(|(idx, _)| Self::test_fn_after(&lines, idx))
            .filter_map(|(idx, name, panic_assertion)| {
                let span = extract_brace_body(&lines, idx, 5)?;
                let mut test = build_test_case(self, name, path, &span, framework);
                if let Some(assertion) = panic_assertion {
                    test.assertions.insert(0, assertion);
                }
                Some(test)
            })
            .collect()
    }

    fn extract_methods(&self, content: &str, path: &Path) -> Vec<SourceMethod> {
        let lines: Vec<&str> = content.lines().collect();
        let impls = Self::impl_spans(&lines);
        let mut methods = Vec::new();

        for (idx, line) in lines.iter().enumerate() {
            if is_comment_line(line.trim()) {
                continue;
            }
            let Some(caps) = FN_DECL.captures(line) else {
                continue;
            };
            let name = caps[1].to_string();
            let Some(span) = extract_brace_body(&lines, idx, 8) else {
                continue;
            };

            let (signature, _) = join_signature(&lines, idx, 12);
            let name_at = signature.find(&format!("fn {name}")).unwrap_or(0);
            let open = signature[name_at..].find('(').map(|p| p + name_at);
            let parameters = open
                .and_then(|open| balanced_args(&signature, open))
                .map(|list| self.parse_parameters(list))
                .unwrap_or_default();
            let return_type = open
                .and_then(|open| {
                    let args = balanced_args(&signature, open)?;
                    signature.get(open + args.len() + 2..)
                })
                .and_then(|rest| RETURN_TYPE.captures(rest))
                .map(|caps| caps[1].to_string());

            let class_name = impls
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
                return_type,
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
            .map(|param| param.trim())
            .filter(|param| !(param.ends_with("self") && !param.contains(':')))
            .filter_map(|param| PARAM.captures(param))
            .map(|caps| Parameter {
                name: caps[1].to_string(),
                param_type: caps[2].trim().to_string(),
                default_value: None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    const SOURCE: &str = indoc! {r#"
        pub struct OrderService {
            rate: f64,
        }

        impl OrderService {
            pub fn calculate_discount(&self, price: f64, premium: bool) -> Result<f64, String> {
                if price <= 0.0 {
                    return Err("price must be positive".to_string());
                }
                Ok(price * (1.0 - self.rate))
            }
        }

        impl<T: Clone> From<T> for Wrapper {
            fn from(value: T) -> Self {
                Wrapper
            }
        }

        pub fn add(mut a: i32, b: i32) -> i32 {
            a += b;
            a
        }

        #[cfg(test)]
        mod tests {
            use super::*;

            #[test]
            fn test_add() {
                assert_eq!(add(2, 3), 5);
            }

            #[test]
            #[should_panic(expected = "overflow")]
            fn test_overflow() {
                add(i32::MAX, 1);
            }
        }
    "#};

    #[test]
    fn test_extract_methods_and_impls() {
        let parsed = RustParser.parse(SOURCE, &PathBuf::from("lib.rs"));
        let names: Vec<&str> = parsed.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["calculate_discount", "from", "add"]);

        let discount = &parsed.methods[0];
        assert_eq!(discount.class_name.as_deref(), Some("OrderService"));
        assert_eq!(discount.return_type.as_deref(), Some("Result<f64, String>"));
        assert_eq!((discount.line_number, discount.end_line), (6, 11));
        assert_eq!(discount.parameters.len(), 2);
        assert_eq!(discount.parameters[0].name, "price");

        assert_eq!(parsed.methods[1].class_name.as_deref(), Some("Wrapper"));

        let add = &parsed.methods[2];
        assert_eq!(add.class_name, None);
        assert_eq!(add.parameters[0].name, "a");
        assert_eq!(add.return_type.as_deref(), Some("i32"));
    }

    #[test]
    fn test_extract_tests_with_should_panic() {
        let parsed = RustParser.parse(SOURCE, &PathBuf::from("lib.rs"));
        assert_eq!(parsed.tests.len(), 2);
        assert_eq!(parsed.tests[0].framework, TestFramework::RustTest);

        let eq = &parsed.tests[0].assertions[0];
        assert_eq!((eq.expected.as_deref(), eq.actual.as_deref()), (Some("5"), Some("add(2, 3)")));

        let panics = &parsed.tests[1].assertions[0];
        assert_eq!(panics.assertion_type, AssertionType::Throws);
        assert_eq!(panics.expected.as_deref(), Some("overflow"));
        assert_eq!(panics.line_number, parsed.tests[1].line_number);
    }

    fn one(line: &str) -> Assertion {
        let found = RustParser.extract_assertions(line, 1, TestFramework::RustTest);
        assert_eq!(found.len(), 1, "expected exactly one assertion for {line}");
        found.into_iter().next().unwrap()
    }

    #[test]
    fn test_every_idiom_yields_one_assertion() {
        assert_eq!(one("assert_eq!(total, 42, \"sum\");").expected.as_deref(), Some("42"));
        assert_eq!(one("assert_ne!(a, b);").assertion_type, AssertionType::Other);
        let truthy = one("assert!(list.is_empty());");
        assert_eq!(truthy.actual.as_deref(), Some("list.is_empty()"));
        assert_eq!(one("assert_matches!(r, Ok(_));").assertion_type, AssertionType::Other);
        assert_eq!(one("let err = parse(\"x\").unwrap_err();").assertion_type, AssertionType::Throws);
        assert!(one("debug_assert!(x > 0); assert!(y);").raw.contains("assert!(y)"));
    }

    #[test]
    fn test_parse_parameters_skips_receivers() {
        let params = RustParser.parse_parameters("&mut self, f: impl Fn(i32) -> i32, mut n: usize");
        let shapes: Vec<(&str, &str)> = params
            .iter()
            .map(|p| (p.name.as_str(), p.param_type.as_str()))
            .collect();
        assert_eq!(shapes, vec![("f", "impl Fn(i32) -> i32"), ("n", "usize")]);
    }
}
