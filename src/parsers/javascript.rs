//! TypeScript and JavaScript: Jest, Vitest, Mocha/Chai and `node:test`.

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

static TEST_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*(?:it|test)(?:\.only|\.skip|\.concurrent|\.todo)?\s*\(\s*(['"`])(.+?)['"`]"#)
        .unwrap()
});

static FUNCTION_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*([\w$]+)\s*(?:<[^>]*>)?\s*\(",
    )
    .unwrap()
});

static BOUND_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:export\s+)?(?:const|let|var)\s+([\w$]+)\s*(?::[^=]*)?=\s*(?:async\s+)?(?:function\b|\(|[\w$]+\s*=>|<)",
    )
    .unwrap()
});

static CLASS_METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:(?:public|private|protected|static|async|readonly|override|abstract|get|set)\s+)*\*?([\w$]+)\s*(?:<[^>]*>)?\s*\(",
    )
    .unwrap()
});

static CLASS_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+([\w$]+)").unwrap()
});

static PARAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?:public|private|protected|readonly)\s+)*(?:\.\.\.)?([\w$]+|\{[^}]*\}|\[[^\]]*\])\??\s*(?::\s*(.+?))?\s*(?:=\s*([^>\s].*))?$",
    )
    .unwrap()
});

/// Names that look like methods but belong to test harnesses.
const HARNESS_CALLS: &[&str] = &[
    "describe", "it", "test", "expect", "beforeEach", "afterEach", "beforeAll", "afterAll",
    "before", "after", "suite", "constructor", "require",
    // `void (expr)` parses like a shorthand method.
    "void",
];

static ASSERTIONS: Lazy<Vec<AssertionPattern>> = Lazy::new(|| {
    use AssertionType::*;
    const NOT: &[&str] = &[".not."];
    vec![
        // Jest / Vitest
        AssertionPattern::new(
            r"\bexpect\s*\(.*\)(?:\s*\.\s*(?:resolves|rejects))?\s*\.(?:toBe|toEqual|toStrictEqual|toBeCloseTo)\s*\(",
            Equals,
            Arg::Index(0),
            Arg::Subject,
        )
        .skip_if(NOT),
        AssertionPattern::new(
            r"\bexpect\s*\(.*\)\s*(?:\.to)?\s*\.not\s*\.\w+\s*\(",
            Other,
            Arg::Index(0),
            Arg::Subject,
        ),
        AssertionPattern::new(
            r"\bexpect\s*\(.*\)(?:\s*\.\s*rejects)?\s*\.(?:toThrow|toThrowError)\s*\(",
            Throws,
            Arg::Index(0),
            Arg::Subject,
        )
        .skip_if(NOT),
        AssertionPattern::new(
            r"\bexpect\s*\(.*\)\s*\.toBeTruthy\s*\(",
            Truthy,
            Arg::Fixed("true"),
            Arg::Subject,
        )
        .skip_if(NOT),
        AssertionPattern::new(
            r"\bexpect\s*\(.*\)\s*\.toBeFalsy\s*\(",
            Truthy,
            Arg::Fixed("false"),
            Arg::Subject,
        )
        .skip_if(NOT),
        AssertionPattern::new(
            r"\bexpect\s*\(.*\)\s*\.(?:toContain|toContainEqual)\s*\(",
            Contains,
            Arg::Index(0),
            Arg::Subject,
        )
        .skip_if(NOT),
        AssertionPattern::new(
            r"\bexpect\s*\(.*\)\s*\.(?:toHaveLength|toBeNull|toBeUndefined|toBeDefined|toBeGreaterThan|toBeGreaterThanOrEqual|toBeLessThan|toBeLessThanOrEqual|toMatch|toMatchObject|toHaveBeenCalled\w*|toHaveProperty|toBeInstanceOf|toBeNaN|toMatchSnapshot)\s*\(",
            Other,
            Arg::Index(0),
            Arg::Subject,
        )
        .skip_if(NOT),
        // Chai
        AssertionPattern::new(
            r"\bexpect\s*\(.*\)\s*\.to(?:\.be)?(?:\.deep)?\.(?:equal|eql)\s*\(",
            Equals,
            Arg::Index(0),
            Arg::Subject,
        )
        .skip_if(NOT),
        AssertionPattern::new(
            r"\bexpect\s*\(.*\)\s*\.to\.be\.true\b",
            Truthy,
            Arg::Fixed("true"),
            Arg::Subject,
        ),
        AssertionPattern::new(
            r"\bexpect\s*\(.*\)\s*\.to\.be\.false\b",
            Truthy,
            Arg::Fixed("false"),
            Arg::Subject,
        ),
        AssertionPattern::new(
            r"\bexpect\s*\(.*\)\s*\.to\.(?:include|contain)\s*\(",
            Contains,
            Arg::Index(0),
            Arg::Subject,
        )
        .skip_if(NOT),
        AssertionPattern::new(
            r"\bexpect\s*\(.*\)\s*\.to\.throw\s*\(",
            Throws,
            Arg::Index(0),
            Arg::Subject,
        )
        .skip_if(NOT),
        // node:assert and chai's assert style
        AssertionPattern::new(
            r"\bassert\s*\.\s*(?:equal|strictEqual|deepEqual|deepStrictEqual)\s*\(",
            Equals,
            Arg::Index(1),
            Arg::Index(0),
        ),
        AssertionPattern::new(
            r"\bassert\s*\.\s*(?:notEqual|notStrictEqual|notDeepEqual|notDeepStrictEqual)\s*\(",
            Other,
            Arg::Index(1),
            Arg::Index(0),
        ),
        AssertionPattern::new(
            r"\bassert\s*\.\s*(?:throws|rejects)\s*\(",
            Throws,
            Arg::Index(1),
            Arg::None,
        ),
        AssertionPattern::new(
            r"\bassert\s*\.\s*(?:ok|isTrue)\s*\(",
            Truthy,
            Arg::Fixed("true"),
            Arg::Index(0),
        ),
        AssertionPattern::new(
            r"\bassert\s*\.\s*isFalse\s*\(",
            Truthy,
            Arg::Fixed("false"),
            Arg::Index(0),
        ),
        AssertionPattern::new(
            r"\bassert\s*\.\s*include\s*\(",
            Contains,
            Arg::Index(1),
            Arg::Index(0),
        ),
        AssertionPattern::new(r"\bassert\s*\(", Truthy, Arg::Fixed("true"), Arg::Index(0)),
    ]
});

pub struct JavaScriptParser {
    language: Language,
}

impl JavaScriptParser {
    pub fn typescript() -> Self {
        Self {
            language: Language::TypeScript,
        }
    }

    pub fn javascript() -> Self {
        Self {
            language: Language::JavaScript,
        }
    }

    fn class_spans(lines: &[&str]) -> Vec<(BodySpan, String)> {
        lines
            .iter()
            .enumerate()
            .filter_map(|(idx, line)| {
                let name = CLASS_DECL.captures(line)?[1].to_string();
                extract_brace_body(lines, idx, 3).map(|span| (span, name))
            })
            .collect()
    }

    /// Locate a declaration on `line`, returning its name and whether it is
    /// a shorthand class/object method.
    fn declaration(line: &str) -> Option<(String, bool)> {
        if let Some(caps) = FUNCTION_DECL.captures(line) {
            return Some((caps[1].to_string(), false));
        }
        if let Some(caps) = BOUND_FUNCTION.captures(line) {
            return Some((caps[1].to_string(), false));
        }
        CLASS_METHOD
            .captures(line)
            .map(|caps| (caps[1].to_string(), true))
    }

    /// The return annotation after the parameter list, if any.
    fn return_type(signature: &str, open: usize) -> Option<String> {
        let args = balanced_args(signature, open)?;
        let rest = signature.get(open + args.len() + 2..)?.trim_start();
        let annotation = rest.strip_prefix(':')?;
        let end = annotation
            .find(" =>")
            .or_else(|| annotation.find('{'))
            .unwrap_or(annotation.len());
        let ty = annotation[..end].trim();
        (!ty.is_empty()).then(|| ty.to_string())
    }
}

impl LanguageParser for JavaScriptParser {
    fn language(&self) -> Language {
        self.language
    }

    fn detect_framework(&self, content: &str) -> TestFramework {
        if content.contains("from 'vitest'") || content.contains("from \"vitest\"") {
            TestFramework::Vitest
        } else if content.contains("@jest/globals") || content.contains("jest.") {
            TestFramework::Jest
        } else if content.contains("node:test") {
            TestFramework::NodeTest
        } else if content.contains("chai") || content.contains("mocha") {
            TestFramework::Mocha
        } else if TEST_CALL.is_match(content) || content.contains("describe(") {
            TestFramework::Jest
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
                let name = TEST_CALL.captures(line)?[2].to_string();
                // One-line tests such as `it('x', () => expect(a).toBe(1));`
                let span = extract_brace_body(&lines, idx, 3).unwrap_or_else(|| BodySpan {
                    start_line: idx + 1,
                    end_line: idx + 1,
                    text: line.to_string(),
                });
                Some(build_test_case(self, name, path, &span, framework))
            })
            .collect()
    }

    fn extract_methods(&self, content: &str, path: &Path) -> Vec<SourceMethod> {
        let lines: Vec<&str> = content.lines().collect();
        let classes = Self::class_spans(&lines);
        let mut methods = Vec::new();

        for (idx, line) in lines.iter().enumerate() {
            if is_comment_line(line.trim()) || TEST_CALL.is_match(line) {
                continue;
            }
            let Some((name, shorthand)) = Self::declaration(line) else {
                continue;
            };
            if is_control_keyword(&name) || HARNESS_CALLS.contains(&name.as_str()) {
                continue;
            }

            let (signature, _) = join_signature(&lines, idx, 10);
            if shorthand
                && (signature.contains("=>")
                    || signature.contains("function")
                    || !signature.trim_end().ends_with('{'))
            {
                continue;
            }

            let span = match extract_brace_body(&lines, idx, 3) {
                Some(span) => span,
                // Expression-bodied arrow: `const f = (a) => a * 2;`
                None if signature.contains("=>") => BodySpan {
                    start_line: idx + 1,
                    end_line: idx + 1,
                    text: line.to_string(),
                },
                None => continue,
            };

            let name_at = signature.find(name.as_str()).unwrap_or(0);
            let open = signature[name_at..].find('(').map(|p| p + name_at);
            let parameters = open
                .and_then(|open| balanced_args(&signature, open))
                .map(|list| self.parse_parameters(list))
                .unwrap_or_default();
            let return_type = open.and_then(|open| Self::return_type(&signature, open));

            let class_name = classes
                .iter()
                .filter(|(span, _)| span.start_line - 1 < idx && idx < span.end_line)
                .last()
                .map(|(_, class)| class.clone());

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
            .filter_map(|param| PARAM.captures(param.trim()))
            .map(|caps| Parameter {
                name: caps[1].to_string(),
                param_type: caps
                    .get(2)
                    .map(|m| m.as_str().trim().to_string())
                    .unwrap_or_else(|| "any".to_string()),
                default_value: caps
                    .get(3)
                    .map(|m| m.as_str().trim().to_string())
                    .filter(|v| !v.is_empty()),
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
        export class PriceCalculator {
            constructor(private readonly rate: number) {}

            calculateDiscount(price: number, isPremium: boolean = false): number {
                if (price <= 0) {
                    throw new Error("Price must be positive");
                }
                return price * 0.85;
            }
        }

        export function add(a: number, b: number): number {
            return a + b;
        }

        export const double = (n: number) => n * 2;

        const log = async (message: string) => {
            console.log(message);
        };
    "#};

    const TEST: &str = indoc! {r#"
        import { describe, it, expect } from 'vitest';

        describe('PriceCalculator', () => {
            it('applies premium discount', () => {
                const calc = new PriceCalculator(0.1);
                expect(calc.calculateDiscount(100, true)).toBe(90);
            });

            it('rejects negative prices', () => {
                expect(() => calc.calculateDiscount(-1)).toThrow('Price must be positive');
            });

            it('adds', () => expect(add(2, 3)).toBe(5));
        });
    "#};

    #[test]
    fn test_extract_methods_with_classes_and_arrows() {
        let parser = JavaScriptParser::typescript();
        let parsed = parser.parse(SOURCE, &PathBuf::from("price.ts"));
        let names: Vec<&str> = parsed.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["calculateDiscount", "add", "double", "log"]);

        let discount = &parsed.methods[0];
        assert_eq!(discount.class_name.as_deref(), Some("PriceCalculator"));
        assert_eq!(discount.return_type.as_deref(), Some("number"));
        assert_eq!(discount.line_number, 4);
        assert_eq!(discount.end_line, 9);
        assert_eq!(discount.parameters[1].name, "isPremium");
        assert_eq!(discount.parameters[1].param_type, "boolean");
        assert_eq!(discount.parameters[1].default_value.as_deref(), Some("false"));

        assert_eq!(parsed.methods[1].class_name, None);
        assert_eq!(parsed.methods[2].body, "export const double = (n: number) => n * 2;");
    }

    #[test]
    fn test_extract_tests_including_one_liners() {
        let parser = JavaScriptParser::typescript();
        let parsed = parser.parse(TEST, &PathBuf::from("price.test.ts"));
        assert_eq!(parsed.tests.len(), 3);
        assert_eq!(parsed.tests[0].name, "applies premium discount");
        assert_eq!(parsed.tests[0].framework, TestFramework::Vitest);

        let eq = &parsed.tests[0].assertions[0];
        assert_eq!(eq.assertion_type, AssertionType::Equals);
        assert_eq!(eq.expected.as_deref(), Some("90"));
        assert_eq!(eq.actual.as_deref(), Some("calc.calculateDiscount(100, true)"));

        assert_eq!(parsed.tests[1].assertions[0].assertion_type, AssertionType::Throws);
        assert_eq!(parsed.tests[2].line_number, parsed.tests[2].end_line);
        assert_eq!(parsed.tests[2].assertions[0].expected.as_deref(), Some("5"));
        assert!(parsed.methods.is_empty());
    }

    fn one(line: &str) -> Assertion {
        let found = JavaScriptParser::javascript().extract_assertions(line, 1, TestFramework::Jest);
        assert_eq!(found.len(), 1, "expected exactly one assertion for {line}");
        found.into_iter().next().unwrap()
    }

    #[test]
    fn test_every_idiom_yields_one_assertion() {
        assert_eq!(one("expect(total).toEqual(42);").assertion_type, AssertionType::Equals);
        assert_eq!(one("expect(obj).toStrictEqual({ a: 1 });").assertion_type, AssertionType::Equals);
        assert_eq!(one("expect(pi).toBeCloseTo(3.14, 2);").expected.as_deref(), Some("3.14"));
        assert_eq!(one("await expect(load()).resolves.toBe(7);").expected.as_deref(), Some("7"));
        assert_eq!(one("expect(x).not.toBe(3);").assertion_type, AssertionType::Other);
        assert_eq!(one("expect(fn).toThrow(TypeError);").expected.as_deref(), Some("TypeError"));
        assert_eq!(one("expect(ok).toBeTruthy();").expected.as_deref(), Some("true"));
        assert_eq!(one("expect(ok).toBeFalsy();").expected.as_deref(), Some("false"));
        assert_eq!(one("expect(list).toContain('a');").assertion_type, AssertionType::Contains);
        assert_eq!(one("expect(list).toHaveLength(2);").assertion_type, AssertionType::Other);
        assert_eq!(one("expect(value).toBeNull();").assertion_type, AssertionType::Other);

        let chai = one("expect(result).to.deep.equal([1, 2]);");
        assert_eq!(chai.assertion_type, AssertionType::Equals);
        assert_eq!(chai.expected.as_deref(), Some("[1, 2]"));
        assert_eq!(one("expect(flag).to.be.true;").assertion_type, AssertionType::Truthy);
        assert_eq!(one("expect(flag).to.be.false;").expected.as_deref(), Some("false"));
        assert_eq!(one("expect(name).to.include('bob');").assertion_type, AssertionType::Contains);
        assert_eq!(one("expect(run).to.throw(Error);").assertion_type, AssertionType::Throws);

        let node = one("assert.strictEqual(add(1, 2), 3);");
        assert_eq!((node.expected.as_deref(), node.actual.as_deref()), (Some("3"), Some("add(1, 2)")));
        assert_eq!(one("assert.notEqual(a, b);").assertion_type, AssertionType::Other);
        assert_eq!(one("assert.throws(() => run(), RangeError);").expected.as_deref(), Some("RangeError"));
        assert_eq!(one("assert.ok(isValid);").actual.as_deref(), Some("isValid"));
        assert_eq!(one("assert.isFalse(done);").expected.as_deref(), Some("false"));
        assert_eq!(one("assert.include(text, 'x');").assertion_type, AssertionType::Contains);
        assert_eq!(one("assert(count > 0);").assertion_type, AssertionType::Truthy);
    }

    #[test]
    fn test_parse_parameters_shapes() {
        let params = JavaScriptParser::typescript()
            .parse_parameters("{ a, b }: Opts, cb: (x: number) => void, ...rest: string[], n = 3");
        let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["{ a, b }", "cb", "rest", "n"]);
        assert_eq!(params[1].param_type, "(x: number) => void");
        assert_eq!(params[1].default_value, None);
        assert_eq!(params[3].param_type, "any");
        assert_eq!(params[3].default_value.as_deref(), Some("3"));
    }
}
