//! Best-effort extraction of per-test outcomes from runner console output.

use super::detect::RunnerKind;
use super::{TestResult, TestStatus};
use once_cell::sync::Lazy;
use regex::Regex;
use std::iter::Peekable;
use std::path::PathBuf;

static JS_RESULT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([✓√✔]|[✕×✗✖]|○)\s+(?:skipped\s+)?(.+?)(?:\s+\((\d+)\s*ms\))?\s*$").unwrap()
});
static JS_FAILURE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:●|\d+\))\s+(.+?):?\s*$").unwrap());

static PYTEST_RESULT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(PASSED|FAILED|SKIPPED|ERROR)\s+(\S+?)(?:\s+-\s+(.*))?$").unwrap()
});

static GO_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^=== RUN\s+(\S+)").unwrap());
static GO_RESULT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*--- (PASS|FAIL|SKIP): (\S+) \(([\d.]+)s\)").unwrap());

static CARGO_RESULT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^test (\S+) \.\.\. (ok|FAILED|ignored)").unwrap());
static CARGO_STDOUT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^---- (\S+) stdout ----$").unwrap());

static SUREFIRE_FAILURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[ERROR\]\s+(\w+)\.(\w+)(?::(\d+))?\s+(.*)$").unwrap());
static GRADLE_RESULT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+) > (\w+)\(\)\s+(PASSED|FAILED|SKIPPED)").unwrap());

static DOTNET_RESULT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(Passed|Failed|Skipped)\s+(\S+)(?:\s+\[([\d.]+)\s*m?s\])?").unwrap());

pub fn parse_output(kind: RunnerKind, output: &str) -> Vec<TestResult> {
    match kind {
        RunnerKind::Jest | RunnerKind::Vitest | RunnerKind::Mocha => parse_javascript(output),
        RunnerKind::Pytest => parse_pytest(output),
        RunnerKind::GoTest => parse_go(output),
        RunnerKind::Cargo => parse_cargo(output),
        RunnerKind::Maven | RunnerKind::Gradle => parse_junit(output),
        RunnerKind::Dotnet => parse_dotnet(output),
    }
}

fn result(name: &str, status: TestStatus) -> TestResult {
    TestResult {
        name: name.trim().to_string(),
        file: None,
        status,
        duration_ms: None,
        error_message: None,
    }
}

/// Attach `message` to the failed result whose name matches `name`.
fn attach_message(results: &mut [TestResult], name: &str, message: String) {
    if message.trim().is_empty() {
        return;
    }
    if let Some(r) = results
        .iter_mut()
        .find(|r| r.status == TestStatus::Failed && names_match(&r.name, name))
    {
        r.error_message.get_or_insert(message);
    }
}

/// Exact, or one name is a `::`/`.`/` › ` qualified form of the other.
pub(crate) fn names_match(a: &str, b: &str) -> bool {
    let a = a.trim();
    let b = b.trim();
    if a == b {
        return true;
    }
    let last = |s: &str| -> String {
        s.rsplit([':', '.', '›', '/', '>'])
            .next()
            .unwrap_or(s)
            .trim()
            .to_string()
    };
    !last(a).is_empty() && last(a) == last(b)
}

/// Consume lines up to (not including) the first one matching `stop`.
fn collect_block<'a>(
    lines: &mut Peekable<impl Iterator<Item = &'a str>>,
    stop: impl Fn(&str) -> bool,
) -> String {
    let mut block = Vec::new();
    while let Some(&line) = lines.peek() {
        if stop(line) {
            break;
        }
        block.push(line.trim());
        lines.next();
    }
    block
        .into_iter()
        .skip_while(|l| l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn parse_javascript(output: &str) -> Vec<TestResult> {
    let mut results: Vec<TestResult> = output
        .lines()
        .filter_map(|line| {
            let caps = JS_RESULT.captures(line)?;
            let status = match &caps[1] {
                "✓" | "√" | "✔" => TestStatus::Passed,
                "○" => TestStatus::Skipped,
                _ => TestStatus::Failed,
            };
            let mut r = result(&caps[2], status);
            r.duration_ms = caps.get(3).and_then(|m| m.as_str().parse().ok());
            Some(r)
        })
        .collect();

    let mut lines = output.lines().peekable();
    while let Some(line) = lines.next() {
        if let Some(caps) = JS_FAILURE_HEADER.captures(line) {
            let name = caps[1].to_string();
            let message = collect_block(&mut lines, |l| {
                JS_FAILURE_HEADER.is_match(l) || l.trim_start().starts_with("at ")
            });
            if results.iter().all(|r| !names_match(&r.name, &name)) {
                results.push(result(&name, TestStatus::Failed));
            }
            attach_message(&mut results, &name, message);
        }
    }
    results
}

fn parse_pytest(output: &str) -> Vec<TestResult> {
    output
        .lines()
        .filter_map(|line| {
            let caps = PYTEST_RESULT.captures(line.trim_end())?;
            let status = match &caps[1] {
                "PASSED" => TestStatus::Passed,
                "SKIPPED" => TestStatus::Skipped,
                _ => TestStatus::Failed,
            };
            let id = &caps[2];
            let name = id.rsplit("::").next().unwrap_or(id);
            let mut r = result(name, status);
            r.file = id.split("::").next().filter(|f| f.contains('.')).map(PathBuf::from);
            r.error_message = caps.get(3).map(|m| m.as_str().trim().to_string());
            Some(r)
        })
        .collect()
}

fn parse_go(output: &str) -> Vec<TestResult> {
    let mut results = Vec::new();
    let mut logs: Vec<(String, Vec<String>)> = Vec::new();

    for line in output.lines() {
        if let Some(caps) = GO_RUN.captures(line) {
            logs.push((caps[1].to_string(), Vec::new()));
        } else if let Some(caps) = GO_RESULT.captures(line) {
            let status = match &caps[1] {
                "PASS" => TestStatus::Passed,
                "SKIP" => TestStatus::Skipped,
                _ => TestStatus::Failed,
            };
            let mut r = result(&caps[2], status);
            r.duration_ms = caps[3].parse::<f64>().ok().map(|s| (s * 1000.0) as u64);
            if status == TestStatus::Failed {
                r.error_message = logs
                    .iter()
                    .rev()
                    .find(|(name, _)| name == &caps[2])
                    .map(|(_, lines)| lines.join("\n"))
                    .filter(|m| !m.is_empty());
            }
            results.push(r);
        } else if line.starts_with("    ") {
            if let Some((_, lines)) = logs.last_mut() {
                lines.push(line.trim().to_string());
            }
        }
    }
    results
}

fn parse_cargo(output: &str) -> Vec<TestResult> {
    let mut results: Vec<TestResult> = output
        .lines()
        .filter_map(|line| {
            let caps = CARGO_RESULT.captures(line)?;
            let status = match &caps[2] {
                "ok" => TestStatus::Passed,
                "ignored" => TestStatus::Skipped,
                _ => TestStatus::Failed,
            };
            Some(result(&caps[1], status))
        })
        .collect();

    let mut lines = output.lines().peekable();
    while let Some(line) = lines.next() {
        if let Some(caps) = CARGO_STDOUT.captures(line) {
            let name = caps[1].to_string();
            let message = collect_block(&mut lines, |l| {
                CARGO_STDOUT.is_match(l) || l.trim() == "failures:" || l.starts_with("note: run with")
            });
            attach_message(&mut results, &name, message);
        }
    }
    results
}

fn parse_junit(output: &str) -> Vec<TestResult> {
    let mut results: Vec<TestResult> = Vec::new();
    let mut lines = output.lines().peekable();
    while let Some(line) = lines.next() {
        if let Some(caps) = GRADLE_RESULT.captures(line) {
            let status = match &caps[3] {
                "PASSED" => TestStatus::Passed,
                "SKIPPED" => TestStatus::Skipped,
                _ => TestStatus::Failed,
            };
            let mut r = result(&caps[2], status);
            if status == TestStatus::Failed {
                let message = collect_block(&mut lines, |l| {
                    !l.starts_with(' ') || l.trim_start().starts_with("at ")
                });
                r.error_message = (!message.is_empty()).then_some(message);
            }
            results.push(r);
        } else if let Some(caps) = SUREFIRE_FAILURE.captures(line) {
            if caps[1].ends_with("Test") || caps[1].ends_with("Tests") || caps[1].starts_with("Test") {
                let mut r = result(&caps[2], TestStatus::Failed);
                r.error_message = Some(caps[4].trim().to_string());
                if results.iter().all(|existing| existing.name != r.name) {
                    results.push(r);
                }
            }
        }
    }
    results
}

fn parse_dotnet(output: &str) -> Vec<TestResult> {
    let mut results: Vec<TestResult> = Vec::new();
    let mut lines = output.lines().peekable();
    while let Some(line) = lines.next() {
        let Some(caps) = DOTNET_RESULT.captures(line) else {
            continue;
        };
        let status = match &caps[1] {
            "Passed" => TestStatus::Passed,
            "Skipped" => TestStatus::Skipped,
            _ => TestStatus::Failed,
        };
        let mut r = result(&caps[2], status);
        r.duration_ms = caps.get(3).and_then(|m| m.as_str().parse::<f64>().ok()).map(|ms| ms as u64);
        if status == TestStatus::Failed {
            while let Some(next) = lines.peek() {
                if next.trim() == "Error Message:" {
                    lines.next();
                    break;
                }
                if DOTNET_RESULT.is_match(next) {
                    break;
                }
                lines.next();
            }
            let message = collect_block(&mut lines, |l| {
                l.trim() == "Stack Trace:" || DOTNET_RESULT.is_match(l)
            });
            r.error_message = (!message.is_empty()).then_some(message);
        }
        results.push(r);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn failed<'a>(results: &'a [TestResult], name: &str) -> &'a TestResult {
        results
            .iter()
            .find(|r| r.status == TestStatus::Failed && r.name == name)
            .unwrap()
    }

    #[test]
    fn test_parse_jest() {
        let output = indoc! {"
             PASS  src/math.test.js
              Calculator
                ✓ adds numbers (3 ms)
                ✕ applies discount (5 ms)
                ○ skipped rounds prices

              ● Calculator › applies discount

                expect(received).toBe(expected) // Object.is equality

                Expected: 90
                Received: 85

                  at Object.<anonymous> (src/math.test.js:10:5)
        "};
        let results = parse_javascript(output);
        assert_eq!(results.len(), 3);
        let failure = failed(&results, "applies discount");
        assert_eq!(failure.duration_ms, Some(5));
        let message = failure.error_message.as_deref().unwrap();
        assert!(message.contains("Expected: 90"));
        assert!(message.contains("Received: 85"));
        assert!(!message.contains("at Object"));
    }

    #[test]
    fn test_parse_pytest() {
        let output = indoc! {"
            PASSED tests/test_calc.py::test_add
            FAILED tests/test_calc.py::test_discount - AssertionError: assert 85 == 90
            SKIPPED tests/test_calc.py::test_slow
        "};
        let results = parse_pytest(output);
        assert_eq!(results.len(), 3);
        let failure = failed(&results, "test_discount");
        assert_eq!(failure.file, Some(PathBuf::from("tests/test_calc.py")));
        assert_eq!(failure.error_message.as_deref(), Some("AssertionError: assert 85 == 90"));
    }

    #[test]
    fn test_parse_go() {
        let output = indoc! {"
            === RUN   TestAdd
            --- PASS: TestAdd (0.00s)
            === RUN   TestDiscount
                calc_test.go:14: expected 90, got 85
            --- FAIL: TestDiscount (0.01s)
            FAIL
        "};
        let results = parse_go(output);
        assert_eq!(results.len(), 2);
        let failure = failed(&results, "TestDiscount");
        assert_eq!(failure.error_message.as_deref(), Some("calc_test.go:14: expected 90, got 85"));
        assert_eq!(failure.duration_ms, Some(10));
    }

    #[test]
    fn test_parse_cargo() {
        let output = indoc! {"
            running 2 tests
            test calc::tests::adds ... ok
            test calc::tests::discount ... FAILED

            failures:

            ---- calc::tests::discount stdout ----
            thread 'calc::tests::discount' panicked at src/calc.rs:20:9:
            assertion `left == right` failed
              left: 85
             right: 90

            failures:
                calc::tests::discount
        "};
        let results = parse_cargo(output);
        let failure = failed(&results, "calc::tests::discount");
        let message = failure.error_message.as_deref().unwrap();
        assert!(message.contains("left: 85"));
        assert!(message.contains("right: 90"));
    }

    #[test]
    fn test_parse_maven_and_gradle() {
        let maven = "[ERROR]   DiscountServiceTest.testPremiumDiscount:25 expected: <90.0> but was: <85.0>\n";
        let results = parse_junit(maven);
        assert_eq!(
            failed(&results, "testPremiumDiscount").error_message.as_deref(),
            Some("expected: <90.0> but was: <85.0>")
        );

        let gradle = indoc! {"
            CalcTest > testAdd() PASSED
            CalcTest > testDiscount() FAILED
                org.opentest4j.AssertionFailedError: expected: <90> but was: <85>
                    at CalcTest.testDiscount(CalcTest.java:12)
        "};
        let results = parse_junit(gradle);
        assert_eq!(results.len(), 2);
        assert_eq!(
            failed(&results, "testDiscount").error_message.as_deref(),
            Some("org.opentest4j.AssertionFailedError: expected: <90> but was: <85>")
        );
    }

    #[test]
    fn test_parse_dotnet() {
        let output = indoc! {"
              Passed CalcTests.Adds [2 ms]
              Failed CalcTests.Discount [4 ms]
              Error Message:
               Assert.Equal() Failure
            Expected: 90
            Actual:   85
              Stack Trace:
                 at CalcTests.Discount() in CalcTests.cs:line 12
        "};
        let results = parse_dotnet(output);
        assert_eq!(results.len(), 2);
        let message = failed(&results, "CalcTests.Discount").error_message.clone().unwrap();
        assert!(message.starts_with("Assert.Equal() Failure"));
        assert!(message.contains("Actual:   85"));
    }

    #[test]
    fn test_names_match_qualified_forms() {
        assert!(names_match("calc::tests::discount", "discount"));
        assert!(names_match("Calculator › applies discount", "applies discount"));
        assert!(names_match("CalcTests.Discount", "Discount"));
        assert!(!names_match("discount", "rounding"));
    }
}
