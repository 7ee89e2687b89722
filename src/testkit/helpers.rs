//! Factory functions for test data.
//!
//! | Helper | Purpose |
//! |--------|---------|
//! | [`sample_pair`] | Java pair from a test body and a method body |
//! | [`pair_from_sources`] | Parse two files and correlate a named test |
//! | [`commit_at`] | Commit with a fixed, ordered timestamp |

use crate::core::{
    CommitInfo, CorrelationType, SourceMethod, TestCase, TestFramework, TestSourcePair,
};
use crate::correlation::correlate;
use crate::parsers::java::JavaParser;
use crate::parsers::{parse_source, LanguageParser};
use chrono::{DateTime, TimeZone, Utc};
use std::path::{Path, PathBuf};

/// Commit dates from [`commit_at`] count seconds from this instant.
pub const BASE_EPOCH: i64 = 1_700_000_000;

/// A JUnit 5 test and a Java method, both starting on line 1.
///
/// The test body's assertions are extracted the way the Java parser would;
/// the pair correlates by call graph at 0.8.
pub fn sample_pair(test_body: &str, source_body: &str) -> TestSourcePair {
    let assertions = JavaParser.extract_assertions(test_body, 1, TestFramework::Junit5);
    TestSourcePair {
        test: TestCase {
            name: "testCalculate".to_string(),
            file_path: PathBuf::from("src/test/java/CalcTest.java"),
            line_number: 1,
            end_line: line_count(test_body),
            framework: TestFramework::Junit5,
            assertions,
            body: test_body.to_string(),
        },
        source: SourceMethod {
            name: "calculate".to_string(),
            file_path: PathBuf::from("src/main/java/Calc.java"),
            line_number: 1,
            end_line: line_count(source_body),
            parameters: Vec::new(),
            return_type: None,
            body: source_body.to_string(),
            class_name: Some("Calc".to_string()),
        },
        confidence: 0.8,
        correlation_type: CorrelationType::CallGraph,
    }
}

/// Parse a test file and a source file and return the pair correlated for
/// `test_name`.
pub fn pair_from_sources(
    test_path: &str,
    test_content: &str,
    source_path: &str,
    source_content: &str,
    test_name: &str,
) -> Option<TestSourcePair> {
    let test_file = parse_source(test_content, Path::new(test_path));
    let source_file = parse_source(source_content, Path::new(source_path));
    correlate(&test_file.tests, &source_file.methods)
        .into_iter()
        .find(|pair| pair.test.name == test_name)
}

/// A commit `offset_secs` after [`BASE_EPOCH`].
pub fn commit_at(hash: &str, message: &str, offset_secs: i64) -> CommitInfo {
    CommitInfo {
        hash: hash.to_string(),
        message: message.to_string(),
        author: "Test User".to_string(),
        date: epoch(BASE_EPOCH + offset_secs),
    }
}

fn epoch(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds, 0).single().unwrap_or_default()
}

fn line_count(text: &str) -> usize {
    text.lines().count().max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_pair_extracts_assertions() {
        let pair = sample_pair("assertEquals(90, calc.calculate(100));", "return 90;");
        assert_eq!(pair.test.assertions.len(), 1);
        assert_eq!(pair.test.assertions[0].expected.as_deref(), Some("90"));
        assert_eq!(pair.source.line_number, 1);
    }

    #[test]
    fn test_commit_at_orders_by_offset() {
        assert!(commit_at("b", "later", 10).date > commit_at("a", "earlier", 0).date);
    }
}
