//! Test runner collaborator.
//!
//! Only used to obtain real failure messages; analysis works without it.

mod command;
pub mod detect;
pub mod parse;

pub use command::CommandTestRunner;
pub use detect::{detect_runner, RunnerKind};

use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub name: String,
    pub file: Option<PathBuf>,
    pub status: TestStatus,
    pub duration_ms: Option<u64>,
    pub error_message: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
    pub raw_output: String,
}

impl TestRunSummary {
    pub fn from_results(results: Vec<TestResult>, duration_ms: u64, raw_output: String) -> Self {
        let count = |status: TestStatus| results.iter().filter(|r| r.status == status).count();
        Self {
            total: results.len(),
            passed: count(TestStatus::Passed),
            failed: count(TestStatus::Failed),
            skipped: count(TestStatus::Skipped),
            duration_ms,
            results,
            raw_output,
        }
    }

    /// Error text of the failed result matching `test_name`.
    pub fn failure_message_for(&self, test_name: &str) -> Option<&str> {
        self.results
            .iter()
            .filter(|r| r.status == TestStatus::Failed)
            .find(|r| parse::names_match(&r.name, test_name))
            .and_then(|r| r.error_message.as_deref())
    }
}

#[async_trait]
pub trait TestRunner: Send + Sync {
    async fn run_tests(&self) -> Result<TestRunSummary>;

    async fn run_test_file(&self, path: &Path) -> Result<TestRunSummary>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, status: TestStatus, message: Option<&str>) -> TestResult {
        TestResult {
            name: name.to_string(),
            file: None,
            status,
            duration_ms: None,
            error_message: message.map(String::from),
        }
    }

    #[test]
    fn test_summary_counts_and_lookup() {
        let summary = TestRunSummary::from_results(
            vec![
                result("testAdd", TestStatus::Passed, None),
                result("CalcTest.testDiscount", TestStatus::Failed, Some("expected: <90> but was: <85>")),
                result("testSlow", TestStatus::Skipped, None),
            ],
            120,
            String::new(),
        );
        assert_eq!((summary.total, summary.passed, summary.failed, summary.skipped), (3, 1, 1, 1));
        assert_eq!(
            summary.failure_message_for("testDiscount"),
            Some("expected: <90> but was: <85>")
        );
        assert_eq!(summary.failure_message_for("testAdd"), None);
    }
}
