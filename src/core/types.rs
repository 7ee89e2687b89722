//! Value objects shared by every pipeline stage.
//!
//! Everything here is created once per analysis run and never mutated after
//! construction: files become [`ParsedFile`]s, tests and methods become
//! [`TestSourcePair`]s, pairs become a [`DivergenceResult`] and finally a
//! [`Verdict`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Test framework inferred from imports, attributes or decorators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestFramework {
    Junit4,
    Junit5,
    Testng,
    Jest,
    Vitest,
    Mocha,
    NodeTest,
    Pytest,
    Unittest,
    GoTest,
    Testify,
    RustTest,
    Nunit,
    Xunit,
    Mstest,
    Unknown,
}

impl TestFramework {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestFramework::Junit4 => "junit4",
            TestFramework::Junit5 => "junit5",
            TestFramework::Testng => "testng",
            TestFramework::Jest => "jest",
            TestFramework::Vitest => "vitest",
            TestFramework::Mocha => "mocha",
            TestFramework::NodeTest => "node-test",
            TestFramework::Pytest => "pytest",
            TestFramework::Unittest => "unittest",
            TestFramework::GoTest => "go-test",
            TestFramework::Testify => "testify",
            TestFramework::RustTest => "rust-test",
            TestFramework::Nunit => "nunit",
            TestFramework::Xunit => "xunit",
            TestFramework::Mstest => "mstest",
            TestFramework::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssertionType {
    Equals,
    Throws,
    Truthy,
    Contains,
    Other,
}

/// One assertion inside a test body, normalized across idioms.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assertion {
    #[serde(rename = "type")]
    pub assertion_type: AssertionType,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub line_number: usize,
    pub raw: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub name: String,
    pub file_path: PathBuf,
    pub line_number: usize,
    pub end_line: usize,
    pub framework: TestFramework,
    pub assertions: Vec<Assertion>,
    /// Raw text of the test, declaration through closing delimiter.
    pub body: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    pub default_value: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMethod {
    pub name: String,
    pub file_path: PathBuf,
    pub line_number: usize,
    pub end_line: usize,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    pub body: String,
    /// Enclosing class, impl target, receiver or module when known.
    pub class_name: Option<String>,
}

/// Output of one language parser for one file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedFile {
    pub tests: Vec<TestCase>,
    pub methods: Vec<SourceMethod>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CorrelationType {
    NamingConvention,
    CallGraph,
    ImportAnalysis,
    Annotation,
    DirectoryStructure,
    ExplicitReference,
}

impl CorrelationType {
    /// Correlation kinds that tie a test to a method by name or declaration.
    pub fn is_strong(&self) -> bool {
        matches!(
            self,
            CorrelationType::NamingConvention
                | CorrelationType::Annotation
                | CorrelationType::ExplicitReference
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSourcePair {
    pub test: TestCase,
    pub source: SourceMethod,
    pub confidence: f64,
    pub correlation_type: CorrelationType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DivergenceType {
    ReturnValueMismatch,
    ExceptionMismatch,
    StateMutation,
    MissingAssertion,
    IncorrectAssertion,
    TimingIssue,
}

impl std::fmt::Display for DivergenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DivergenceType::ReturnValueMismatch => "return value mismatch",
            DivergenceType::ExceptionMismatch => "exception mismatch",
            DivergenceType::StateMutation => "state mutation",
            DivergenceType::MissingAssertion => "missing assertion",
            DivergenceType::IncorrectAssertion => "incorrect assertion",
            DivergenceType::TimingIssue => "timing issue",
        };
        f.write_str(name)
    }
}

/// The single disagreement the pipeline commits to reporting for a pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Divergence {
    #[serde(rename = "type")]
    pub divergence_type: DivergenceType,
    pub description: String,
    pub test_line: usize,
    pub code_line: usize,
    pub expected: String,
    pub actual: String,
}

/// Detection stage that produced a [`DivergenceResult`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionStage {
    RealError,
    AiComparison,
    StaticAnalysis,
    MutationInference,
    NoDivergence,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DivergenceResult {
    pub has_divergence: bool,
    pub divergence: Option<Divergence>,
    pub confidence: f64,
    pub details: String,
    pub stage: DetectionStage,
}

impl DivergenceResult {
    pub fn found(
        divergence: Divergence,
        confidence: f64,
        details: impl Into<String>,
        stage: DetectionStage,
    ) -> Self {
        Self {
            has_divergence: true,
            divergence: Some(divergence),
            confidence,
            details: details.into(),
            stage,
        }
    }

    pub fn none(confidence: f64, details: impl Into<String>) -> Self {
        Self {
            has_divergence: false,
            divergence: None,
            confidence,
            details: details.into(),
            stage: DetectionStage::NoDivergence,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictType {
    CodeBug,
    OutdatedTest,
    FlakyTest,
    EnvironmentIssue,
    Passed,
}

impl VerdictType {
    pub fn label(&self) -> &'static str {
        match self {
            VerdictType::CodeBug => "CODE_BUG",
            VerdictType::OutdatedTest => "OUTDATED_TEST",
            VerdictType::FlakyTest => "FLAKY_TEST",
            VerdictType::EnvironmentIssue => "ENVIRONMENT_ISSUE",
            VerdictType::Passed => "PASSED",
        }
    }
}

impl std::fmt::Display for VerdictType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendedAction {
    FixCode,
    UpdateTest,
    AddRetry,
    CheckEnvironment,
    Investigate,
    NoAction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub action: RecommendedAction,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
    pub affected_files: Vec<PathBuf>,
    pub priority: Priority,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    #[serde(rename = "type")]
    pub verdict_type: VerdictType,
    pub confidence: f64,
    pub reason: String,
    pub explanation: String,
    pub recommendation: Recommendation,
    /// Set on CODE_BUG when the responsible commit looks like an accidental break.
    pub is_regression: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitInfo {
    pub hash: String,
    pub message: String,
    pub author: String,
    pub date: DateTime<Utc>,
}

impl CommitInfo {
    /// First line of the commit message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("").trim()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlameInfo {
    pub line: usize,
    pub author: String,
    pub commit: String,
    pub date: Option<DateTime<Utc>>,
}

/// Read-only history input to the verdict engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitContext {
    pub test_commit: Option<CommitInfo>,
    pub source_commit: Option<CommitInfo>,
    /// Both histories merged, de-duplicated by hash, newest first.
    pub recent_commits: Vec<CommitInfo>,
    pub blame: Vec<BlameInfo>,
}

/// What a test expects, from its assertions or from the AI bridge.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestExpectation {
    pub description: String,
    pub expected_inputs: Vec<String>,
    pub expected_outputs: Vec<String>,
    pub expected_exceptions: Vec<String>,
}

/// What the source method does, from its body or from the AI bridge.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeBehavior {
    pub description: String,
    pub side_effects: Vec<String>,
    pub return_behavior: String,
    pub error_conditions: Vec<String>,
}

/// Everything the verdict engine needs for one pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub pair: TestSourcePair,
    pub expectation: TestExpectation,
    pub behavior: CodeBehavior,
    pub divergence: DivergenceResult,
    pub git_context: GitContext,
    /// Failure text from a real test run, when one was available.
    pub failure_message: Option<String>,
}
