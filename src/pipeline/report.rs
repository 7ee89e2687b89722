use crate::core::{AnalysisResult, TestSourcePair, Verdict, VerdictType};
use crate::mutation::MutationReport;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Presentation-facing record for one analyzed pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairReport {
    pub test_name: String,
    pub test_file: PathBuf,
    pub source_method: String,
    pub source_file: PathBuf,
    pub verdict: VerdictType,
    pub confidence: f64,
    pub reasoning: String,
    pub suggestions: Vec<String>,
    pub regression: bool,
    /// Full analysis behind the verdict, omitted from compact output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Box<PairDetails>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairDetails {
    pub analysis: AnalysisResult,
    pub verdict: Verdict,
}

impl PairReport {
    pub fn new(analysis: AnalysisResult, verdict: Verdict) -> Self {
        let pair = &analysis.pair;
        let mut suggestions = vec![verdict.recommendation.description.clone()];
        if let Some(fix) = &verdict.recommendation.suggested_fix {
            suggestions.push(fix.clone());
        }
        let reasoning = if verdict.explanation.is_empty() {
            verdict.reason.clone()
        } else {
            format!("{}. {}", verdict.reason.trim_end_matches('.'), verdict.explanation)
        };

        Self {
            test_name: pair.test.name.clone(),
            test_file: pair.test.file_path.clone(),
            source_method: pair.source.name.clone(),
            source_file: pair.source.file_path.clone(),
            verdict: verdict.verdict_type,
            confidence: verdict.confidence,
            reasoning,
            suggestions,
            regression: verdict.is_regression,
            details: Some(Box::new(PairDetails { analysis, verdict })),
        }
    }

    pub fn without_details(mut self) -> Self {
        self.details = None;
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total: usize,
    pub code_bug: usize,
    pub outdated_test: usize,
    pub flaky_test: usize,
    pub environment_issue: usize,
    pub passed: usize,
    pub regressions: usize,
}

impl ReportSummary {
    pub fn from_results(results: &[PairReport]) -> Self {
        results.iter().fold(Self::default(), |mut summary, report| {
            summary.total += 1;
            match report.verdict {
                VerdictType::CodeBug => summary.code_bug += 1,
                VerdictType::OutdatedTest => summary.outdated_test += 1,
                VerdictType::FlakyTest => summary.flaky_test += 1,
                VerdictType::EnvironmentIssue => summary.environment_issue += 1,
                VerdictType::Passed => summary.passed += 1,
            }
            if report.regression {
                summary.regressions += 1;
            }
            summary
        })
    }

    /// Pairs needing a code or test change.
    pub fn actionable(&self) -> usize {
        self.code_bug + self.outdated_test
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub results: Vec<PairReport>,
    pub summary: ReportSummary,
}

impl AnalysisReport {
    pub fn new(results: Vec<PairReport>) -> Self {
        let summary = ReportSummary::from_results(&results);
        Self { results, summary }
    }

    pub fn by_verdict(&self, verdict: VerdictType) -> impl Iterator<Item = &PairReport> {
        self.results.iter().filter(move |r| r.verdict == verdict)
    }
}

/// Mutation score and weak spots for one pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairMutationReport {
    pub test_name: String,
    pub test_file: PathBuf,
    pub source_method: String,
    pub source_file: PathBuf,
    pub report: MutationReport,
}

impl PairMutationReport {
    pub fn new(pair: &TestSourcePair, report: MutationReport) -> Self {
        Self {
            test_name: pair.test.name.clone(),
            test_file: pair.test.file_path.clone(),
            source_method: pair.source.name.clone(),
            source_file: pair.source.file_path.clone(),
            report,
        }
    }
}
