//! Analysis pipeline: discover, parse, correlate, analyze every pair.
//!
//! File parsing fans out on rayon. Pair analysis fans out on tokio, one task
//! per pair; each task runs its own detection cascade strictly in order and
//! shares nothing mutable with the others. Results come back in discovery
//! order.

pub mod discovery;
pub mod extract;
pub mod report;

pub use discovery::{discover_files, project_root_for, FileWalker};
pub use report::{AnalysisReport, PairDetails, PairMutationReport, PairReport, ReportSummary};

use crate::ai::AiBridge;
use crate::config::TestVerdictConfig;
use crate::core::{
    AnalysisResult, CodeBehavior, DivergenceResult, GitContext, ParsedFile, TestExpectation,
    TestSourcePair,
};
use crate::correlation::correlate;
use crate::detection::{DetectionInput, DivergenceDetector};
use crate::errors::Result;
use crate::git::{fetch_git_context_with_blame, GitService};
use crate::mutation::MutationAnalyzer;
use crate::observability::{
    increment_processed, set_current_file, set_current_test, set_phase, set_phase_persistent,
    set_progress, AnalysisPhase,
};
use crate::parsers::parse_source;
use crate::runner::TestRunSummary;
use crate::verdict::environment::{analysis_failed, insufficient_data, screen_failure};
use crate::verdict::VerdictEngine;
use indicatif::ProgressBar;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, debug_span, error, info, warn, Instrument};

/// One parsed file and the text it came from.
#[derive(Clone, Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: Arc<str>,
    pub parsed: ParsedFile,
}

/// Correlated pairs plus the file texts the detectors may consult.
#[derive(Clone, Debug, Default)]
pub struct Workspace {
    pub pairs: Vec<TestSourcePair>,
    pub sources: HashMap<PathBuf, Arc<str>>,
}

/// Unreadable files are logged and left out of the correlation pool.
pub fn load_files(files: &[PathBuf]) -> Vec<SourceFile> {
    files
        .par_iter()
        .filter_map(|path| {
            let _file = set_current_file(path);
            read_and_parse(path)
        })
        .collect()
}

fn read_and_parse(path: &Path) -> Option<SourceFile> {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            let parsed = parse_source(&text, path);
            Some(SourceFile {
                path: path.to_path_buf(),
                text: Arc::from(text),
                parsed,
            })
        }
        Err(err) => {
            warn!(path = %path.display(), "Failed to read file: {}", err);
            None
        }
    }
}

/// Correlate every test against every method and keep pairs at or above
/// `min_confidence`.
pub fn build_workspace(files: Vec<SourceFile>, min_confidence: f64) -> Workspace {
    let tests: Vec<_> = files.iter().flat_map(|f| f.parsed.tests.iter().cloned()).collect();
    let methods: Vec<_> = files.iter().flat_map(|f| f.parsed.methods.iter().cloned()).collect();
    debug!(tests = tests.len(), methods = methods.len(), "Correlating");

    let pairs: Vec<_> = correlate(&tests, &methods)
        .into_iter()
        .filter(|pair| {
            let keep = pair.confidence >= min_confidence;
            if !keep {
                debug!(
                    test = %pair.test.name,
                    confidence = pair.confidence,
                    "Correlation below threshold"
                );
            }
            keep
        })
        .collect();

    let sources = files.into_iter().map(|f| (f.path, f.text)).collect();
    Workspace { pairs, sources }
}

pub struct Pipeline {
    min_confidence: f64,
    exclude_patterns: Vec<String>,
    progress: ProgressBar,
    analyzer: Arc<PairAnalyzer>,
}

impl Pipeline {
    pub fn new(config: &TestVerdictConfig, git: Arc<dyn GitService>) -> Self {
        Self {
            min_confidence: config.correlation.min_confidence,
            exclude_patterns: Vec::new(),
            progress: ProgressBar::hidden(),
            analyzer: Arc::new(PairAnalyzer {
                ai: None,
                git,
                test_run: None,
                history_limit: config.git.history_limit,
                detector: DivergenceDetector::new(None),
                verdicts: VerdictEngine::new(None),
            }),
        }
    }

    /// Enable the AI stage, expectation summaries and fix suggestions.
    pub fn with_ai(mut self, ai: Option<Arc<dyn AiBridge>>) -> Self {
        self.update_analyzer(|analyzer| {
            analyzer.detector = DivergenceDetector::new(ai.clone());
            analyzer.verdicts = VerdictEngine::new(ai.clone());
            analyzer.ai = ai;
        });
        self
    }

    /// Real failures from a test run, fed to the first detection stage.
    pub fn with_test_run(mut self, summary: TestRunSummary) -> Self {
        self.update_analyzer(|analyzer| analyzer.test_run = Some(summary));
        self
    }

    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    /// Advanced once per analyzed pair.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    fn update_analyzer(&mut self, update: impl FnOnce(&mut PairAnalyzer)) {
        // Builders run before any task holds a clone.
        if let Some(analyzer) = Arc::get_mut(&mut self.analyzer) {
            update(analyzer);
        }
    }

    /// Discover, parse and correlate without analyzing.
    pub fn prepare(&self, paths: &[PathBuf]) -> Result<Workspace> {
        let files = {
            let _phase = set_phase(AnalysisPhase::FileDiscovery);
            discover_files(paths, &self.exclude_patterns)?
        };
        info!(files = files.len(), "Discovered source files");
        let loaded = {
            let _phase = set_phase(AnalysisPhase::Parsing);
            load_files(&files)
        };
        let _phase = set_phase(AnalysisPhase::Correlation);
        let workspace = build_workspace(loaded, self.min_confidence);
        info!(pairs = workspace.pairs.len(), "Correlated test/source pairs");
        Ok(workspace)
    }

    pub async fn analyze_paths(&self, paths: &[PathBuf]) -> Result<AnalysisReport> {
        let workspace = self.prepare(paths)?;
        let results = self.analyze_pairs(workspace.pairs, &workspace.sources).await;
        Ok(AnalysisReport::new(results))
    }

    /// Every pair yields exactly one report, in input order.
    pub async fn analyze_pairs(
        &self,
        pairs: Vec<TestSourcePair>,
        sources: &HashMap<PathBuf, Arc<str>>,
    ) -> Vec<PairReport> {
        // Async: a guard could be dropped on another worker thread.
        set_phase_persistent(AnalysisPhase::PairAnalysis);
        set_progress(0, pairs.len());
        self.progress.set_length(pairs.len() as u64);
        self.progress.set_message("Analyzing pairs");
        let mut unfinished: HashMap<usize, TestSourcePair> = HashMap::with_capacity(pairs.len());
        let mut tasks = JoinSet::new();
        for (index, pair) in pairs.into_iter().enumerate() {
            unfinished.insert(index, pair.clone());
            let analyzer = Arc::clone(&self.analyzer);
            let source_text = sources.get(&pair.source.file_path).cloned();
            let span = debug_span!("pair", test = %pair.test.name, source = %pair.source.name);
            tasks.spawn(
                async move { (index, analyzer.analyze(pair, source_text).await) }.instrument(span),
            );
        }

        let mut indexed = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            increment_processed();
            self.progress.inc(1);
            match joined {
                Ok((index, report)) => {
                    unfinished.remove(&index);
                    indexed.push((index, report));
                }
                Err(err) => error!("Pair analysis task failed: {}", err),
            }
        }
        self.progress.finish_and_clear();
        // A panicked task still owes its pair a verdict.
        indexed.extend(unfinished.into_iter().map(|(index, pair)| {
            let verdict = analysis_failed(&pair);
            (index, PairReport::new(bare_result(pair, verdict.confidence, None), verdict))
        }));
        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, report)| report).collect()
    }

    /// Static mutation analysis for every correlated pair.
    pub fn mutation_reports(&self, paths: &[PathBuf]) -> Result<Vec<PairMutationReport>> {
        let workspace = self.prepare(paths)?;
        let _phase = set_phase(AnalysisPhase::MutationAnalysis);
        let analyzer = MutationAnalyzer;
        Ok(workspace
            .pairs
            .par_iter()
            .map(|pair| {
                let _test = set_current_test(&pair.test.name);
                let file_text = workspace.sources.get(&pair.source.file_path).map(|t| &**t);
                PairMutationReport::new(pair, analyzer.analyze_with_file(pair, file_text))
            })
            .collect())
    }
}

struct PairAnalyzer {
    ai: Option<Arc<dyn AiBridge>>,
    git: Arc<dyn GitService>,
    test_run: Option<TestRunSummary>,
    history_limit: usize,
    detector: DivergenceDetector,
    verdicts: VerdictEngine,
}

impl PairAnalyzer {
    async fn analyze(&self, pair: TestSourcePair, source_text: Option<Arc<str>>) -> PairReport {
        if let Some(verdict) = insufficient_data(&pair) {
            let analysis = bare_result(pair, verdict.confidence, None);
            return PairReport::new(analysis, verdict);
        }

        let failure_message = self
            .test_run
            .as_ref()
            .and_then(|run| run.failure_message_for(&pair.test.name))
            .map(String::from);

        if let Some(verdict) = failure_message
            .as_deref()
            .and_then(|message| screen_failure(message, &pair))
        {
            let analysis = bare_result(pair, verdict.confidence, failure_message);
            return PairReport::new(analysis, verdict);
        }

        let divergence = {
            let input = DetectionInput::new(&pair)
                .with_real_error(failure_message.as_deref())
                .with_source_file(source_text.as_deref());
            self.detector.detect(&input).await
        };
        let (expectation, behavior) = self.describe(&pair).await;
        let git_context = self.git_context(&pair).await;

        let analysis = AnalysisResult {
            pair,
            expectation,
            behavior,
            divergence,
            git_context,
            failure_message,
        };
        let verdict = self.verdicts.determine(&analysis).await;
        PairReport::new(analysis, verdict)
    }

    /// AI summaries when the bridge answers, static ones otherwise.
    async fn describe(&self, pair: &TestSourcePair) -> (TestExpectation, CodeBehavior) {
        let static_expectation = || extract::expectation_from_assertions(&pair.test);
        let static_behavior = || extract::behavior_from_body(&pair.source);

        let Some(ai) = &self.ai else {
            return (static_expectation(), static_behavior());
        };
        if !ai.check_availability().await {
            return (static_expectation(), static_behavior());
        }

        let expectation = ai
            .analyze_test_expectation(&pair.test.body)
            .await
            .unwrap_or_else(|err| {
                debug!("AI expectation summary unavailable: {}", err);
                static_expectation()
            });
        let behavior = ai
            .analyze_code_behavior(&pair.source.body)
            .await
            .unwrap_or_else(|err| {
                debug!("AI behaviour summary unavailable: {}", err);
                static_behavior()
            });
        (expectation, behavior)
    }

    async fn git_context(&self, pair: &TestSourcePair) -> GitContext {
        let git = Arc::clone(&self.git);
        let test_path = pair.test.file_path.clone();
        let source_path = pair.source.file_path.clone();
        let lines = (pair.source.line_number, pair.source.end_line.max(pair.source.line_number));
        let limit = self.history_limit;

        tokio::task::spawn_blocking(move || {
            fetch_git_context_with_blame(git.as_ref(), &test_path, &source_path, lines, limit)
        })
        .await
        .unwrap_or_else(|err| {
            warn!("Git lookup failed: {}", err);
            GitContext::default()
        })
    }
}

fn bare_result(
    pair: TestSourcePair,
    confidence: f64,
    failure_message: Option<String>,
) -> AnalysisResult {
    AnalysisResult {
        pair,
        expectation: TestExpectation::default(),
        behavior: CodeBehavior::default(),
        divergence: DivergenceResult::none(confidence, "Divergence detection skipped"),
        git_context: GitContext::default(),
        failure_message,
    }
}

/// Directory the test runner should start in for `paths`.
pub fn runner_root(paths: &[PathBuf]) -> PathBuf {
    paths
        .first()
        .map(|p| project_root_for(p))
        .unwrap_or_else(|| Path::new(".").to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::VerdictType;
    use crate::runner::{TestResult, TestStatus};
    use crate::testkit::{commit_at, sample_pair, FakeAiBridge, FakeGitService};
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn pipeline(git: FakeGitService) -> Pipeline {
        Pipeline::new(&TestVerdictConfig::default(), Arc::new(git))
    }

    fn write_project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(
            dir.path().join("src/pricing.py"),
            indoc! {"
                def apply_discount(price):
                    return price * 0.85


                def flat_fee():
                    return 10
            "},
        )
        .unwrap();
        fs::write(
            dir.path().join("src/test_pricing.py"),
            indoc! {"
                from pricing import apply_discount, flat_fee


                def test_apply_discount():
                    assert apply_discount(100) == 90


                def test_flat_fee():
                    assert flat_fee() == 10
            "},
        )
        .unwrap();
        dir
    }

    #[tokio::test]
    async fn test_analyze_paths_reports_every_pair_in_order() {
        let dir = write_project();
        let report = pipeline(FakeGitService::new())
            .analyze_paths(&[dir.path().to_path_buf()])
            .await
            .unwrap();

        let names: Vec<_> = report.results.iter().map(|r| r.test_name.as_str()).collect();
        assert_eq!(names, vec!["test_apply_discount", "test_flat_fee"]);
        assert_eq!(report.results[0].verdict, VerdictType::CodeBug);
        assert_eq!(report.results[1].verdict, VerdictType::Passed);
        assert_eq!(report.summary.total, 2);
    }

    #[tokio::test]
    async fn test_missing_first_path_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = pipeline(FakeGitService::new())
            .analyze_paths(&[dir.path().join("nope.py")])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_min_confidence_filters_pairs() {
        let dir = write_project();
        let mut config = TestVerdictConfig::default();
        config.correlation.min_confidence = 0.99;
        let workspace = Pipeline::new(&config, Arc::new(FakeGitService::new()))
            .prepare(&[dir.path().to_path_buf()])
            .unwrap();
        assert!(workspace.pairs.is_empty());
    }

    #[tokio::test]
    async fn test_environment_failure_short_circuits_detection() {
        let pair = sample_pair("assertEquals(90, calc.calculate(100));", "return price * 0.85;");
        let run = TestRunSummary::from_results(
            vec![TestResult {
                name: "CalcTest.testCalculate".into(),
                file: None,
                status: TestStatus::Failed,
                duration_ms: None,
                error_message: Some("java.net.ConnectException: ECONNREFUSED".into()),
            }],
            10,
            String::new(),
        );
        let git = FakeGitService::new();
        let reports = pipeline(git.clone())
            .with_test_run(run)
            .analyze_pairs(vec![pair], &HashMap::new())
            .await;
        assert_eq!(reports[0].verdict, VerdictType::EnvironmentIssue);
        assert_eq!(git.history_calls(), 0);
    }

    #[tokio::test]
    async fn test_git_history_drives_outdated_verdict() {
        let pair = sample_pair("assertEquals(90, calc.calculate(100));", "return price * 0.85;");
        let git = FakeGitService::new()
            .with_commit(
                "src/main/java/Calc.java",
                commit_at("s1", "feat: update discount policy to 15%", 200),
            )
            .with_commit("src/test/java/CalcTest.java", commit_at("t1", "test: discount", 100));
        let reports = pipeline(git).analyze_pairs(vec![pair], &HashMap::new()).await;
        assert_eq!(reports[0].verdict, VerdictType::OutdatedTest);
        assert!(!reports[0].regression);
    }

    #[tokio::test]
    async fn test_ai_summaries_fall_back_to_static() {
        let pair = sample_pair("assertEquals(10, calc.calculate(1));", "return 10;");
        let ai = Arc::new(FakeAiBridge::failing());
        let reports = pipeline(FakeGitService::new())
            .with_ai(Some(ai))
            .analyze_pairs(vec![pair], &HashMap::new())
            .await;
        let details = reports[0].details.as_ref().unwrap();
        assert_eq!(details.analysis.behavior.return_behavior, "Returns 10");
        assert_eq!(reports[0].verdict, VerdictType::Passed);
    }

    struct CrashingBridge;

    #[async_trait::async_trait]
    impl AiBridge for CrashingBridge {
        async fn ask(&self, _prompt: &str) -> std::result::Result<String, crate::errors::AiError> {
            panic!("bridge crashed");
        }

        async fn check_availability(&self) -> bool {
            panic!("bridge crashed");
        }
    }

    #[tokio::test]
    async fn test_crashed_pair_still_gets_a_verdict() {
        let pairs = vec![
            sample_pair("assertEquals(90, calc.calculate(100));", "return price * 0.85;"),
            sample_pair("assertEquals(10, calc.calculate(1));", "return 10;"),
        ];
        let reports = pipeline(FakeGitService::new())
            .with_ai(Some(Arc::new(CrashingBridge)))
            .analyze_pairs(pairs, &HashMap::new())
            .await;

        assert_eq!(reports.len(), 2);
        for report in &reports {
            assert_eq!(report.verdict, VerdictType::EnvironmentIssue);
            assert_eq!(report.confidence, 0.3);
            assert!(report.reasoning.starts_with("Analysis did not complete"));
        }
    }

    #[test]
    fn test_mutation_reports_cover_each_pair() {
        let dir = write_project();
        let reports = pipeline(FakeGitService::new())
            .mutation_reports(&[dir.path().to_path_buf()])
            .unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.report.total > 0));
    }
}
