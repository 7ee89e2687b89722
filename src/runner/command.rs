use super::detect::{detect_runner, RunnerKind};
use super::parse::parse_output;
use super::{TestRunSummary, TestRunner};
use crate::errors::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, info};

/// Runs the project's own test command and parses its console output.
pub struct CommandTestRunner {
    project_root: PathBuf,
    kind: RunnerKind,
}

impl CommandTestRunner {
    pub fn new(project_root: impl Into<PathBuf>, kind: RunnerKind) -> Self {
        Self {
            project_root: project_root.into(),
            kind,
        }
    }

    /// `None` when no known manifest is present.
    pub fn detect(project_root: &Path) -> Option<Self> {
        detect_runner(project_root).map(|kind| Self::new(project_root, kind))
    }

    pub fn kind(&self) -> RunnerKind {
        self.kind
    }

    async fn run(&self, extra_args: Vec<String>) -> Result<TestRunSummary> {
        let (program, args) = self.kind.command();
        info!(runner = ?self.kind, root = %self.project_root.display(), "Running tests");
        let started = Instant::now();

        let output = Command::new(program)
            .args(args)
            .args(&extra_args)
            .current_dir(&self.project_root)
            .output()
            .await
            .map_err(|e| Error::Runner(format!("failed to start {}: {}", program, e)))?;

        // Failing tests exit non-zero; that is a result, not an error.
        let mut raw_output = String::from_utf8_lossy(&output.stdout).into_owned();
        raw_output.push_str(&String::from_utf8_lossy(&output.stderr));
        let results = parse_output(self.kind, &raw_output);
        debug!(
            status = %output.status,
            parsed = results.len(),
            "Test run finished"
        );
        Ok(TestRunSummary::from_results(
            results,
            started.elapsed().as_millis() as u64,
            raw_output,
        ))
    }
}

#[async_trait]
impl TestRunner for CommandTestRunner {
    async fn run_tests(&self) -> Result<TestRunSummary> {
        self.run(Vec::new()).await
    }

    async fn run_test_file(&self, path: &Path) -> Result<TestRunSummary> {
        let relative = path.strip_prefix(&self.project_root).unwrap_or(path);
        self.run(self.kind.file_args(relative)).await
    }
}
