use super::{apply_overrides, load_settings};
use crate::ai::{AiBridge, CliAiBridge};
use crate::cli::OutputFormat;
use crate::config::TestVerdictConfig;
use crate::git::Git2Service;
use crate::observability::{set_phase, AnalysisPhase};
use crate::output;
use crate::pipeline::{runner_root, Pipeline};
use crate::progress::{ProgressConfig, ProgressManager, TEMPLATE_PAIR_ANALYSIS};
use crate::runner::{CommandTestRunner, TestRunSummary, TestRunner};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub struct AnalyzeConfig {
    pub paths: Vec<PathBuf>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub no_ai: bool,
    pub min_confidence: Option<f64>,
    pub run_tests: bool,
    pub detailed: bool,
    pub exclude: Vec<String>,
    pub config: Option<PathBuf>,
}

pub async fn handle_analyze(config: AnalyzeConfig) -> Result<()> {
    let mut settings = apply_overrides(load_settings(config.config.as_deref())?, config.min_confidence)?;
    if config.no_ai {
        settings.ai.enabled = false;
    }

    // JSON on stdout must not interleave with bar redraws.
    let quiet = config.format == OutputFormat::Json && config.output.is_none();
    let progress = ProgressManager::new(ProgressConfig::from_env(quiet));

    let ai = build_ai_bridge(&settings).await;
    let mut pipeline = Pipeline::new(&settings, Arc::new(Git2Service::new()))
        .with_ai(ai)
        .with_exclude_patterns(config.exclude)
        .with_progress(progress.create_bar(0, TEMPLATE_PAIR_ANALYSIS));
    if config.run_tests {
        let spinner = progress.create_spinner("Running project tests");
        let summary = run_project_tests(&config.paths).await;
        spinner.finish_and_clear();
        if let Some(summary) = summary {
            pipeline = pipeline.with_test_run(summary);
        }
    }

    let report = pipeline
        .analyze_paths(&config.paths)
        .await
        .context("analysis failed")?;
    let _ = progress.clear();

    let _phase = set_phase(AnalysisPhase::OutputGeneration);
    let rendered = match config.format {
        OutputFormat::Json => output::report_json(&report, config.detailed)?,
        OutputFormat::Table => {
            output::render_report(&report, config.output.is_none() && output::supports_color())
        }
    };
    output::emit(&rendered, config.output.as_deref())
}

/// `None` when disabled or when the tool is not installed.
pub async fn build_ai_bridge(settings: &TestVerdictConfig) -> Option<Arc<dyn AiBridge>> {
    if !settings.ai.enabled {
        return None;
    }
    let bridge = CliAiBridge::new(&settings.ai, settings.retry.clone());
    if bridge.check_availability().await {
        info!(command = %bridge.command(), "AI bridge available");
        Some(Arc::new(bridge))
    } else {
        info!(command = %bridge.command(), "AI tool not found, continuing without AI");
        None
    }
}

/// A failed or undetectable run only costs the real-error stage.
async fn run_project_tests(paths: &[PathBuf]) -> Option<TestRunSummary> {
    let root = runner_root(paths);
    let Some(runner) = CommandTestRunner::detect(&root) else {
        warn!(root = %root.display(), "No test framework detected, skipping test run");
        return None;
    };
    match runner.run_tests().await {
        Ok(summary) => {
            info!(
                total = summary.total,
                failed = summary.failed,
                "Test run complete"
            );
            Some(summary)
        }
        Err(err) => {
            warn!("Test run failed: {}", err);
            None
        }
    }
}
