use super::{apply_overrides, load_settings};
use crate::cli::OutputFormat;
use crate::git::Git2Service;
use crate::observability::{set_phase, AnalysisPhase};
use crate::output;
use crate::pipeline::Pipeline;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

pub struct MutationsConfig {
    pub paths: Vec<PathBuf>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub min_confidence: Option<f64>,
    pub exclude: Vec<String>,
    pub config: Option<PathBuf>,
}

pub fn handle_mutations(config: MutationsConfig) -> Result<()> {
    let settings = apply_overrides(load_settings(config.config.as_deref())?, config.min_confidence)?;
    let reports = Pipeline::new(&settings, Arc::new(Git2Service::new()))
        .with_exclude_patterns(config.exclude)
        .mutation_reports(&config.paths)
        .context("mutation analysis failed")?;

    let _phase = set_phase(AnalysisPhase::OutputGeneration);
    let rendered = match config.format {
        OutputFormat::Json => output::mutations_json(&reports)?,
        OutputFormat::Table => {
            output::render_mutations(&reports, config.output.is_none() && output::supports_color())
        }
    };
    output::emit(&rendered, config.output.as_deref())
}
