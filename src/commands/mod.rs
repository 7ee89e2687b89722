//! CLI command implementations.
//!
//! - **analyze**: classify every correlated test/source pair
//! - **mutations**: static mutation score and weak spots per pair
//! - **init**: write a default configuration file

pub mod analyze;
pub mod init;
pub mod mutations;

pub use analyze::{handle_analyze, AnalyzeConfig};
pub use init::init_config;
pub use mutations::{handle_mutations, MutationsConfig};

use crate::config::{load_config, parse_config, TestVerdictConfig};
use anyhow::{anyhow, Context, Result};
use std::path::Path;

/// An explicit file must parse; otherwise search upward, falling back to
/// defaults.
pub fn load_settings(config_path: Option<&Path>) -> Result<TestVerdictConfig> {
    match config_path {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            parse_config(&contents).map_err(|e| anyhow!("{}: {}", path.display(), e))
        }
        None => Ok(load_config()),
    }
}

/// Apply a `--min-confidence` override and re-validate.
pub fn apply_overrides(
    mut settings: TestVerdictConfig,
    min_confidence: Option<f64>,
) -> Result<TestVerdictConfig> {
    if let Some(min) = min_confidence {
        settings.correlation.min_confidence = min;
    }
    settings.validate().map_err(|e| anyhow!(e))?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_config_must_parse() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[correlation]\nmin_confidence = 0.75\n").unwrap();
        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.correlation.min_confidence, 0.75);

        std::fs::write(&path, "[correlation\n").unwrap();
        assert!(load_settings(Some(&path)).is_err());
        assert!(load_settings(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_min_confidence_override_is_validated() {
        let settings = apply_overrides(TestVerdictConfig::default(), Some(0.9)).unwrap();
        assert_eq!(settings.correlation.min_confidence, 0.9);
        assert!(apply_overrides(TestVerdictConfig::default(), Some(1.5)).is_err());
    }
}
