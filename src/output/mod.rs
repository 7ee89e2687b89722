//! Renderers over [`AnalysisReport`](crate::pipeline::AnalysisReport).

pub mod json;
pub mod terminal;

pub use json::{mutations_json, report_json};
pub use terminal::{render_mutations, render_report};

use anyhow::{Context, Result};
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

/// Print to stdout, or write to `output_file` creating parent directories.
pub fn emit(content: &str, output_file: Option<&Path>) -> Result<()> {
    match output_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
        }
        None => println!("{content}"),
    }
    Ok(())
}

/// `path` relative to `base` when it lies underneath it, otherwise unchanged.
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base)
        .filter(|rel| !rel.starts_with(".."))
        .unwrap_or_else(|| path.to_path_buf())
}

/// Shorten absolute paths under the working directory for display.
pub fn display_path(path: &Path) -> String {
    match std::env::current_dir() {
        Ok(cwd) => relative_to(path, &cwd).display().to_string(),
        Err(_) => path.display().to_string(),
    }
}

/// Colour only on an interactive stdout without `NO_COLOR` or `TERM=dumb`.
pub fn supports_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var("TERM").is_ok_and(|t| t == "dumb") {
        return false;
    }
    std::io::stdout().is_terminal()
}
