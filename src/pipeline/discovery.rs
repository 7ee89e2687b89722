//! Source file discovery.

use crate::core::Language;
use crate::errors::{Error, Result};
use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct FileWalker {
    root: PathBuf,
    exclude_patterns: Vec<String>,
}

impl FileWalker {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            exclude_patterns: vec![],
        }
    }

    /// Gitignore-style globs to skip, on top of `.gitignore`.
    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    pub fn walk(&self) -> Result<Vec<PathBuf>> {
        let mut overrides = OverrideBuilder::new(&self.root);
        for pattern in &self.exclude_patterns {
            overrides
                .add(&format!("!{pattern}"))
                .map_err(|e| Error::Configuration(format!("bad exclude pattern '{pattern}': {e}")))?;
        }
        let overrides = overrides
            .build()
            .map_err(|e| Error::Configuration(e.to_string()))?;

        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .filter_entry(|entry| entry.file_name() != ".git")
            .overrides(overrides)
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Skipping unreadable entry: {}", err);
                    continue;
                }
            };
            let path = entry.path();
            if path.is_file() && Language::from_path(path).is_some() {
                files.push(path.to_path_buf());
            }
        }
        Ok(files)
    }
}

/// Every recognised source file under `paths`, sorted and de-duplicated.
///
/// The first path must exist; later missing paths are skipped with a warning.
pub fn discover_files(paths: &[PathBuf], exclude_patterns: &[String]) -> Result<Vec<PathBuf>> {
    if let Some(first) = paths.first() {
        if !first.exists() {
            return Err(Error::io_at(
                io::Error::new(io::ErrorKind::NotFound, "path does not exist"),
                first,
            ));
        }
    }

    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(
                FileWalker::new(path.clone())
                    .with_exclude_patterns(exclude_patterns.to_vec())
                    .walk()?,
            );
        } else if path.is_file() {
            if Language::from_path(path).is_some() {
                files.push(path.clone());
            } else {
                debug!(path = %path.display(), "Unrecognised extension, skipping");
            }
        } else {
            warn!(path = %path.display(), "Path does not exist, skipping");
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

pub fn project_root_for(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.to_path_buf()
    } else {
        path.parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
