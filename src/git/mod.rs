//! Git history collaborator.
//!
//! Lookups never fail: a path outside a repository, or one that was never
//! committed, simply has no history.

mod git2_provider;

pub use git2_provider::Git2Service;

use crate::core::{BlameInfo, CommitInfo, GitContext};
use crate::verdict::intent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MoreRecent {
    First,
    Second,
    Same,
    /// At least one side has no history.
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModificationComparison {
    pub more_recent: MoreRecent,
    pub date_a: Option<DateTime<Utc>>,
    pub date_b: Option<DateTime<Utc>>,
}

impl ModificationComparison {
    pub fn from_dates(date_a: Option<DateTime<Utc>>, date_b: Option<DateTime<Utc>>) -> Self {
        let more_recent = match (date_a, date_b) {
            (Some(a), Some(b)) if a > b => MoreRecent::First,
            (Some(a), Some(b)) if a < b => MoreRecent::Second,
            (Some(_), Some(_)) => MoreRecent::Same,
            _ => MoreRecent::Unknown,
        };
        Self {
            more_recent,
            date_a,
            date_b,
        }
    }
}

pub trait GitService: Send + Sync {
    /// Commits touching `path`, newest first.
    fn history(&self, path: &Path, limit: usize) -> Vec<CommitInfo>;

    fn blame(&self, path: &Path, start_line: usize, end_line: usize) -> Vec<BlameInfo>;

    fn last_commit(&self, path: &Path) -> Option<CommitInfo> {
        self.history(path, 1).into_iter().next()
    }

    fn compare_last_modification(&self, path_a: &Path, path_b: &Path) -> ModificationComparison {
        ModificationComparison::from_dates(
            self.last_commit(path_a).map(|c| c.date),
            self.last_commit(path_b).map(|c| c.date),
        )
    }

    fn is_intentional_change(&self, message: &str) -> bool {
        intent::is_intentional_change(message)
    }
}

/// Both files' histories merged, de-duplicated by hash, newest first.
pub fn fetch_git_context(
    git: &dyn GitService,
    test_path: &Path,
    source_path: &Path,
    limit: usize,
) -> GitContext {
    let test_history = git.history(test_path, limit);
    let source_history = git.history(source_path, limit);

    let mut seen = HashSet::new();
    let mut recent_commits: Vec<CommitInfo> = test_history
        .iter()
        .chain(source_history.iter())
        .filter(|commit| seen.insert(commit.hash.clone()))
        .cloned()
        .collect();
    recent_commits.sort_by(|a, b| b.date.cmp(&a.date));
    recent_commits.truncate(limit);

    GitContext {
        test_commit: test_history.first().cloned(),
        source_commit: source_history.first().cloned(),
        recent_commits,
        blame: Vec::new(),
    }
}

/// Filled from [`fetch_git_context`] plus blame for a line range of the
/// source file.
pub fn fetch_git_context_with_blame(
    git: &dyn GitService,
    test_path: &Path,
    source_path: &Path,
    source_lines: (usize, usize),
    limit: usize,
) -> GitContext {
    let mut context = fetch_git_context(git, test_path, source_path, limit);
    context.blame = git.blame(source_path, source_lines.0, source_lines.1);
    context
}
