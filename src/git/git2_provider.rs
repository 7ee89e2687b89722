//! [`GitService`] on top of libgit2.
//!
//! `git2::Repository` is neither `Send` nor `Sync`, so each lookup opens the
//! repository afresh. Repository discovery is memoized per directory for the
//! life of the service.

use super::GitService;
use crate::core::{BlameInfo, CommitInfo};
use chrono::{DateTime, TimeZone, Utc};
use dashmap::DashMap;
use git2::{BlameOptions, DiffOptions, Repository, Sort};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Default)]
pub struct Git2Service {
    /// Directory -> repository workdir, `None` when not inside a repository.
    repo_roots: DashMap<PathBuf, Option<PathBuf>>,
}

impl Git2Service {
    pub fn new() -> Self {
        Self::default()
    }

    /// Workdir of the repository containing `path`.
    pub fn repo_root(&self, path: &Path) -> Option<PathBuf> {
        let dir = containing_dir(path);
        if let Some(cached) = self.repo_roots.get(&dir) {
            return cached.clone();
        }
        let root = Repository::discover(&dir)
            .ok()
            .and_then(|repo| repo.workdir().map(normalize));
        if root.is_none() {
            debug!("{} is not inside a git repository", dir.display());
        }
        self.repo_roots.insert(dir, root.clone());
        root
    }

    pub fn is_repository(&self, path: &Path) -> bool {
        self.repo_root(path).is_some()
    }

    /// Repository handle and the path relative to its workdir.
    fn locate(&self, path: &Path) -> Option<(Repository, PathBuf)> {
        let root = self.repo_root(path)?;
        let repo = Repository::open(&root).ok()?;
        let relative = normalize(path).strip_prefix(&root).ok()?.to_path_buf();
        Some((repo, relative))
    }

    fn try_history(
        repo: &Repository,
        relative: &Path,
        limit: usize,
    ) -> Result<Vec<CommitInfo>, git2::Error> {
        let mut revwalk = repo.revwalk()?;
        revwalk.push_head()?;
        revwalk.set_sorting(Sort::TIME)?;

        Ok(revwalk
            .filter_map(|oid| oid.ok())
            .filter_map(|oid| repo.find_commit(oid).ok())
            .filter(|commit| commit_touches_file(repo, commit, relative))
            .take(limit)
            .map(|commit| to_commit_info(&commit))
            .collect())
    }

    fn try_blame(
        repo: &Repository,
        relative: &Path,
        start_line: usize,
        end_line: usize,
    ) -> Result<Vec<BlameInfo>, git2::Error> {
        let mut opts = BlameOptions::new();
        opts.track_copies_same_file(true)
            .min_line(start_line.max(1))
            .max_line(end_line.max(start_line.max(1)));
        let blame = repo.blame_file(relative, Some(&mut opts))?;

        let mut lines = Vec::new();
        for hunk in blame.iter() {
            let signature = hunk.final_signature();
            let author = signature.name().unwrap_or("Unknown").to_string();
            let commit = hunk.final_commit_id().to_string();
            let date = to_utc(signature.when().seconds());
            let first = hunk.final_start_line();
            for line in first..first + hunk.lines_in_hunk() {
                if (start_line..=end_line).contains(&line) {
                    lines.push(BlameInfo {
                        line,
                        author: author.clone(),
                        commit: commit.clone(),
                        date,
                    });
                }
            }
        }
        lines.sort_by_key(|b| b.line);
        Ok(lines)
    }
}

impl GitService for Git2Service {
    fn history(&self, path: &Path, limit: usize) -> Vec<CommitInfo> {
        let Some((repo, relative)) = self.locate(path) else {
            return Vec::new();
        };
        Self::try_history(&repo, &relative, limit).unwrap_or_else(|e| {
            debug!("No history for {}: {}", path.display(), e);
            Vec::new()
        })
    }

    fn blame(&self, path: &Path, start_line: usize, end_line: usize) -> Vec<BlameInfo> {
        let Some((repo, relative)) = self.locate(path) else {
            return Vec::new();
        };
        Self::try_blame(&repo, &relative, start_line, end_line).unwrap_or_else(|e| {
            debug!("No blame for {}: {}", path.display(), e);
            Vec::new()
        })
    }
}

fn containing_dir(path: &Path) -> PathBuf {
    let absolute = normalize(path);
    if absolute.is_dir() {
        return absolute;
    }
    absolute
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or(absolute)
}

/// Canonical when the path exists, otherwise made absolute lexically.
fn normalize(path: &Path) -> PathBuf {
    path.canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

fn to_utc(seconds: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, 0).single()
}

fn to_commit_info(commit: &git2::Commit) -> CommitInfo {
    CommitInfo {
        hash: commit.id().to_string(),
        message: commit.message().unwrap_or("").trim_end().to_string(),
        author: commit.author().name().unwrap_or("Unknown").to_string(),
        date: to_utc(commit.time().seconds()).unwrap_or_default(),
    }
}

/// The file exists in the commit's tree and differs from the first parent.
fn commit_touches_file(repo: &Repository, commit: &git2::Commit, file_path: &Path) -> bool {
    let Ok(tree) = commit.tree() else {
        return false;
    };
    if tree.get_path(file_path).is_err() {
        return false;
    }

    let parent_tree = commit.parents().next().and_then(|p| p.tree().ok());
    let mut diff_opts = DiffOptions::new();
    diff_opts.pathspec(file_path);

    repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut diff_opts))
        .map(|diff| diff.deltas().count() > 0)
        .unwrap_or(false)
}
