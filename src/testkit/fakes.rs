//! In-memory collaborators.
//!
//! Both fakes count the calls made to them so tests can assert which code
//! paths ran, not just what came out.

use crate::ai::AiBridge;
use crate::core::{BlameInfo, CommitInfo};
use crate::errors::AiError;
use crate::git::GitService;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Clone, Debug)]
enum Behavior {
    Unavailable,
    Failing,
    Replying(String),
}

/// [`AiBridge`] with a canned reply.
pub struct FakeAiBridge {
    behavior: Behavior,
    ask_calls: AtomicUsize,
    prompts: RwLock<Vec<String>>,
}

impl FakeAiBridge {
    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            ask_calls: AtomicUsize::new(0),
            prompts: RwLock::new(Vec::new()),
        }
    }

    /// `check_availability` is false; `ask` reports the tool missing.
    pub fn unavailable() -> Self {
        Self::with_behavior(Behavior::Unavailable)
    }

    /// Available, but every request fails.
    pub fn failing() -> Self {
        Self::with_behavior(Behavior::Failing)
    }

    pub fn replying(reply: &str) -> Self {
        Self::with_behavior(Behavior::Replying(reply.to_string()))
    }

    pub fn ask_calls(&self) -> usize {
        self.ask_calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.read().clone()
    }
}

#[async_trait]
impl AiBridge for FakeAiBridge {
    async fn ask(&self, prompt: &str) -> Result<String, AiError> {
        self.ask_calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.write().push(prompt.to_string());
        match &self.behavior {
            Behavior::Unavailable => Err(AiError::NotInstalled {
                command: "fake-ai".to_string(),
            }),
            Behavior::Failing => Err(AiError::Process {
                message: "fake failure".to_string(),
            }),
            Behavior::Replying(reply) => Ok(reply.clone()),
        }
    }

    async fn check_availability(&self) -> bool {
        !matches!(self.behavior, Behavior::Unavailable)
    }
}

/// [`GitService`] over a fixed set of commits per path.
#[derive(Clone, Default)]
pub struct FakeGitService {
    commits: Arc<RwLock<HashMap<PathBuf, Vec<CommitInfo>>>>,
    blame: Arc<RwLock<HashMap<PathBuf, Vec<BlameInfo>>>>,
    history_calls: Arc<AtomicUsize>,
}

impl FakeGitService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_commit(self, path: impl Into<PathBuf>, commit: CommitInfo) -> Self {
        self.commits.write().entry(path.into()).or_default().push(commit);
        self
    }

    pub fn with_blame(self, path: impl Into<PathBuf>, lines: Vec<BlameInfo>) -> Self {
        self.blame.write().insert(path.into(), lines);
        self
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }
}

impl GitService for FakeGitService {
    fn history(&self, path: &Path, limit: usize) -> Vec<CommitInfo> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        let mut history = self.commits.read().get(path).cloned().unwrap_or_default();
        history.sort_by(|a, b| b.date.cmp(&a.date));
        history.truncate(limit);
        history
    }

    fn blame(&self, path: &Path, start_line: usize, end_line: usize) -> Vec<BlameInfo> {
        self.blame
            .read()
            .get(path)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|b| (start_line..=end_line).contains(&b.line))
            .collect()
    }
}
