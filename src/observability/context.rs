//! Thread-local context tracking for crash reports.
//!
//! Phase, file and test live in thread-local storage so rayon workers each
//! carry their own. Progress is global and counts analyzed pairs.

use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

static PAIRS_PROCESSED: AtomicUsize = AtomicUsize::new(0);
static PAIRS_TOTAL: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static CURRENT_CONTEXT: RefCell<AnalysisContext> = const { RefCell::new(AnalysisContext::new()) };
}

/// What this thread was doing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisContext {
    pub phase: Option<AnalysisPhase>,
    pub current_file: Option<PathBuf>,
    pub current_test: Option<String>,
}

impl AnalysisContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: None,
            current_file: None,
            current_test: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisPhase {
    FileDiscovery,
    Parsing,
    Correlation,
    PairAnalysis,
    MutationAnalysis,
    OutputGeneration,
}

impl std::fmt::Display for AnalysisPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileDiscovery => write!(f, "file_discovery"),
            Self::Parsing => write!(f, "parsing"),
            Self::Correlation => write!(f, "correlation"),
            Self::PairAnalysis => write!(f, "pair_analysis"),
            Self::MutationAnalysis => write!(f, "mutation_analysis"),
            Self::OutputGeneration => write!(f, "output_generation"),
        }
    }
}

/// Restores the previous context on drop.
pub struct ContextGuard {
    previous: AnalysisContext,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        CURRENT_CONTEXT.with(|ctx| {
            *ctx.borrow_mut() = self.previous.clone();
        });
    }
}

fn update(change: impl FnOnce(&mut AnalysisContext)) -> ContextGuard {
    CURRENT_CONTEXT.with(|ctx| {
        let previous = ctx.borrow().clone();
        change(&mut ctx.borrow_mut());
        ContextGuard { previous }
    })
}

#[must_use]
pub fn set_phase(phase: AnalysisPhase) -> ContextGuard {
    update(|ctx| ctx.phase = Some(phase))
}

/// Set the phase until the next change, without a guard.
pub fn set_phase_persistent(phase: AnalysisPhase) {
    CURRENT_CONTEXT.with(|ctx| ctx.borrow_mut().phase = Some(phase));
}

#[must_use]
pub fn set_current_file(path: impl Into<PathBuf>) -> ContextGuard {
    let path = path.into();
    update(|ctx| ctx.current_file = Some(path))
}

#[must_use]
pub fn set_current_test(name: impl Into<String>) -> ContextGuard {
    let name = name.into();
    update(|ctx| ctx.current_test = Some(name))
}

pub fn set_progress(processed: usize, total: usize) {
    PAIRS_PROCESSED.store(processed, Ordering::Relaxed);
    PAIRS_TOTAL.store(total, Ordering::Relaxed);
}

pub fn increment_processed() {
    PAIRS_PROCESSED.fetch_add(1, Ordering::Relaxed);
}

#[must_use]
pub fn get_current_context() -> AnalysisContext {
    CURRENT_CONTEXT.with(|ctx| ctx.borrow().clone())
}

/// `(processed, total)` pairs.
#[must_use]
pub fn get_progress() -> (usize, usize) {
    (
        PAIRS_PROCESSED.load(Ordering::Relaxed),
        PAIRS_TOTAL.load(Ordering::Relaxed),
    )
}
