// Export modules for library usage
pub mod ai;
pub mod ast;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod correlation;
pub mod detection;
pub mod errors;
pub mod git;
pub mod mutation;
pub mod observability;
pub mod output;
pub mod parsers;
pub mod pipeline;
pub mod progress;
pub mod runner;
pub mod testkit;
pub mod verdict;

// Re-export commonly used types
pub use crate::core::{
    AnalysisResult, Assertion, AssertionType, CorrelationType, DetectionStage, Divergence,
    DivergenceResult, DivergenceType, GitContext, Language, ParsedFile, Priority,
    RecommendedAction, SourceMethod, TestCase, TestFramework, TestSourcePair, Verdict,
    VerdictType,
};

pub use crate::ai::{AiBridge, CliAiBridge};
pub use crate::config::TestVerdictConfig;
pub use crate::correlation::correlate;
pub use crate::detection::{DetectionInput, DivergenceDetector};
pub use crate::errors::{AiError, Error, Result};
pub use crate::git::{Git2Service, GitService};
pub use crate::mutation::{MutationAnalyzer, MutationReport};
pub use crate::parsers::{parse_file, parse_source};
pub use crate::pipeline::{AnalysisReport, PairReport, Pipeline, ReportSummary};
pub use crate::verdict::{classify, VerdictEngine};
