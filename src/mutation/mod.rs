//! Static mutation analysis.
//!
//! Mutations are never applied or executed. Each candidate change to the
//! method is judged against the test's assertions to decide whether the test
//! would notice it, which gives a mutation score and a list of weak spots.

pub mod catchability;
pub mod generate;
pub mod value_mismatch;
pub mod weak_spots;

pub use catchability::judge;
pub use generate::generate_mutations;
pub use value_mismatch::{detect_value_mismatch, ValueMismatch, ValueMismatchKind};
pub use weak_spots::{find_weak_spots, Severity, WeakSpot};

use crate::core::TestSourcePair;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MutationType {
    NumericChange,
    OperatorSwap,
    BoundaryShift,
    BooleanFlip,
    ReturnValue,
    ConditionNegation,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mutation {
    #[serde(rename = "type")]
    pub mutation_type: MutationType,
    pub line: usize,
    pub original: String,
    pub mutated: String,
    pub description: String,
    /// Literal before and after, for numeric changes.
    pub original_value: Option<f64>,
    pub mutated_value: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationOutcome {
    pub mutation: Mutation,
    pub caught: bool,
    pub confidence: f64,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationReport {
    pub total: usize,
    pub caught: usize,
    /// `caught / total`, 1.0 when there was nothing to mutate.
    pub mutation_score: f64,
    pub mutations: Vec<MutationOutcome>,
    pub weak_spots: Vec<WeakSpot>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MutationAnalyzer;

impl MutationAnalyzer {
    pub fn analyze(&self, pair: &TestSourcePair) -> MutationReport {
        self.analyze_with_file(pair, None)
    }

    /// Mutate the method body, or the whole file when no body was located.
    pub fn analyze_with_file(&self, pair: &TestSourcePair, file_text: Option<&str>) -> MutationReport {
        let (text, first_line) = match file_text {
            Some(file) if pair.source.body.trim().is_empty() => (file, 1),
            _ => (pair.source.body.as_str(), pair.source.line_number),
        };

        let outcomes: Vec<MutationOutcome> = generate_mutations(text, first_line)
            .into_iter()
            .map(|mutation| judge(mutation, &pair.test.assertions))
            .collect();
        let caught = outcomes.iter().filter(|o| o.caught).count();
        let total = outcomes.len();
        let mutation_score = if total == 0 {
            1.0
        } else {
            caught as f64 / total as f64
        };
        let weak_spots = find_weak_spots(&outcomes);

        debug!(
            test = %pair.test.name,
            method = %pair.source.name,
            total,
            caught,
            "Mutation analysis complete"
        );

        MutationReport {
            total,
            caught,
            mutation_score,
            mutations: outcomes,
            weak_spots,
        }
    }
}
