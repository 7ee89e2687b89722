use super::{MutationOutcome, MutationType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

/// A source line whose mutations no assertion would catch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeakSpot {
    pub line: usize,
    pub code: String,
    pub severity: Severity,
    pub mutation_types: Vec<MutationType>,
    pub suggestion: String,
}

pub fn find_weak_spots(outcomes: &[MutationOutcome]) -> Vec<WeakSpot> {
    let mut by_line: BTreeMap<usize, Vec<&MutationOutcome>> = BTreeMap::new();
    for outcome in outcomes.iter().filter(|o| !o.caught) {
        by_line.entry(outcome.mutation.line).or_default().push(outcome);
    }

    by_line
        .into_iter()
        .map(|(line, missed)| {
            let mut types: Vec<MutationType> = missed.iter().map(|o| o.mutation.mutation_type).collect();
            types.sort();
            types.dedup();
            WeakSpot {
                line,
                code: missed[0].mutation.original.clone(),
                severity: severity(&types),
                suggestion: suggestion(types[0]).to_string(),
                mutation_types: types,
            }
        })
        .collect()
}

fn severity(types: &[MutationType]) -> Severity {
    let numeric = types.contains(&MutationType::NumericChange);
    let returns = types.contains(&MutationType::ReturnValue);
    match (numeric, returns) {
        (true, true) => Severity::High,
        (true, false) | (false, true) => Severity::Medium,
        (false, false) => Severity::Low,
    }
}

fn suggestion(kind: MutationType) -> &'static str {
    match kind {
        MutationType::NumericChange => "Assert the exact computed value so constant changes are detected",
        MutationType::OperatorSwap => "Add a case whose result differs when the operator changes",
        MutationType::BoundaryShift => "Test the values at and just beyond the boundary",
        MutationType::BooleanFlip => "Assert the boolean outcome explicitly",
        MutationType::ReturnValue => "Assert the return value rather than only calling the method",
        MutationType::ConditionNegation => "Cover both branches of the condition",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::Mutation;
    use pretty_assertions::assert_eq;

    fn outcome(line: usize, kind: MutationType, caught: bool) -> MutationOutcome {
        MutationOutcome {
            mutation: Mutation {
                mutation_type: kind,
                line,
                original: format!("line {line}"),
                mutated: String::new(),
                description: String::new(),
                original_value: None,
                mutated_value: None,
            },
            caught,
            confidence: 0.7,
            reason: String::new(),
        }
    }

    #[test]
    fn test_grouping_and_severity() {
        let spots = find_weak_spots(&[
            outcome(4, MutationType::ReturnValue, false),
            outcome(3, MutationType::BoundaryShift, false),
            outcome(4, MutationType::NumericChange, false),
            outcome(5, MutationType::NumericChange, true),
            outcome(6, MutationType::OperatorSwap, false),
            outcome(6, MutationType::NumericChange, false),
        ]);
        let summary: Vec<(usize, Severity)> = spots.iter().map(|s| (s.line, s.severity)).collect();
        assert_eq!(
            summary,
            vec![(3, Severity::Low), (4, Severity::High), (6, Severity::Medium)]
        );
        assert_eq!(
            spots[1].mutation_types,
            vec![MutationType::NumericChange, MutationType::ReturnValue]
        );
        assert!(spots[1].suggestion.contains("exact computed value"));
    }
}
