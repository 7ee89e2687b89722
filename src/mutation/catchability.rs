//! Would the test notice this mutation?

use super::{Mutation, MutationOutcome, MutationType};
use crate::core::{Assertion, AssertionType};
use crate::detection::expression::{numeric_literals, parse_numeric};
use once_cell::sync::Lazy;
use regex::Regex;

/// A literal this close to the original means the test pins it.
const PIN_TOLERANCE: f64 = 0.01;

/// Relative change a tolerance-style assertion is assumed to notice.
const TOLERANCE_DELTA: f64 = 0.1;

static TOLERANCE_STYLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)closeTo|approx|AlmostEqual|InDelta|InEpsilon|Within|\bassertEquals\s*\([^,]+,[^,]+,[^,)]+\)|\bAreEqual\s*\([^,]+,[^,]+,[^,)]+\)",
    )
    .unwrap()
});

static RESULT_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:result|actual|expected)\b|\d").unwrap());

static BOOLEAN_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)true|false|truthy|falsy").unwrap());

/// Assertions that could plausibly observe a mutation of this kind.
pub fn relevant_assertions<'a>(kind: MutationType, assertions: &'a [Assertion]) -> Vec<&'a Assertion> {
    assertions
        .iter()
        .filter(|a| match kind {
            MutationType::NumericChange | MutationType::ReturnValue => RESULT_WORDS.is_match(&a.raw),
            MutationType::BooleanFlip => {
                a.assertion_type == AssertionType::Truthy || BOOLEAN_WORDS.is_match(&a.raw)
            }
            MutationType::OperatorSwap
            | MutationType::BoundaryShift
            | MutationType::ConditionNegation => true,
        })
        .collect()
}

pub fn judge(mutation: Mutation, assertions: &[Assertion]) -> MutationOutcome {
    let relevant = relevant_assertions(mutation.mutation_type, assertions);
    let (caught, confidence, reason) = match mutation.mutation_type {
        MutationType::NumericChange => judge_numeric(&mutation, &relevant),
        MutationType::ReturnValue => {
            if relevant.iter().any(|a| a.assertion_type == AssertionType::Equals) {
                (true, 0.9, "Return value is compared for equality".to_string())
            } else {
                (false, 0.6, "No equality assertion observes the return value".to_string())
            }
        }
        MutationType::OperatorSwap => {
            if relevant.iter().any(|a| has_numeric_expectation(a)) {
                (true, 0.8, "A numeric expectation depends on this operator".to_string())
            } else if !relevant.is_empty() {
                (true, 0.6, "Assertions observe the result indirectly".to_string())
            } else {
                (false, 0.7, "No assertion observes this operator".to_string())
            }
        }
        MutationType::BoundaryShift => {
            let boundaries = numeric_literals(&mutation.original);
            let probes_boundary = relevant.iter().any(|a| {
                numeric_literals(&a.raw)
                    .iter()
                    .any(|n| boundaries.iter().any(|b| (n - b).abs() < PIN_TOLERANCE))
            });
            if probes_boundary {
                (true, 0.75, "Test exercises the boundary value".to_string())
            } else {
                (false, 0.7, "Boundary value is never tested".to_string())
            }
        }
        MutationType::BooleanFlip => {
            if relevant.is_empty() {
                (false, 0.7, "No assertion checks a boolean outcome".to_string())
            } else {
                (true, 0.85, "Boolean outcome is asserted".to_string())
            }
        }
        MutationType::ConditionNegation => {
            if relevant.iter().any(|a| a.assertion_type == AssertionType::Throws) {
                (true, 0.85, "Negated branch changes whether an exception is thrown".to_string())
            } else if !relevant.is_empty() {
                (true, 0.7, "Negated branch changes the asserted outcome".to_string())
            } else {
                (false, 0.7, "No assertion depends on this branch".to_string())
            }
        }
    };

    MutationOutcome {
        mutation,
        caught,
        confidence,
        reason,
    }
}

fn judge_numeric(mutation: &Mutation, relevant: &[&Assertion]) -> (bool, f64, String) {
    let Some(original) = mutation.original_value else {
        return (false, 0.5, "Original value unknown".to_string());
    };
    let pinned = relevant.iter().any(|a| {
        numeric_literals(&a.raw)
            .iter()
            .any(|n| (n - original).abs() < PIN_TOLERANCE)
    });
    if pinned {
        return (true, 0.95, format!("Assertion pins the value {original}"));
    }

    let delta = mutation
        .mutated_value
        .filter(|_| original != 0.0)
        .map(|m| ((m - original) / original).abs())
        .unwrap_or(0.0);
    let tolerant = relevant.iter().any(|a| TOLERANCE_STYLE.is_match(&a.raw));
    if tolerant && delta >= TOLERANCE_DELTA - 1e-9 {
        return (
            true,
            0.7,
            format!("A {:.0}% change exceeds the assertion tolerance", delta * 100.0),
        );
    }
    (false, 0.7, format!("No assertion pins the value {original}"))
}

fn has_numeric_expectation(assertion: &Assertion) -> bool {
    assertion.assertion_type == AssertionType::Equals
        && assertion.expected.as_deref().and_then(parse_numeric).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::generate_mutations;

    fn assertion(kind: AssertionType, expected: Option<&str>, raw: &str) -> Assertion {
        Assertion {
            assertion_type: kind,
            expected: expected.map(String::from),
            actual: None,
            line_number: 1,
            raw: raw.into(),
        }
    }

    fn first(source: &str, kind: MutationType) -> Mutation {
        generate_mutations(source, 1)
            .into_iter()
            .find(|m| m.mutation_type == kind)
            .unwrap()
    }

    #[test]
    fn test_pinned_literal_is_caught_with_high_confidence() {
        let assertions = [assertion(
            AssertionType::Equals,
            Some("15"),
            "assertEquals(15, order.fee())",
        )];
        let outcome = judge(first("int fee = 15;", MutationType::NumericChange), &assertions);
        assert!(outcome.caught);
        assert_eq!(outcome.confidence, 0.95);
    }

    #[test]
    fn test_unpinned_literal_is_missed() {
        let assertions = [assertion(
            AssertionType::Equals,
            Some("120"),
            "assertEquals(120, order.total())",
        )];
        let outcome = judge(first("int fee = 15;", MutationType::NumericChange), &assertions);
        assert!(!outcome.caught);
    }

    #[test]
    fn test_boundary_needs_a_probe_at_the_boundary() {
        let probe = [assertion(AssertionType::Truthy, Some("true"), "assertTrue(isAdult(18))")];
        let elsewhere = [assertion(AssertionType::Truthy, Some("true"), "assertTrue(isAdult(40))")];
        let mutation = first("return age >= 18;", MutationType::BoundaryShift);
        assert!(judge(mutation.clone(), &probe).caught);
        assert!(!judge(mutation, &elsewhere).caught);
    }

    #[test]
    fn test_boolean_flip_needs_boolean_assertion() {
        let truthy = [assertion(AssertionType::Truthy, Some("true"), "assertTrue(svc.enabled())")];
        let mutation = first("this.enabled = true;", MutationType::BooleanFlip);
        assert!(judge(mutation.clone(), &truthy).caught);
        assert!(!judge(mutation, &[]).caught);
    }

    #[test]
    fn test_condition_negation_with_throws() {
        let throws = [assertion(
            AssertionType::Throws,
            Some("IllegalArgumentException.class"),
            "assertThrows(IllegalArgumentException.class, () -> svc.run(-1))",
        )];
        let outcome = judge(first("if (n < 0) {", MutationType::ConditionNegation), &throws);
        assert!(outcome.caught);
        assert_eq!(outcome.confidence, 0.85);
    }
}
