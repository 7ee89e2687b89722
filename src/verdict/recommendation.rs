use crate::core::{
    Divergence, DivergenceType, Priority, Recommendation, RecommendedAction, TestSourcePair,
    VerdictType,
};
use std::path::PathBuf;

pub fn priority_for(divergence_type: Option<DivergenceType>) -> Priority {
    match divergence_type {
        Some(DivergenceType::ExceptionMismatch) => Priority::Critical,
        Some(DivergenceType::ReturnValueMismatch | DivergenceType::StateMutation) => Priority::High,
        Some(_) => Priority::Medium,
        None => Priority::Low,
    }
}

pub fn action_for(verdict_type: VerdictType) -> RecommendedAction {
    match verdict_type {
        VerdictType::CodeBug => RecommendedAction::FixCode,
        VerdictType::OutdatedTest => RecommendedAction::UpdateTest,
        VerdictType::FlakyTest => RecommendedAction::AddRetry,
        VerdictType::EnvironmentIssue => RecommendedAction::CheckEnvironment,
        VerdictType::Passed => RecommendedAction::NoAction,
    }
}

fn affected_files(action: RecommendedAction, pair: &TestSourcePair) -> Vec<PathBuf> {
    let test = pair.test.file_path.clone();
    let source = pair.source.file_path.clone();
    match action {
        RecommendedAction::FixCode => vec![source],
        RecommendedAction::UpdateTest | RecommendedAction::AddRetry => vec![test],
        RecommendedAction::CheckEnvironment | RecommendedAction::Investigate => vec![test, source],
        RecommendedAction::NoAction => Vec::new(),
    }
}

fn describe(action: RecommendedAction, pair: &TestSourcePair, divergence: Option<&Divergence>) -> String {
    let test = &pair.test.name;
    let method = &pair.source.name;
    match (action, divergence) {
        (RecommendedAction::UpdateTest, Some(d)) => format!(
            "Update {} to expect {} instead of {} (line {})",
            test, d.actual, d.expected, d.test_line
        ),
        (RecommendedAction::UpdateTest, None) => format!("Update {} to match {}", test, method),
        (RecommendedAction::FixCode, Some(d)) => format!(
            "Fix {} so it produces {} instead of {} (line {})",
            method, d.expected, d.actual, d.code_line
        ),
        (RecommendedAction::FixCode, None) => format!("Fix {} to satisfy {}", method, test),
        (RecommendedAction::AddRetry, _) => format!(
            "Stabilize {}: remove timing dependence or add a bounded retry",
            test
        ),
        (RecommendedAction::CheckEnvironment, _) => format!(
            "Check the environment {} runs in: dependencies, services and permissions",
            test
        ),
        (RecommendedAction::Investigate, _) => format!(
            "Not enough information to judge {} against {}; inspect both manually",
            test, method
        ),
        (RecommendedAction::NoAction, _) => "No action needed".to_string(),
    }
}

pub fn build_recommendation(
    verdict_type: VerdictType,
    action: RecommendedAction,
    pair: &TestSourcePair,
    divergence: Option<&Divergence>,
) -> Recommendation {
    let priority = match verdict_type {
        VerdictType::Passed => Priority::Low,
        VerdictType::EnvironmentIssue | VerdictType::FlakyTest => Priority::Medium,
        VerdictType::CodeBug | VerdictType::OutdatedTest => {
            priority_for(divergence.map(|d| d.divergence_type))
        }
    };
    Recommendation {
        action,
        description: describe(action, pair, divergence),
        suggested_fix: None,
        affected_files: affected_files(action, pair),
        priority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::sample_pair;

    #[test]
    fn test_priority_by_divergence_type() {
        assert_eq!(priority_for(Some(DivergenceType::ExceptionMismatch)), Priority::Critical);
        assert_eq!(priority_for(Some(DivergenceType::ReturnValueMismatch)), Priority::High);
        assert_eq!(priority_for(Some(DivergenceType::StateMutation)), Priority::High);
        assert_eq!(priority_for(Some(DivergenceType::TimingIssue)), Priority::Medium);
    }

    #[test]
    fn test_update_test_points_at_test_file() {
        let pair = sample_pair("assertEquals(90, calc.calculate(100));", "return price * 0.85;");
        let divergence = Divergence {
            divergence_type: DivergenceType::ReturnValueMismatch,
            description: "rate".into(),
            test_line: 1,
            code_line: 1,
            expected: "90".into(),
            actual: "85".into(),
        };
        let rec = build_recommendation(
            VerdictType::OutdatedTest,
            RecommendedAction::UpdateTest,
            &pair,
            Some(&divergence),
        );
        assert_eq!(rec.affected_files, vec![pair.test.file_path.clone()]);
        assert_eq!(rec.priority, Priority::High);
        assert!(rec.description.contains("expect 85 instead of 90"));
    }
}
