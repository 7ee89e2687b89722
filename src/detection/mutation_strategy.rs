//! Stage 4: infer a divergence from a constant change that would fix the test.

use super::{DetectionInput, DetectionStrategy};
use crate::ast::compare::format_number;
use crate::core::{DetectionStage, Divergence, DivergenceResult, DivergenceType};
use crate::mutation::detect_value_mismatch;
use async_trait::async_trait;

pub struct MutationStrategy;

#[async_trait]
impl DetectionStrategy for MutationStrategy {
    fn stage(&self) -> DetectionStage {
        DetectionStage::MutationInference
    }

    async fn detect(&self, input: &DetectionInput<'_>) -> Option<DivergenceResult> {
        let found = detect_value_mismatch(input.pair)?;
        Some(DivergenceResult::found(
            Divergence {
                divergence_type: DivergenceType::ReturnValueMismatch,
                description: found.description,
                test_line: found.test_line,
                code_line: found.code_line,
                expected: format_number(found.expected),
                actual: format_number(found.actual),
            },
            found.confidence,
            format!("Mutation inference ({:?}) on `{}`", found.kind, found.context),
            DetectionStage::MutationInference,
        ))
    }
}
