//! Divergence detection cascade.
//!
//! Each stage is a [`DetectionStrategy`]. The detector runs them in order and
//! stops at the first one that reports a divergence; stages never race.

pub mod ai_strategy;
pub mod expression;
pub mod mutation_strategy;
pub mod real_error;
pub mod static_analysis;
pub mod values;

use crate::ai::AiBridge;
use crate::core::{DetectionStage, DivergenceResult, Language, TestSourcePair};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub use ai_strategy::AiStrategy;
pub use mutation_strategy::MutationStrategy;
pub use real_error::RealErrorStrategy;
pub use static_analysis::StaticAnalysisStrategy;

/// Confidence reported when every stage came up empty.
pub const NO_DIVERGENCE_CONFIDENCE: f64 = 0.99;

/// Everything a stage may look at for one pair.
#[derive(Clone, Copy, Debug)]
pub struct DetectionInput<'a> {
    pub pair: &'a TestSourcePair,
    /// Failure text from a real test run.
    pub real_error: Option<&'a str>,
    /// Full text of the source file, for file-level constants.
    pub source_file_text: Option<&'a str>,
}

impl<'a> DetectionInput<'a> {
    pub fn new(pair: &'a TestSourcePair) -> Self {
        Self {
            pair,
            real_error: None,
            source_file_text: None,
        }
    }

    pub fn with_real_error(mut self, error: Option<&'a str>) -> Self {
        self.real_error = error;
        self
    }

    pub fn with_source_file(mut self, text: Option<&'a str>) -> Self {
        self.source_file_text = text;
        self
    }

    pub fn language(&self) -> Option<Language> {
        Language::from_path(&self.pair.source.file_path)
            .or_else(|| Language::from_path(&self.pair.test.file_path))
    }
}

/// One stage of the cascade. `Some` ends the cascade.
#[async_trait]
pub trait DetectionStrategy: Send + Sync {
    fn stage(&self) -> DetectionStage;

    async fn detect(&self, input: &DetectionInput<'_>) -> Option<DivergenceResult>;
}

pub struct DivergenceDetector {
    strategies: Vec<Box<dyn DetectionStrategy>>,
}

impl DivergenceDetector {
    /// Real error, AI, static analysis, then mutation inference.
    pub fn new(ai: Option<Arc<dyn AiBridge>>) -> Self {
        let mut strategies: Vec<Box<dyn DetectionStrategy>> = vec![Box::new(RealErrorStrategy)];
        if let Some(bridge) = ai {
            strategies.push(Box::new(AiStrategy::new(bridge)));
        }
        strategies.push(Box::new(StaticAnalysisStrategy));
        strategies.push(Box::new(MutationStrategy));
        Self { strategies }
    }

    pub fn with_strategies(strategies: Vec<Box<dyn DetectionStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn stages(&self) -> Vec<DetectionStage> {
        self.strategies.iter().map(|s| s.stage()).collect()
    }

    pub async fn detect(&self, input: &DetectionInput<'_>) -> DivergenceResult {
        for strategy in &self.strategies {
            if let Some(result) = strategy.detect(input).await {
                debug!(
                    test = %input.pair.test.name,
                    stage = ?strategy.stage(),
                    confidence = result.confidence,
                    "Divergence found"
                );
                return result;
            }
        }
        DivergenceResult::none(
            NO_DIVERGENCE_CONFIDENCE,
            "No divergence found by any detection stage",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Divergence, DivergenceType};
    use crate::testkit::sample_pair;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        stage: DetectionStage,
        hit: bool,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DetectionStrategy for Fixed {
        fn stage(&self) -> DetectionStage {
            self.stage
        }

        async fn detect(&self, _input: &DetectionInput<'_>) -> Option<DivergenceResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.hit.then(|| {
                DivergenceResult::found(
                    Divergence {
                        divergence_type: DivergenceType::ReturnValueMismatch,
                        description: "fixed".into(),
                        test_line: 1,
                        code_line: 1,
                        expected: "1".into(),
                        actual: "2".into(),
                    },
                    0.5,
                    "fixed",
                    self.stage,
                )
            })
        }
    }

    #[tokio::test]
    async fn test_first_hit_stops_the_cascade() {
        let calls: Vec<Arc<AtomicUsize>> = (0..3).map(|_| Arc::new(AtomicUsize::new(0))).collect();
        let detector = DivergenceDetector::with_strategies(vec![
            Box::new(Fixed {
                stage: DetectionStage::AiComparison,
                hit: false,
                calls: calls[0].clone(),
            }),
            Box::new(Fixed {
                stage: DetectionStage::StaticAnalysis,
                hit: true,
                calls: calls[1].clone(),
            }),
            Box::new(Fixed {
                stage: DetectionStage::MutationInference,
                hit: true,
                calls: calls[2].clone(),
            }),
        ]);
        let pair = sample_pair("", "");
        let result = detector.detect(&DetectionInput::new(&pair)).await;

        assert_eq!(result.stage, DetectionStage::StaticAnalysis);
        let counts: Vec<usize> = calls.iter().map(|c| c.load(Ordering::SeqCst)).collect();
        assert_eq!(counts, vec![1, 1, 0]);
    }

    #[tokio::test]
    async fn test_empty_cascade_reports_confident_no_divergence() {
        let detector = DivergenceDetector::with_strategies(vec![]);
        let pair = sample_pair("", "");
        let result = detector.detect(&DetectionInput::new(&pair)).await;
        assert!(!result.has_divergence);
        assert_eq!(result.confidence, 0.99);
        assert_eq!(result.stage, DetectionStage::NoDivergence);
    }

    #[test]
    fn test_default_cascade_order() {
        assert_eq!(
            DivergenceDetector::new(None).stages(),
            vec![
                DetectionStage::RealError,
                DetectionStage::StaticAnalysis,
                DetectionStage::MutationInference,
            ]
        );
    }
}
