use crate::pipeline::{AnalysisReport, PairMutationReport};
use anyhow::Result;

/// Pretty JSON. Per-pair analysis details are only kept when `detailed`.
pub fn report_json(report: &AnalysisReport, detailed: bool) -> Result<String> {
    if detailed {
        return Ok(serde_json::to_string_pretty(report)?);
    }
    let compact = AnalysisReport {
        results: report
            .results
            .iter()
            .cloned()
            .map(|r| r.without_details())
            .collect(),
        summary: report.summary.clone(),
    };
    Ok(serde_json::to_string_pretty(&compact)?)
}

pub fn mutations_json(reports: &[PairMutationReport]) -> Result<String> {
    Ok(serde_json::to_string_pretty(reports)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CodeBehavior, DivergenceResult, GitContext, TestExpectation, AnalysisResult};
    use crate::pipeline::PairReport;
    use crate::testkit::sample_pair;
    use crate::verdict::classify;

    fn report() -> AnalysisReport {
        let analysis = AnalysisResult {
            pair: sample_pair("assertEquals(10, calc.calculate(1));", "return 10;"),
            expectation: TestExpectation::default(),
            behavior: CodeBehavior::default(),
            divergence: DivergenceResult::none(0.99, "no divergence"),
            git_context: GitContext::default(),
            failure_message: None,
        };
        let verdict = classify(&analysis);
        AnalysisReport::new(vec![PairReport::new(analysis, verdict)])
    }

    #[test]
    fn test_compact_json_drops_details() {
        let json: serde_json::Value = serde_json::from_str(&report_json(&report(), false).unwrap()).unwrap();
        assert!(json["results"][0].get("details").is_none());
        assert_eq!(json["summary"]["total"], 1);
    }

    #[test]
    fn test_detailed_json_keeps_analysis() {
        let json: serde_json::Value = serde_json::from_str(&report_json(&report(), true).unwrap()).unwrap();
        assert_eq!(
            json["results"][0]["details"]["analysis"]["pair"]["source"]["name"],
            "calculate"
        );
    }
}
