//! End-to-end verdicts for a small Java project on disk.

use indoc::indoc;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use testverdict::core::{DetectionStage, DivergenceType, RecommendedAction, VerdictType};
use testverdict::pipeline::PairReport;
use testverdict::testkit::{commit_at, FakeGitService};
use testverdict::{Pipeline, TestVerdictConfig};

struct Project {
    dir: TempDir,
    source: PathBuf,
    test: PathBuf,
}

fn write_project(source: &str, test: &str) -> Project {
    let dir = TempDir::new().unwrap();
    let main = dir.path().join("src/main/java");
    let tests = dir.path().join("src/test/java");
    fs::create_dir_all(&main).unwrap();
    fs::create_dir_all(&tests).unwrap();
    let source_path = main.join("PriceCalculator.java");
    let test_path = tests.join("PriceCalculatorTest.java");
    fs::write(&source_path, source).unwrap();
    fs::write(&test_path, test).unwrap();
    Project {
        dir,
        source: source_path,
        test: test_path,
    }
}

const DISCOUNT_SOURCE: &str = indoc! {"
    public class PriceCalculator {
        public double calculateDiscount(double price) {
            return price * 0.85;
        }
    }
"};

const DISCOUNT_TEST: &str = indoc! {"
    import org.junit.jupiter.api.Test;
    import static org.junit.jupiter.api.Assertions.assertEquals;

    public class PriceCalculatorTest {
        @Test
        public void appliesTenPercentOff() {
            PriceCalculator calc = new PriceCalculator();
            assertEquals(90, calc.calculateDiscount(100));
        }
    }
"};

async fn analyze(project: &Project, git: FakeGitService) -> PairReport {
    let report = Pipeline::new(&TestVerdictConfig::default(), Arc::new(git))
        .analyze_paths(&[project.dir.path().to_path_buf()])
        .await
        .unwrap();
    assert_eq!(report.results.len(), 1, "expected exactly one correlated pair");
    report.results.into_iter().next().unwrap()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "confidence {actual} != {expected}"
    );
}

#[tokio::test]
async fn faulty_fix_commit_is_a_regression() {
    let project = write_project(DISCOUNT_SOURCE, DISCOUNT_TEST);
    let git = FakeGitService::new()
        .with_commit(&project.source, commit_at("s1", "fix: correct discount rate", 100))
        .with_commit(&project.test, commit_at("t1", "test: cover discount", 200));

    let result = analyze(&project, git).await;

    assert_eq!(result.test_name, "appliesTenPercentOff");
    assert_eq!(result.source_method, "calculateDiscount");
    assert_eq!(result.verdict, VerdictType::CodeBug);
    assert!(result.regression);
    assert_close(result.confidence, 0.9);

    let details = result.details.expect("details are kept by default");
    let divergence = details.analysis.divergence.divergence.unwrap();
    assert_eq!(divergence.divergence_type, DivergenceType::ReturnValueMismatch);
    assert!(divergence.description.contains("Rate mismatch"));
    assert_eq!(details.verdict.recommendation.action, RecommendedAction::FixCode);
}

#[tokio::test]
async fn intentional_source_change_outdates_the_test() {
    let project = write_project(DISCOUNT_SOURCE, DISCOUNT_TEST);
    let git = FakeGitService::new()
        .with_commit(&project.test, commit_at("t1", "test: cover discount", 100))
        .with_commit(
            &project.source,
            commit_at("s2", "feat: update discount policy to 15%", 200),
        );

    let result = analyze(&project, git).await;

    assert_eq!(result.verdict, VerdictType::OutdatedTest);
    assert!(!result.regression);
    assert_close(result.confidence, 0.9);
    let details = result.details.unwrap();
    assert_eq!(details.verdict.recommendation.action, RecommendedAction::UpdateTest);
    assert!(details.verdict.reason.contains("feat: update discount policy to 15%"));
}

#[tokio::test]
async fn missing_throw_is_an_exception_mismatch() {
    let source = indoc! {"
        public class PriceCalculator {
            public double validate(double price) {
                return price;
            }
        }
    "};
    let test = indoc! {"
        import org.junit.jupiter.api.Test;
        import static org.junit.jupiter.api.Assertions.assertThrows;

        public class PriceCalculatorTest {
            @Test
            public void rejectsNegativePrices() {
                PriceCalculator calc = new PriceCalculator();
                assertThrows(IllegalArgumentException.class, () -> calc.validate(-1));
            }
        }
    "};
    let project = write_project(source, test);

    let result = analyze(&project, FakeGitService::new()).await;

    let details = result.details.unwrap();
    let divergence = &details.analysis.divergence;
    assert!(divergence.has_divergence);
    assert_eq!(divergence.stage, DetectionStage::StaticAnalysis);
    assert_close(divergence.confidence, 0.70);
    assert_eq!(
        divergence.divergence.as_ref().unwrap().divergence_type,
        DivergenceType::ExceptionMismatch
    );
    assert_eq!(result.verdict, VerdictType::CodeBug);
}

#[tokio::test]
async fn matching_values_pass() {
    let source = indoc! {"
        public class PriceCalculator {
            public int shippingFee() {
                return 10;
            }
        }
    "};
    let test = indoc! {"
        import org.junit.jupiter.api.Test;
        import static org.junit.jupiter.api.Assertions.assertEquals;

        public class PriceCalculatorTest {
            @Test
            public void chargesFlatRate() {
                PriceCalculator calc = new PriceCalculator();
                assertEquals(10, calc.shippingFee());
            }
        }
    "};
    let project = write_project(source, test);

    let result = analyze(&project, FakeGitService::new()).await;

    assert_eq!(result.verdict, VerdictType::Passed);
    assert_close(result.confidence, 0.99);
    assert!(!result.regression);
    let details = result.details.unwrap();
    assert!(!details.analysis.divergence.has_divergence);
    assert_close(details.analysis.divergence.confidence, 0.99);
}
