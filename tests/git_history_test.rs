use indoc::indoc;
use pretty_assertions::assert_eq;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use tempfile::TempDir;
use testverdict::core::VerdictType;
use testverdict::git::MoreRecent;
use testverdict::{Git2Service, GitService, Pipeline, TestVerdictConfig};

fn git(repo: &Path, args: &[&str]) {
    Command::new("git").args(args).current_dir(repo).output().unwrap();
}

fn commit(repo: &Path, file: &str, content: &str, message: &str, epoch: i64) {
    let path = repo.join(file);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, content).unwrap();
    git(repo, &["add", file]);
    let date = format!("@{epoch} +0000");
    Command::new("git")
        .args(["commit", "-m", message])
        .env("GIT_AUTHOR_DATE", &date)
        .env("GIT_COMMITTER_DATE", &date)
        .current_dir(repo)
        .output()
        .unwrap();
}

fn init_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    git(dir.path(), &["init"]);
    git(dir.path(), &["config", "user.email", "dev@example.com"]);
    git(dir.path(), &["config", "user.name", "Dev"]);
    dir
}

const TEST_FILE: &str = "src/test/java/PriceCalculatorTest.java";
const SOURCE_FILE: &str = "src/main/java/PriceCalculator.java";

const TEST_CONTENT: &str = indoc! {"
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

const SOURCE_CONTENT: &str = indoc! {"
    public class PriceCalculator {
        public double calculateDiscount(double price) {
            return price * 0.85;
        }
    }
"};

#[tokio::test]
async fn later_feature_commit_outdates_the_test() {
    let repo = init_repo();
    commit(repo.path(), TEST_FILE, TEST_CONTENT, "test: cover discount", 1_700_000_000);
    commit(
        repo.path(),
        SOURCE_FILE,
        SOURCE_CONTENT,
        "feat: update discount policy to 15%",
        1_700_100_000,
    );

    let service = Git2Service::new();
    assert_eq!(
        service
            .compare_last_modification(&repo.path().join(SOURCE_FILE), &repo.path().join(TEST_FILE))
            .more_recent,
        MoreRecent::First
    );

    let report = Pipeline::new(&TestVerdictConfig::default(), Arc::new(service))
        .analyze_paths(&[repo.path().to_path_buf()])
        .await
        .unwrap();

    assert_eq!(report.results.len(), 1);
    let result = &report.results[0];
    assert_eq!(result.verdict, VerdictType::OutdatedTest);
    assert!(!result.regression);
    let git_context = &result.details.as_ref().unwrap().analysis.git_context;
    assert_eq!(
        git_context.source_commit.as_ref().unwrap().message.trim(),
        "feat: update discount policy to 15%"
    );
    assert_eq!(git_context.recent_commits.len(), 2);
}

#[tokio::test]
async fn files_outside_a_repository_have_no_history() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("src")).unwrap();
    std::fs::write(dir.path().join(SOURCE_FILE.replace("main/java/", "")), SOURCE_CONTENT).unwrap();
    std::fs::write(dir.path().join(TEST_FILE.replace("test/java/", "")), TEST_CONTENT).unwrap();

    let report = Pipeline::new(&TestVerdictConfig::default(), Arc::new(Git2Service::new()))
        .analyze_paths(&[dir.path().to_path_buf()])
        .await
        .unwrap();

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].verdict, VerdictType::CodeBug);
    assert!(!report.results[0].regression);
}
