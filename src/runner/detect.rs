//! Project test framework detection from manifest files.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunnerKind {
    Jest,
    Vitest,
    Mocha,
    Maven,
    Gradle,
    GoTest,
    Cargo,
    Dotnet,
    Pytest,
}

impl RunnerKind {
    /// Program and arguments for a whole-project run.
    pub fn command(&self) -> (&'static str, Vec<&'static str>) {
        match self {
            RunnerKind::Jest => ("npx", vec!["jest", "--verbose"]),
            RunnerKind::Vitest => ("npx", vec!["vitest", "run", "--reporter=verbose"]),
            RunnerKind::Mocha => ("npx", vec!["mocha"]),
            RunnerKind::Maven => ("mvn", vec!["-B", "test"]),
            RunnerKind::Gradle => ("gradle", vec!["test", "--console=plain"]),
            RunnerKind::GoTest => ("go", vec!["test", "-v", "./..."]),
            RunnerKind::Cargo => ("cargo", vec!["test", "--no-fail-fast"]),
            RunnerKind::Dotnet => ("dotnet", vec!["test", "--logger", "console;verbosity=normal"]),
            RunnerKind::Pytest => ("python", vec!["-m", "pytest", "-rA"]),
        }
    }

    /// Arguments narrowing a run to one file, where the tool supports it.
    pub fn file_args(&self, file: &Path) -> Vec<String> {
        let file = file.to_string_lossy().to_string();
        match self {
            RunnerKind::Jest | RunnerKind::Vitest | RunnerKind::Mocha | RunnerKind::Pytest => {
                vec![file]
            }
            RunnerKind::Maven => {
                let class = Path::new(&file)
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                vec![format!("-Dtest={class}")]
            }
            RunnerKind::Gradle => {
                let class = Path::new(&file)
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                vec!["--tests".to_string(), format!("*{class}")]
            }
            RunnerKind::GoTest | RunnerKind::Cargo | RunnerKind::Dotnet => Vec::new(),
        }
    }
}

/// First manifest match wins, JavaScript before JVM before the rest.
pub fn detect_runner(project_root: &Path) -> Option<RunnerKind> {
    let detected = detect_javascript(project_root)
        .or_else(|| project_root.join("pom.xml").exists().then_some(RunnerKind::Maven))
        .or_else(|| {
            (project_root.join("build.gradle").exists()
                || project_root.join("build.gradle.kts").exists())
            .then_some(RunnerKind::Gradle)
        })
        .or_else(|| project_root.join("go.mod").exists().then_some(RunnerKind::GoTest))
        .or_else(|| project_root.join("Cargo.toml").exists().then_some(RunnerKind::Cargo))
        .or_else(|| has_csproj(project_root).then_some(RunnerKind::Dotnet))
        .or_else(|| {
            ["pytest.ini", "pyproject.toml", "setup.py", "setup.cfg"]
                .iter()
                .any(|f| project_root.join(f).exists())
                .then_some(RunnerKind::Pytest)
        });
    debug!(root = %project_root.display(), runner = ?detected, "Detected test runner");
    detected
}

fn detect_javascript(project_root: &Path) -> Option<RunnerKind> {
    let contents = fs::read_to_string(project_root.join("package.json")).ok()?;
    let manifest: serde_json::Value = serde_json::from_str(&contents).ok()?;
    let has_dependency = |name: &str| {
        ["dependencies", "devDependencies"]
            .iter()
            .any(|section| manifest.get(section).and_then(|deps| deps.get(name)).is_some())
    };
    if has_dependency("vitest") {
        Some(RunnerKind::Vitest)
    } else if has_dependency("jest") || has_dependency("ts-jest") {
        Some(RunnerKind::Jest)
    } else if has_dependency("mocha") {
        Some(RunnerKind::Mocha)
    } else {
        None
    }
}

fn has_csproj(project_root: &Path) -> bool {
    fs::read_dir(project_root)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .any(|e| e.path().extension().is_some_and(|ext| ext == "csproj" || ext == "sln"))
        })
        .unwrap_or(false)
}
