pub mod types;

use serde::{Deserialize, Serialize};
use std::path::Path;

pub use types::{
    AnalysisResult, Assertion, AssertionType, BlameInfo, CodeBehavior, CommitInfo,
    CorrelationType, DetectionStage, Divergence, DivergenceResult, DivergenceType, GitContext,
    Parameter, ParsedFile, Priority, Recommendation, RecommendedAction, SourceMethod, TestCase,
    TestExpectation, TestFramework, TestSourcePair, Verdict, VerdictType,
};

/// Source languages with a parser.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Java,
    TypeScript,
    JavaScript,
    Python,
    Go,
    Rust,
    CSharp,
}

impl Language {
    pub fn from_extension(ext: &str) -> Option<Self> {
        static EXTENSION_MAP: &[(&[&str], Language)] = &[
            (&["java"], Language::Java),
            (&["ts", "tsx", "mts", "cts"], Language::TypeScript),
            (&["js", "jsx", "mjs", "cjs"], Language::JavaScript),
            (&["py"], Language::Python),
            (&["go"], Language::Go),
            (&["rs"], Language::Rust),
            (&["cs"], Language::CSharp),
        ];

        EXTENSION_MAP
            .iter()
            .find(|(exts, _)| exts.contains(&ext))
            .map(|(_, lang)| *lang)
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Java => "Java",
            Language::TypeScript => "TypeScript",
            Language::JavaScript => "JavaScript",
            Language::Python => "Python",
            Language::Go => "Go",
            Language::Rust => "Rust",
            Language::CSharp => "C#",
        }
    }

    /// Languages whose grammar uses braces for blocks.
    pub fn is_brace_delimited(&self) -> bool {
        !matches!(self, Language::Python)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_extension() {
        assert_eq!(Language::from_extension("java"), Some(Language::Java));
        assert_eq!(Language::from_extension("tsx"), Some(Language::TypeScript));
        assert_eq!(Language::from_extension("mjs"), Some(Language::JavaScript));
        assert_eq!(Language::from_extension("cs"), Some(Language::CSharp));
        assert_eq!(Language::from_extension("txt"), None);
    }

    #[test]
    fn test_language_from_path() {
        assert_eq!(
            Language::from_path(Path::new("src/calc_test.go")),
            Some(Language::Go)
        );
        assert_eq!(Language::from_path(Path::new("Makefile")), None);
    }
}
