//! Lightweight per-language parsers.
//!
//! Each language is a [`LanguageParser`] selected by file extension. Parsers
//! are line-oriented and approximate: they locate test functions and regular
//! methods, slice their bodies by brace or indentation tracking, and run a
//! table of assertion regexes over test bodies. Malformed input produces a
//! partial result, never an error; only reading the file can fail.

pub mod common;
pub mod csharp;
pub mod go;
pub mod java;
pub mod javascript;
pub mod patterns;
pub mod python;
pub mod rust;

use crate::core::{Assertion, Language, Parameter, ParsedFile, SourceMethod, TestCase, TestFramework};
use crate::errors::{Error, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Contract shared by every language parser.
pub trait LanguageParser: Send + Sync {
    fn language(&self) -> Language;

    /// Infer the test framework from imports, attributes or decorators.
    fn detect_framework(&self, content: &str) -> TestFramework;

    fn extract_tests(&self, content: &str, path: &Path, framework: TestFramework) -> Vec<TestCase>;

    /// Every function or method declaration with a body, tests included.
    fn extract_methods(&self, content: &str, path: &Path) -> Vec<SourceMethod>;

    fn extract_assertions(
        &self,
        body: &str,
        first_line: usize,
        framework: TestFramework,
    ) -> Vec<Assertion>;

    fn parse_parameters(&self, list: &str) -> Vec<Parameter>;

    fn parse(&self, content: &str, path: &Path) -> ParsedFile {
        let framework = self.detect_framework(content);
        let tests = self.extract_tests(content, path, framework);
        let test_lines: HashSet<usize> = tests.iter().map(|t| t.line_number).collect();
        let methods = self
            .extract_methods(content, path)
            .into_iter()
            .filter(|m| !test_lines.contains(&m.line_number))
            .collect();
        ParsedFile { tests, methods }
    }
}

pub fn get_parser(language: Language) -> Box<dyn LanguageParser> {
    match language {
        Language::Java => Box::new(java::JavaParser),
        Language::TypeScript => Box::new(javascript::JavaScriptParser::typescript()),
        Language::JavaScript => Box::new(javascript::JavaScriptParser::javascript()),
        Language::Python => Box::new(python::PythonParser),
        Language::Go => Box::new(go::GoParser),
        Language::Rust => Box::new(rust::RustParser),
        Language::CSharp => Box::new(csharp::CSharpParser),
    }
}

/// Parse text already in memory. Unknown extensions yield an empty result.
pub fn parse_source(content: &str, path: &Path) -> ParsedFile {
    match Language::from_path(path) {
        Some(language) => get_parser(language).parse(content, path),
        None => {
            debug!("No parser for {}", path.display());
            ParsedFile::default()
        }
    }
}

/// Read and parse a file. A missing or unreadable file is an error.
pub fn parse_file(path: &Path) -> Result<ParsedFile> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io_at(e, path))?;
    Ok(parse_source(&content, path))
}

/// Build a [`TestCase`] from a located body, extracting its assertions.
pub(crate) fn build_test_case(
    parser: &dyn LanguageParser,
    name: String,
    path: &Path,
    span: &common::BodySpan,
    framework: TestFramework,
) -> TestCase {
    let assertions = parser.extract_assertions(&span.text, span.start_line, framework);
    TestCase {
        name,
        file_path: path.to_path_buf(),
        line_number: span.start_line,
        end_line: span.end_line,
        framework,
        assertions,
        body: span.text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_file_missing_is_error() {
        let err = parse_file(Path::new("/definitely/not/here/Thing.java")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_parse_source_unknown_extension_is_empty() {
        let parsed = parse_source("whatever", &PathBuf::from("notes.txt"));
        assert!(parsed.tests.is_empty());
        assert!(parsed.methods.is_empty());
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let content = "package calc\n\nimport \"testing\"\n\nfunc TestAdd(t *testing.T) {\n\tif Add(2, 3) != 5 {\n\t\tt.Fatal(\"bad\")\n\t}\n}\n\nfunc Add(a, b int) int {\n\treturn a + b\n}\n";
        let path = PathBuf::from("calc_test.go");
        let first = parse_source(content, &path);
        let second = parse_source(content, &path);
        assert_eq!(first, second);
        assert_eq!(first.tests.len(), 1);
        assert_eq!(first.methods.len(), 1);
    }
}
