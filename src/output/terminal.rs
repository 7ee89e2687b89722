//! Human-readable tables for the terminal.

use crate::core::VerdictType;
use crate::mutation::Severity;
use super::display_path;
use crate::pipeline::{AnalysisReport, PairMutationReport, ReportSummary};
use colored::{ColoredString, Colorize};
use comfy_table::{presets, Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

fn base_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
        );
    table
}

fn verdict_color(verdict: VerdictType) -> Color {
    match verdict {
        VerdictType::CodeBug => Color::Red,
        VerdictType::OutdatedTest => Color::Yellow,
        VerdictType::FlakyTest => Color::Magenta,
        VerdictType::EnvironmentIssue => Color::Cyan,
        VerdictType::Passed => Color::Green,
    }
}

fn verdict_cell(verdict: VerdictType, regression: bool, color: bool) -> Cell {
    let label = if regression {
        format!("{} (regression)", verdict.label())
    } else {
        verdict.label().to_string()
    };
    let cell = Cell::new(label);
    if color {
        cell.fg(verdict_color(verdict)).add_attribute(Attribute::Bold)
    } else {
        cell
    }
}

pub fn render_report(report: &AnalysisReport, color: bool) -> String {
    if report.results.is_empty() {
        return "No correlated test/source pairs found.".to_string();
    }

    let mut table = base_table(&["Test", "Source", "Verdict", "Confidence", "Suggestion"]);
    for result in &report.results {
        table.add_row(vec![
            Cell::new(format!("{}\n{}", result.test_name, display_path(&result.test_file))),
            Cell::new(&result.source_method),
            verdict_cell(result.verdict, result.regression, color),
            Cell::new(format!("{:.0}%", result.confidence * 100.0))
                .set_alignment(CellAlignment::Right),
            Cell::new(result.suggestions.first().map(String::as_str).unwrap_or("")),
        ]);
    }

    let mut out = format!("{}\n{}", table, summary_line(&report.summary, color));
    for result in report.results.iter().filter(|r| r.verdict != VerdictType::Passed) {
        out.push_str(&format!(
            "\n\n{} {}\n  {}",
            paint("▸", color, |s| s.bold()),
            paint(&result.test_name, color, |s| s.bold()),
            result.reasoning
        ));
    }
    out
}

fn summary_line(summary: &ReportSummary, color: bool) -> String {
    let parts = [
        (summary.code_bug, "code bug", VerdictType::CodeBug),
        (summary.outdated_test, "outdated test", VerdictType::OutdatedTest),
        (summary.flaky_test, "flaky", VerdictType::FlakyTest),
        (summary.environment_issue, "environment", VerdictType::EnvironmentIssue),
        (summary.passed, "passed", VerdictType::Passed),
    ];
    let counts: Vec<String> = parts
        .iter()
        .filter(|(count, _, _)| *count > 0)
        .map(|(count, label, verdict)| {
            let text = format!("{count} {label}");
            match verdict {
                VerdictType::CodeBug => paint(&text, color, |s| s.red()),
                VerdictType::OutdatedTest => paint(&text, color, |s| s.yellow()),
                VerdictType::Passed => paint(&text, color, |s| s.green()),
                _ => text,
            }
        })
        .collect();
    let mut line = format!(
        "{} pairs analyzed: {}",
        paint(&summary.total.to_string(), color, |s| s.bold()),
        counts.join(", ")
    );
    if summary.regressions > 0 {
        line.push_str(&format!(" ({} regression(s))", summary.regressions));
    }
    line
}

pub fn render_mutations(reports: &[PairMutationReport], color: bool) -> String {
    if reports.is_empty() {
        return "No correlated test/source pairs found.".to_string();
    }

    let mut sections = Vec::new();
    for pair in reports {
        let report = &pair.report;
        let header = format!(
            "{} -> {}: {}/{} mutations caught ({:.0}%)",
            pair.test_name,
            pair.source_method,
            report.caught,
            report.total,
            report.mutation_score * 100.0
        );
        if report.weak_spots.is_empty() {
            sections.push(paint(&header, color, |s| s.green()));
            continue;
        }

        let mut table = base_table(&["Line", "Code", "Severity", "Suggestion"]);
        for spot in &report.weak_spots {
            let severity = Cell::new(format!("{:?}", spot.severity).to_lowercase());
            let severity = match (color, spot.severity) {
                (true, Severity::High) => severity.fg(Color::Red),
                (true, Severity::Medium) => severity.fg(Color::Yellow),
                _ => severity,
            };
            table.add_row(vec![
                Cell::new(spot.line).set_alignment(CellAlignment::Right),
                Cell::new(&spot.code),
                severity,
                Cell::new(&spot.suggestion),
            ]);
        }
        sections.push(format!("{}\n{}", paint(&header, color, |s| s.bold()), table));
    }
    sections.join("\n\n")
}

fn paint(text: &str, color: bool, style: impl Fn(&str) -> ColoredString) -> String {
    if color {
        style(text).to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::{MutationAnalyzer, MutationReport};
    use crate::pipeline::PairReport;
    use crate::testkit::sample_pair;

    fn report_with(verdict: VerdictType) -> AnalysisReport {
        let mut result = PairReport {
            test_name: "testCalculate".into(),
            test_file: "src/test/java/CalcTest.java".into(),
            source_method: "calculate".into(),
            source_file: "src/main/java/Calc.java".into(),
            verdict,
            confidence: 0.9,
            reasoning: "Rate mismatch".into(),
            suggestions: vec!["Update testCalculate".into()],
            regression: false,
            details: None,
        };
        result.regression = verdict == VerdictType::CodeBug;
        AnalysisReport::new(vec![result])
    }

    #[test]
    fn test_report_lists_verdicts_and_summary() {
        let out = render_report(&report_with(VerdictType::CodeBug), false);
        assert!(out.contains("CODE_BUG (regression)"));
        assert!(out.contains("90%"));
        assert!(out.contains("1 pairs analyzed: 1 code bug (1 regression(s))"));
        assert!(out.contains("Rate mismatch"));
    }

    #[test]
    fn test_passed_pairs_have_no_reasoning_block() {
        let out = render_report(&report_with(VerdictType::Passed), false);
        assert!(!out.contains("▸"));
    }

    #[test]
    fn test_empty_report() {
        assert_eq!(
            render_report(&AnalysisReport::default(), false),
            "No correlated test/source pairs found."
        );
    }

    #[test]
    fn test_mutations_show_weak_spots() {
        let pair = sample_pair("calc.calculate(100);", "return price * 0.85;");
        let report = MutationAnalyzer.analyze(&pair);
        assert!(!report.weak_spots.is_empty());
        let out = render_mutations(&[PairMutationReport::new(&pair, report)], false);
        assert!(out.contains("testCalculate -> calculate"));
        assert!(out.contains("price * 0.85"));
    }

    #[test]
    fn test_fully_caught_pair_is_one_line() {
        let pair = sample_pair("assertEquals(10, calc.calculate(1));", "return 10;");
        let report = MutationReport {
            total: 1,
            caught: 1,
            mutation_score: 1.0,
            ..Default::default()
        };
        let out = render_mutations(&[PairMutationReport::new(&pair, report)], false);
        assert_eq!(out, "testCalculate -> calculate: 1/1 mutations caught (100%)");
    }
}
