//! Panic hook printing a short crash report with the analysis context.

use super::context::{get_current_context, get_progress, AnalysisContext};
use std::panic::PanicHookInfo;
use tracing::Span;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const RULE: &str = "════════════════════════════════════════════════════════════════════════════════";

/// Call early in `main`, before any analysis starts.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("{}", crash_report(info));
    }));
}

fn crash_report(info: &PanicHookInfo<'_>) -> String {
    let context = get_current_context();
    let (processed, total) = get_progress();

    let mut lines = vec![
        String::new(),
        RULE.to_string(),
        format!(
            "TESTVERDICT CRASH REPORT  v{}  {}  {}",
            VERSION,
            std::env::consts::OS,
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        ),
        RULE.to_string(),
        format!("Panic: {}", panic_message(info)),
    ];
    if let Some(location) = info.location() {
        lines.push(format!(
            "Location: {}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        ));
    }
    lines.extend(context_lines(&context, processed, total));
    if let Some(metadata) = Span::current().metadata() {
        lines.push(format!("Span: {}", metadata.name()));
    }
    if std::env::var_os("RUST_BACKTRACE").is_some() {
        lines.push(format!("{}", std::backtrace::Backtrace::capture()));
    } else {
        lines.push("Run with RUST_BACKTRACE=1 for a stack trace".to_string());
    }
    lines.push(RULE.to_string());
    lines.join("\n")
}

fn context_lines(context: &AnalysisContext, processed: usize, total: usize) -> Vec<String> {
    let mut lines = vec![match &context.phase {
        Some(phase) => format!("Phase: {phase}"),
        None => "Phase: (not set, crash occurred before analysis started)".to_string(),
    }];
    if let Some(file) = &context.current_file {
        lines.push(format!("File: {}", file.display()));
    }
    if let Some(test) = &context.current_test {
        lines.push(format!("Test: {test}"));
    }
    if total > 0 {
        lines.push(format!(
            "Progress: {} / {} pairs ({}%)",
            processed,
            total,
            processed * 100 / total
        ));
    }
    lines
}

fn panic_message(info: &PanicHookInfo<'_>) -> String {
    if let Some(s) = info.payload().downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::context::AnalysisPhase;

    #[test]
    fn test_context_lines_without_phase() {
        let lines = context_lines(&AnalysisContext::new(), 0, 0);
        assert_eq!(lines, vec!["Phase: (not set, crash occurred before analysis started)"]);
    }

    #[test]
    fn test_context_lines_with_progress() {
        let context = AnalysisContext {
            phase: Some(AnalysisPhase::PairAnalysis),
            current_file: None,
            current_test: Some("testDiscount".into()),
        };
        let lines = context_lines(&context, 3, 4);
        assert_eq!(
            lines,
            vec![
                "Phase: pair_analysis".to_string(),
                "Test: testDiscount".to_string(),
                "Progress: 3 / 4 pairs (75%)".to_string(),
            ]
        );
    }
}
