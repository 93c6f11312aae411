use colored::Colorize;
use tabled::{Table, Tabled, settings::Style};

use crate::evaluator::{
    EvaluationOutcome, EvaluationResult, LoadError, compare::ComparisonResult,
};

const WIDTH: usize = 52;
const PASS: &str = "PASS";
const FAIL: &str = "FAIL";
const LOAD_ERROR: &str = "LOAD ERROR";

#[derive(Tabled)]
struct ComparisonRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Unguided")]
    unguided: String,
    #[tabled(rename = "Guided")]
    guided: String,
}

/// Compresses sorted line numbers the way coverage.py does: `1-3, 7, 9-10`.
pub fn format_line_ranges(lines: &[usize]) -> String {
    let mut ranges: Vec<(usize, usize)> = vec![];
    for &line in lines {
        match ranges.last_mut() {
            Some((_, end)) if *end + 1 == line => *end = line,
            _ => ranges.push((line, line)),
        }
    }
    ranges
        .iter()
        .map(|(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{}-{}", start, end)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn goal_status(result: &EvaluationResult) -> &'static str {
    if result.meets_goal { PASS } else { FAIL }
}

fn render_result(result: &EvaluationResult, lines: &mut Vec<String>) {
    lines.push(format!("  Coverage       : {:.1}%", result.coverage_percent));
    lines.push(format!("  Statements     : {}", result.statements_total));
    lines.push(format!("  Covered        : {}", result.statements_covered));
    lines.push(format!(
        "  Not covered    : {}",
        result.statements_total - result.statements_covered.min(result.statements_total)
    ));
    lines.push(String::new());
    if result.uncovered_lines.is_empty() {
        lines.push("  All executable lines are covered.".to_string());
    } else {
        lines.push(format!(
            "  Uncovered lines: {}",
            format_line_ranges(&result.uncovered_lines)
        ));
    }
    lines.push(String::new());
    lines.push("  TEST RESULTS".to_string());
    lines.push(format!("  {}", "-".repeat(30)));
    lines.push(format!("  Passed  : {}", result.tests_passed));
    lines.push(format!("  Failed  : {}", result.tests_failed));
    lines.push(format!("  Errors  : {}", result.tests_errored));
    if result.tests_skipped > 0 {
        lines.push(format!("  Skipped : {}", result.tests_skipped));
    }
    lines.push(format!("  Total   : {}", result.tests_total()));
    lines.push(String::new());
    lines.push(format!(
        "  Goal ({:.1}%) : {}",
        result.goal,
        goal_status(result)
    ));
}

fn render_load_error(load_error: &LoadError, lines: &mut Vec<String>) {
    lines.push(format!("  {}: {}", LOAD_ERROR, load_error));
    lines.push("  No tests were run, coverage is undefined.".to_string());
}

pub fn render_evaluation(outcome: &EvaluationOutcome) -> String {
    let sep = "=".repeat(WIDTH);
    let mut lines = vec![sep.clone(), "  TEST COVERAGE REPORT".to_string(), sep.clone()];
    match outcome {
        EvaluationOutcome::Executed(result) => render_result(result, &mut lines),
        EvaluationOutcome::LoadFailed(load_error) => render_load_error(load_error, &mut lines),
    }
    lines.push(sep);
    lines.join("\n")
}

fn cell<F>(outcome: &EvaluationOutcome, value: F) -> String
where
    F: Fn(&EvaluationResult) -> String,
{
    match outcome {
        EvaluationOutcome::Executed(result) => value(result),
        EvaluationOutcome::LoadFailed(_) => "-".to_string(),
    }
}

fn row<F>(metric: &str, result: &ComparisonResult, value: F) -> ComparisonRow
where
    F: Fn(&EvaluationResult) -> String,
{
    ComparisonRow {
        metric: metric.to_string(),
        unguided: cell(&result.unguided, &value),
        guided: cell(&result.guided, &value),
    }
}

fn status(outcome: &EvaluationOutcome) -> String {
    match outcome {
        EvaluationOutcome::Executed(_) => "executed".to_string(),
        EvaluationOutcome::LoadFailed(_) => LOAD_ERROR.to_string(),
    }
}

pub fn format_delta(delta_percent: Option<f64>) -> String {
    match delta_percent {
        Some(delta) => format!("{:+.1} pp", delta),
        None => "n/a".to_string(),
    }
}

pub fn render_comparison(result: &ComparisonResult) -> String {
    let sep = "=".repeat(WIDTH);
    let rows = vec![
        ComparisonRow {
            metric: "Status".to_string(),
            unguided: status(&result.unguided),
            guided: status(&result.guided),
        },
        row("Coverage %", result, |r| format!("{:.1}%", r.coverage_percent)),
        row("Statements covered", result, |r| r.statements_covered.to_string()),
        row("Statements total", result, |r| r.statements_total.to_string()),
        row("Tests passed", result, |r| r.tests_passed.to_string()),
        row("Tests failed", result, |r| r.tests_failed.to_string()),
        row("Tests errored", result, |r| r.tests_errored.to_string()),
        row("Meets goal", result, |r| goal_status(r).to_string()),
    ];
    let mut table = Table::new(rows);
    table.with(Style::rounded());

    let mut lines = vec![
        sep.clone(),
        "  GUIDED vs. UNGUIDED COVERAGE COMPARISON".to_string(),
        sep.clone(),
        table.to_string(),
        String::new(),
    ];
    let note = match result.delta_percent {
        Some(_) => "",
        None => " (coverage undefined for at least one side)",
    };
    lines.push(format!(
        "  Delta (guided - unguided): {}{}",
        format_delta(result.delta_percent),
        note
    ));
    for (label, outcome) in [("unguided", &result.unguided), ("guided", &result.guided)] {
        if let EvaluationOutcome::LoadFailed(load_error) = outcome {
            lines.push(format!("  {} {}: {}", label, LOAD_ERROR, load_error));
        }
    }
    lines.push(sep);
    lines.join("\n")
}

/// Highlights status words of a rendered report for terminal output.
pub fn colorize(report: &str) -> String {
    report
        .lines()
        .map(|line| {
            if line.contains(LOAD_ERROR) {
                line.replace(LOAD_ERROR, &LOAD_ERROR.red().bold().to_string())
            } else if line.contains(PASS) || line.contains(FAIL) {
                line.replace(PASS, &PASS.green().bold().to_string())
                    .replace(FAIL, &FAIL.red().bold().to_string())
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::{
        evaluator::{LoadErrorKind, compare::ComparisonResult},
        runtime::{SourceCoverage, TestCounts},
    };

    fn result(passed: usize, failed: usize, covered: usize, total: usize) -> EvaluationOutcome {
        EvaluationOutcome::Executed(EvaluationResult::new(
            TestCounts {
                passed,
                failed,
                errors: 0,
                skipped: 0,
            },
            SourceCoverage {
                statements_total: total,
                statements_covered: covered,
                covered_lines: (1..=covered).collect(),
                uncovered_lines: (covered + 1..=total).collect(),
            },
            60.0,
        ))
    }

    fn load_failed() -> EvaluationOutcome {
        EvaluationOutcome::LoadFailed(LoadError::new(
            LoadErrorKind::Collection,
            Path::new("test_worse.py"),
            "SyntaxError: invalid syntax",
        ))
    }

    #[test]
    fn line_ranges() {
        assert_eq!(format_line_ranges(&[1, 2, 3, 7, 9, 10]), "1-3, 7, 9-10");
        assert_eq!(format_line_ranges(&[5]), "5");
        assert_eq!(format_line_ranges(&[]), "");
    }

    #[test]
    fn evaluation_report_lists_counts_and_goal() {
        let report = render_evaluation(&result(12, 3, 300, 435));

        assert!(report.contains("Coverage       : 69.0%"));
        assert!(report.contains("Statements     : 435"));
        assert!(report.contains("Not covered    : 135"));
        assert!(report.contains("Uncovered lines: 301-435"));
        assert!(report.contains("Passed  : 12"));
        assert!(report.contains("Failed  : 3"));
        assert!(report.contains("Total   : 15"));
        assert!(report.contains("Goal (60.0%) : PASS"));
    }

    #[test]
    fn load_error_report_has_no_coverage_number() {
        let report = render_evaluation(&load_failed());

        assert!(report.contains("LOAD ERROR: test file failed to load 'test_worse.py'"));
        assert!(report.contains("SyntaxError: invalid syntax"));
        assert!(!report.contains('%'));
    }

    #[test]
    fn comparison_reports_unguided_before_guided_and_delta() {
        let comparison = ComparisonResult::new(result(5, 2, 40, 100), result(9, 0, 80, 100));
        let report = render_comparison(&comparison);

        let unguided = report.find("Unguided").unwrap();
        let guided = report.find("Guided ").unwrap();
        assert!(unguided < guided);
        assert!(report.contains("40.0%"));
        assert!(report.contains("80.0%"));
        assert!(report.contains("Delta (guided - unguided): +40.0 pp"));
    }

    #[test]
    fn comparison_with_failed_side_has_undefined_delta() {
        let comparison = ComparisonResult::new(load_failed(), result(9, 1, 80, 100));
        let report = render_comparison(&comparison);

        assert!(report.contains("Delta (guided - unguided): n/a"));
        assert!(report.contains("unguided LOAD ERROR: test file failed to load 'test_worse.py'"));
        assert!(!report.contains("  guided LOAD ERROR"));
    }

    #[test]
    fn negative_delta_keeps_sign() {
        assert_eq!(format_delta(Some(-29.2)), "-29.2 pp");
        assert_eq!(format_delta(Some(0.0)), "+0.0 pp");
        assert_eq!(format_delta(None), "n/a");
    }
}
