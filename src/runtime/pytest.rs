use std::process::Command;

use tempfile::tempdir;
use tracing::{debug, warn};

use crate::{
    errors::CovError,
    runtime::{
        CoverageRuntime, SessionOutput, SessionRequest, SourceCoverage, TestCounts,
        coverage_report::CoverageReport, formatter::PytestSummaryFormatter,
    },
    utils::{
        path_resolver::dotted_module_name,
        process::{command_line, run_and_capture_print},
    },
};

const COVERAGE_JSON: &str = "coverage.json";
const COVERAGE_DATA: &str = ".coverage";

/// pytest exit codes that mean the session was collected and executed.
const EXIT_ALL_PASSED: i32 = 0;
const EXIT_TESTS_FAILED: i32 = 1;
const EXIT_NO_TESTS_COLLECTED: i32 = 5;

/// Runs `python -m pytest --cov` for a single test file.
pub struct PytestCovRuntime {
    python: String,
}

impl PytestCovRuntime {
    pub fn new(python: &str) -> Self {
        Self {
            python: python.to_string(),
        }
    }
}

impl Default for PytestCovRuntime {
    fn default() -> Self {
        Self::new("python")
    }
}

impl CoverageRuntime for PytestCovRuntime {
    fn run_session(
        &self,
        request: &SessionRequest,
        verbose: bool,
    ) -> Result<SessionOutput, CovError> {
        let cov_target = dotted_module_name(request.source_file)?;
        // coverage artifacts live outside the working directory so reruns start clean
        let artifacts = tempdir()?;
        let coverage_json = artifacts.path().join(COVERAGE_JSON);

        let mut command = Command::new(&self.python);
        command.arg("-m");
        command.arg("pytest");
        command.arg(request.test_file);
        command.args(["--tb=short", "-q", "-p", "no:cacheprovider"]);
        command.arg(format!("--cov={}", cov_target));
        command.arg(format!("--cov-report=json:{}", coverage_json.display()));
        command.arg("--cov-report=term-missing");
        command.current_dir(request.work_dir);
        command.env("COVERAGE_FILE", artifacts.path().join(COVERAGE_DATA));
        command.env("PYTHONBREAKPOINT", "0");
        command.env("PYTHONDONTWRITEBYTECODE", "1");

        if verbose {
            eprintln!("\n{}\n", command_line(&command));
        }
        debug!(command = %command_line(&command), work_dir = %request.work_dir.display(), "starting pytest session");

        let mut formatter = PytestSummaryFormatter::new()?;
        let output = run_and_capture_print(command, &mut formatter)?;
        if verbose {
            eprint!("{}", output.combined());
        }

        let code = output.status.code();
        debug!(exit_code = ?code, "pytest session finished");
        match code {
            Some(EXIT_ALL_PASSED) | Some(EXIT_TESTS_FAILED) | Some(EXIT_NO_TESTS_COLLECTED) => {}
            _ => {
                let reason = formatter
                    .load_error_reason()
                    .unwrap_or_else(|| format!("pytest exited with {}", output.status));
                return Ok(SessionOutput::NotLoaded { reason });
            }
        }

        if !formatter.saw_summary() && code != Some(EXIT_NO_TESTS_COLLECTED) {
            warn!("no pytest summary line found, test counts default to zero");
        }
        let counts = TestCounts {
            passed: formatter.passed,
            failed: formatter.failed,
            errors: formatter.errors,
            skipped: formatter.skipped,
        };

        // every collected test erroring in setup (e.g. a missing fixture) means nothing ran
        if counts.errors > 0 && counts.passed == 0 && counts.failed == 0 {
            let reason = formatter
                .load_error_reason()
                .unwrap_or_else(|| format!("{} error(s) during test setup", counts.errors));
            return Ok(SessionOutput::NotLoaded { reason });
        }

        if !coverage_json.exists() {
            warn!(
                "pytest-cov wrote no report to {}, is pytest-cov installed?",
                coverage_json.display()
            );
            return Ok(SessionOutput::Executed {
                counts,
                coverage: None,
            });
        }

        let report = CoverageReport::from_file(&coverage_json)?;
        let coverage = report
            .find_source(request.work_dir, request.source_file)
            .map(|file| {
                let mut covered_lines = file.executed_lines.clone();
                let mut uncovered_lines = file.missing_lines.clone();
                covered_lines.sort_unstable();
                uncovered_lines.sort_unstable();
                SourceCoverage {
                    statements_total: file.summary.num_statements,
                    statements_covered: file.summary.covered_lines,
                    covered_lines,
                    uncovered_lines,
                }
            });
        if coverage.is_none() {
            warn!(
                module = %cov_target,
                "source file missing from coverage data, it was never imported by the tests"
            );
        }

        Ok(SessionOutput::Executed { counts, coverage })
    }

    fn name(&self) -> String {
        String::from("pytest-cov")
    }
}
