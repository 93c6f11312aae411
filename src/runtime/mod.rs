use std::path::Path;

use crate::errors::CovError;

pub mod coverage_report;
pub mod formatter;
pub mod pytest;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestCounts {
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub skipped: usize,
}

/// Statement coverage of the tracked source file for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceCoverage {
    pub statements_total: usize,
    pub statements_covered: usize,
    pub covered_lines: Vec<usize>,
    pub uncovered_lines: Vec<usize>,
}

pub struct SessionRequest<'a> {
    pub source_file: &'a Path,
    pub test_file: &'a Path,
    pub work_dir: &'a Path,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutput {
    /// The test file was collected and run, whatever the individual test outcomes.
    Executed {
        counts: TestCounts,
        /// `None` when the source file never appeared in the coverage data.
        coverage: Option<SourceCoverage>,
    },
    /// The test file could not be collected (syntax error, broken import, missing fixture).
    NotLoaded { reason: String },
}

pub trait CoverageRuntime {
    fn run_session(
        &self,
        request: &SessionRequest,
        verbose: bool,
    ) -> Result<SessionOutput, CovError>;
    fn name(&self) -> String;
}
