use std::{
    fmt::Display,
    fs::{self, File},
    path::{Path, PathBuf},
};

use serde::Serialize;
use tracing::{error, info};

use crate::runtime::{CoverageRuntime, SessionOutput, SessionRequest, SourceCoverage, TestCounts};

pub mod compare;

pub const DEFAULT_GOAL: f64 = 60.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationRequest {
    pub source_file: PathBuf,
    pub test_file: PathBuf,
    pub work_dir: PathBuf,
    pub goal: f64,
}

impl EvaluationRequest {
    pub fn new(source_file: PathBuf, test_file: PathBuf, work_dir: PathBuf) -> Self {
        Self {
            source_file,
            test_file,
            work_dir,
            goal: DEFAULT_GOAL,
        }
    }

    pub fn with_goal(mut self, goal: f64) -> Self {
        self.goal = goal;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub tests_passed: usize,
    pub tests_failed: usize,
    pub tests_errored: usize,
    pub tests_skipped: usize,
    pub statements_total: usize,
    pub statements_covered: usize,
    pub coverage_percent: f64,
    pub goal: f64,
    pub meets_goal: bool,
    pub covered_lines: Vec<usize>,
    pub uncovered_lines: Vec<usize>,
}

impl EvaluationResult {
    pub fn new(counts: TestCounts, coverage: SourceCoverage, goal: f64) -> Self {
        let coverage_percent = coverage_percent(coverage.statements_covered, coverage.statements_total);
        Self {
            tests_passed: counts.passed,
            tests_failed: counts.failed,
            tests_errored: counts.errors,
            tests_skipped: counts.skipped,
            statements_total: coverage.statements_total,
            statements_covered: coverage.statements_covered,
            coverage_percent,
            goal,
            meets_goal: coverage_percent >= goal,
            covered_lines: coverage.covered_lines,
            uncovered_lines: coverage.uncovered_lines,
        }
    }

    pub fn tests_total(&self) -> usize {
        self.tests_passed + self.tests_failed + self.tests_errored + self.tests_skipped
    }
}

/// `100 * covered / total`, rounded half-up to one decimal. An empty source counts as 0%.
pub fn coverage_percent(covered: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let covered = covered.min(total) as u64;
    let total = total as u64;
    let tenths = (covered * 1000 + total / 2) / total;
    tenths as f64 / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadErrorKind {
    SourceFile,
    TestFile,
    WorkDir,
    Collection,
    Runner,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadError {
    pub kind: LoadErrorKind,
    pub file: PathBuf,
    pub reason: String,
}

impl LoadError {
    pub fn new(kind: LoadErrorKind, file: &Path, reason: &str) -> Self {
        Self {
            kind,
            file: file.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

impl Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let what = match self.kind {
            LoadErrorKind::SourceFile => "cannot load source file",
            LoadErrorKind::TestFile => "cannot load test file",
            LoadErrorKind::WorkDir => "cannot use working directory",
            LoadErrorKind::Collection => "test file failed to load",
            LoadErrorKind::Runner => "could not run tests for",
        };
        write!(f, "{} '{}': {}", what, self.file.display(), self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EvaluationOutcome {
    Executed(EvaluationResult),
    LoadFailed(LoadError),
}

impl EvaluationOutcome {
    pub fn coverage_percent(&self) -> Option<f64> {
        match self {
            EvaluationOutcome::Executed(result) => Some(result.coverage_percent),
            EvaluationOutcome::LoadFailed(_) => None,
        }
    }

    pub fn executed(&self) -> bool {
        matches!(self, EvaluationOutcome::Executed(_))
    }
}

fn check_readable_file(path: &Path, kind: LoadErrorKind) -> Result<PathBuf, LoadError> {
    let metadata = fs::metadata(path).map_err(|e| LoadError::new(kind, path, &e.to_string()))?;
    if !metadata.is_file() {
        return Err(LoadError::new(kind, path, "not a regular file"));
    }
    File::open(path).map_err(|e| LoadError::new(kind, path, &e.to_string()))?;
    path.canonicalize()
        .map_err(|e| LoadError::new(kind, path, &e.to_string()))
}

fn check_work_dir(path: &Path) -> Result<PathBuf, LoadError> {
    let kind = LoadErrorKind::WorkDir;
    let metadata = fs::metadata(path).map_err(|e| LoadError::new(kind, path, &e.to_string()))?;
    if !metadata.is_dir() {
        return Err(LoadError::new(kind, path, "not a directory"));
    }
    path.canonicalize()
        .map_err(|e| LoadError::new(kind, path, &e.to_string()))
}

/// Runs one test file against one source file and scores the coverage.
pub struct Evaluator<RT: CoverageRuntime> {
    runtime: RT,
    verbose: bool,
}

impl<RT: CoverageRuntime> Evaluator<RT> {
    pub fn new(runtime: RT, verbose: bool) -> Self {
        Self { runtime, verbose }
    }

    pub fn evaluate(&self, request: &EvaluationRequest) -> EvaluationOutcome {
        match self.try_evaluate(request) {
            Ok(result) => EvaluationOutcome::Executed(result),
            Err(load_error) => {
                error!("{}", load_error);
                EvaluationOutcome::LoadFailed(load_error)
            }
        }
    }

    fn try_evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationResult, LoadError> {
        let source_file = check_readable_file(&request.source_file, LoadErrorKind::SourceFile)?;
        let test_file = check_readable_file(&request.test_file, LoadErrorKind::TestFile)?;
        let work_dir = check_work_dir(&request.work_dir)?;

        info!(
            runtime = %self.runtime.name(),
            source = %source_file.display(),
            test = %test_file.display(),
            "evaluating coverage"
        );
        let session = SessionRequest {
            source_file: &source_file,
            test_file: &test_file,
            work_dir: &work_dir,
        };
        let output = self
            .runtime
            .run_session(&session, self.verbose)
            .map_err(|e| LoadError::new(LoadErrorKind::Runner, &request.test_file, &e.to_string()))?;

        match output {
            SessionOutput::Executed { counts, coverage } => Ok(EvaluationResult::new(
                counts,
                coverage.unwrap_or_default(),
                request.goal,
            )),
            SessionOutput::NotLoaded { reason } => Err(LoadError::new(
                LoadErrorKind::Collection,
                &request.test_file,
                &reason,
            )),
        }
    }
}
