use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::{
    evaluator::{DEFAULT_GOAL, EvaluationOutcome, EvaluationRequest, Evaluator},
    runtime::CoverageRuntime,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRequest {
    pub source_file: PathBuf,
    pub unguided_test_file: PathBuf,
    pub guided_test_file: PathBuf,
    pub work_dir: PathBuf,
    pub goal: f64,
}

impl ComparisonRequest {
    pub fn new(
        source_file: PathBuf,
        unguided_test_file: PathBuf,
        guided_test_file: PathBuf,
        work_dir: PathBuf,
    ) -> Self {
        Self {
            source_file,
            unguided_test_file,
            guided_test_file,
            work_dir,
            goal: DEFAULT_GOAL,
        }
    }

    pub fn with_goal(mut self, goal: f64) -> Self {
        self.goal = goal;
        self
    }

    fn side(&self, test_file: &Path) -> EvaluationRequest {
        EvaluationRequest::new(
            self.source_file.clone(),
            test_file.to_path_buf(),
            self.work_dir.clone(),
        )
        .with_goal(self.goal)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub unguided: EvaluationOutcome,
    pub guided: EvaluationOutcome,
    /// `guided - unguided` in percentage points, `None` when a side has no coverage number.
    pub delta_percent: Option<f64>,
}

impl ComparisonResult {
    pub fn new(unguided: EvaluationOutcome, guided: EvaluationOutcome) -> Self {
        let delta_percent = match (unguided.coverage_percent(), guided.coverage_percent()) {
            (Some(unguided), Some(guided)) => Some(guided - unguided),
            _ => None,
        };
        Self {
            unguided,
            guided,
            delta_percent,
        }
    }

    pub fn any_executed(&self) -> bool {
        self.unguided.executed() || self.guided.executed()
    }
}

impl<RT: CoverageRuntime> Evaluator<RT> {
    /// Evaluates both test files against the same source. Each side runs in its own session,
    /// so a load failure on one side still leaves the other side reported.
    pub fn compare(&self, request: &ComparisonRequest) -> ComparisonResult {
        info!("evaluating unguided test file");
        let unguided = self.evaluate(&request.side(&request.unguided_test_file));
        info!("evaluating guided test file");
        let guided = self.evaluate(&request.side(&request.guided_test_file));
        ComparisonResult::new(unguided, guided)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        evaluator::{
            EvaluationOutcome, Evaluator, LoadErrorKind,
            tests::{FakeRuntime, executed, project},
        },
        runtime::SessionOutput,
    };

    use super::*;

    fn request(dir: &std::path::Path) -> ComparisonRequest {
        ComparisonRequest::new(
            dir.join("app.py"),
            dir.join("test_unguided.py"),
            dir.join("test_guided.py"),
            dir.to_path_buf(),
        )
    }

    #[test]
    fn positive_delta_when_guided_covers_more() {
        let dir = project(&["test_unguided.py", "test_guided.py"]);
        let runtime = FakeRuntime::default()
            .with("test_unguided.py", executed(5, 2, 40, 100))
            .with("test_guided.py", executed(9, 0, 80, 100));
        let evaluator = Evaluator::new(runtime, false);

        let result = evaluator.compare(&request(dir.path()));

        assert_eq!(result.unguided.coverage_percent(), Some(40.0));
        assert_eq!(result.guided.coverage_percent(), Some(80.0));
        assert_eq!(result.delta_percent, Some(40.0));
        assert_eq!(
            *evaluator_calls(&evaluator),
            vec!["test_unguided.py".to_string(), "test_guided.py".to_string()]
        );
    }

    #[test]
    fn negative_delta_when_guided_regresses() {
        let dir = project(&["test_unguided.py", "test_guided.py"]);
        let runtime = FakeRuntime::default()
            .with("test_unguided.py", executed(5, 0, 693, 1000))
            .with("test_guided.py", executed(9, 0, 401, 1000));
        let evaluator = Evaluator::new(runtime, false);

        let result = evaluator.compare(&request(dir.path()));

        let delta = result.delta_percent.unwrap();
        assert!(delta < 0.0);
        assert_eq!(delta, 40.1 - 69.3);
    }

    #[test]
    fn unguided_load_failure_leaves_guided_reported() {
        let dir = project(&["test_unguided.py", "test_guided.py"]);
        let runtime = FakeRuntime::default()
            .with(
                "test_unguided.py",
                SessionOutput::NotLoaded {
                    reason: "SyntaxError: invalid syntax".to_string(),
                },
            )
            .with("test_guided.py", executed(9, 1, 80, 100));
        let evaluator = Evaluator::new(runtime, false);

        let result = evaluator.compare(&request(dir.path()));

        assert!(matches!(
            &result.unguided,
            EvaluationOutcome::LoadFailed(load_error) if load_error.kind == LoadErrorKind::Collection
        ));
        assert_eq!(result.guided.coverage_percent(), Some(80.0));
        assert_eq!(result.delta_percent, None);
        assert!(result.any_executed());
    }

    #[test]
    fn missing_source_fails_both_sides() {
        let dir = project(&["test_unguided.py", "test_guided.py"]);
        let evaluator = Evaluator::new(FakeRuntime::default(), false);

        let mut request = request(dir.path());
        request.source_file = dir.path().join("missing.py");
        let result = evaluator.compare(&request);

        assert!(!result.any_executed());
        assert_eq!(result.delta_percent, None);
        assert!(evaluator_calls(&evaluator).is_empty());
    }

    #[test]
    fn undefined_delta_serializes_as_null() {
        let dir = project(&["test_guided.py"]);
        let runtime = FakeRuntime::default().with("test_guided.py", executed(1, 0, 1, 2));
        let evaluator = Evaluator::new(runtime, false);

        let result = evaluator.compare(&request(dir.path()));
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["unguided"]["status"], "load_failed");
        assert_eq!(json["unguided"]["kind"], "test_file");
        assert_eq!(json["guided"]["status"], "executed");
        assert!(json["delta_percent"].is_null());
    }

    fn evaluator_calls(evaluator: &Evaluator<FakeRuntime>) -> std::cell::Ref<'_, Vec<String>> {
        evaluator.runtime.calls.borrow()
    }
}
