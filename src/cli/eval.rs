use std::{path::PathBuf, process::ExitCode};

use clap::Parser;

use crate::{
    cli::{init_logging, settings::Settings},
    errors::CovError,
    evaluator::{EvaluationOutcome, EvaluationRequest, Evaluator},
    report::{colorize, render_evaluation},
    runtime::pytest::PytestCovRuntime,
};

#[derive(Parser, Debug)]
#[command(
    name = "eval_test_coverage",
    version,
    about = "Measure how well one pytest test file covers one python source file"
)]
pub struct EvalCli {
    #[arg(long, help = "Source file to measure coverage for")]
    pub source_file: PathBuf,

    #[arg(long, help = "pytest test file to run")]
    pub test_file: PathBuf,

    #[arg(long, help = "Directory pytest runs from, so imports resolve")]
    pub work_dir: PathBuf,

    #[arg(
        long,
        env = "COV_EVAL_MIN_COVERAGE",
        help = "Coverage goal in percent [default: 60]"
    )]
    pub min_coverage: Option<f64>,

    #[arg(
        long,
        env = "COV_EVAL_PYTHON",
        help = "Python interpreter with pytest and pytest-cov installed [default: python]"
    )]
    pub python: Option<String>,

    #[arg(long, default_value_t = false, help = "Print the result as JSON")]
    pub json: bool,

    #[arg(
        long,
        short,
        default_value_t = false,
        help = "Echo the pytest command and its output"
    )]
    pub verbose: bool,
}

impl EvalCli {
    pub fn request(&self, settings: &Settings) -> EvaluationRequest {
        EvaluationRequest::new(
            self.source_file.clone(),
            self.test_file.clone(),
            self.work_dir.clone(),
        )
        .with_goal(settings.min_coverage)
    }
}

/// Exit 0 whenever the tests executed, failing tests and a missed goal included.
pub fn evaluation_succeeded(outcome: &EvaluationOutcome) -> bool {
    outcome.executed()
}

pub fn run_eval() -> Result<ExitCode, CovError> {
    let cli = EvalCli::parse();
    init_logging(cli.verbose);
    let settings = Settings::resolve(cli.python.clone(), cli.min_coverage)?;

    let evaluator = Evaluator::new(PytestCovRuntime::new(&settings.python), cli.verbose);
    let outcome = evaluator.evaluate(&cli.request(&settings));

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", colorize(&render_evaluation(&outcome)));
    }

    if evaluation_succeeded(&outcome) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
