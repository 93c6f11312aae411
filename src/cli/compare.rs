use std::{path::PathBuf, process::ExitCode};

use clap::Parser;

use crate::{
    cli::{init_logging, settings::Settings},
    errors::CovError,
    evaluator::{
        Evaluator,
        compare::{ComparisonRequest, ComparisonResult},
    },
    report::{colorize, render_comparison},
    runtime::pytest::PytestCovRuntime,
};

#[derive(Parser, Debug)]
#[command(
    name = "compare_coverage",
    version,
    about = "Compare coverage of a source file between an unguided and a guided test file"
)]
pub struct CompareCli {
    #[arg(long, help = "Source file to measure coverage for")]
    pub src: PathBuf,

    #[arg(long, help = "Test file written without guidance")]
    pub unguided: PathBuf,

    #[arg(long, help = "Test file written with guidance")]
    pub guided: PathBuf,

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
        help = "Echo the pytest commands and their output"
    )]
    pub verbose: bool,
}

impl CompareCli {
    pub fn request(&self, settings: &Settings) -> ComparisonRequest {
        ComparisonRequest::new(
            self.src.clone(),
            self.unguided.clone(),
            self.guided.clone(),
            self.work_dir.clone(),
        )
        .with_goal(settings.min_coverage)
    }
}

/// An unreadable `--src` fails both sides, so this also covers the missing source case.
pub fn comparison_succeeded(result: &ComparisonResult) -> bool {
    result.any_executed()
}

pub fn run_compare() -> Result<ExitCode, CovError> {
    let cli = CompareCli::parse();
    init_logging(cli.verbose);
    let settings = Settings::resolve(cli.python.clone(), cli.min_coverage)?;

    let evaluator = Evaluator::new(PytestCovRuntime::new(&settings.python), cli.verbose);
    let result = evaluator.compare(&cli.request(&settings));

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", colorize(&render_comparison(&result)));
    }

    if comparison_succeeded(&result) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
