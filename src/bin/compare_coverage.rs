use std::process::ExitCode;

use cov_eval::{cli::compare::run_compare, errors::CovError};

fn main() -> Result<ExitCode, CovError> {
    run_compare()
}
