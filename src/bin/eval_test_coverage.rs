use std::process::ExitCode;

use cov_eval::{cli::eval::run_eval, errors::CovError};

fn main() -> Result<ExitCode, CovError> {
    run_eval()
}
