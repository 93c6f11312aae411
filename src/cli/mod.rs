use tracing_subscriber::EnvFilter;

pub mod compare;
pub mod eval;
pub mod settings;

const LOG_ENV: &str = "COV_EVAL_LOG";

/// Logs go to stderr so stdout only carries the report.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
