pub mod cli;
pub mod errors;
pub mod evaluator;
pub mod report;
pub mod runtime;
pub mod utils;
