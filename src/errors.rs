use std::fmt::Display;

#[derive(Debug)]
pub enum CovError {
    IoError(std::io::Error),
    Regex(regex::Error),
    Json(serde_json::Error),
    InvalidArgument(String),
    ReportError(String),
    RuntimeError(String),
}

impl std::error::Error for CovError {}

impl Display for CovError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CovError::IoError(io_error) => write!(f, "{}", io_error),
            CovError::Regex(error) => write!(f, "{}", error),
            CovError::Json(error) => write!(f, "{}", error),
            CovError::InvalidArgument(error) => write!(f, "{}", error),
            CovError::ReportError(error) => write!(f, "{}", error),
            CovError::RuntimeError(error) => write!(f, "{}", error),
        }
    }
}

impl From<std::io::Error> for CovError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err)
    }
}

impl From<regex::Error> for CovError {
    fn from(value: regex::Error) -> Self {
        Self::Regex(value)
    }
}

impl From<serde_json::Error> for CovError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
