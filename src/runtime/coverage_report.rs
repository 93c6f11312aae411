use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::Path};

use crate::{errors::CovError, utils::path_resolver::resolve_against};

/// The subset of coverage.py's JSON report (`--cov-report=json`) we read.
#[derive(Debug, Serialize, Deserialize)]
pub struct CoverageReport {
    pub files: HashMap<String, FileCoverage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FileCoverage {
    #[serde(default)]
    pub executed_lines: Vec<usize>,
    #[serde(default)]
    pub missing_lines: Vec<usize>,
    pub summary: CoverageSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CoverageSummary {
    pub covered_lines: usize,
    pub num_statements: usize,
    #[serde(default)]
    pub percent_covered: f64,
}

impl CoverageReport {
    pub fn from_file(path: &Path) -> Result<Self, CovError> {
        let json_str = fs::read_to_string(path)?;
        let report: CoverageReport = serde_json::from_str(&json_str)?;
        Ok(report)
    }

    /// Entry for `source_file`. Report keys are relative to `work_dir` unless absolute.
    pub fn find_source(&self, work_dir: &Path, source_file: &Path) -> Option<&FileCoverage> {
        let source = resolve_against(work_dir, source_file);
        let by_path = self
            .files
            .iter()
            .find(|(file_path, _)| resolve_against(work_dir, Path::new(file_path)) == source)
            .map(|(_, file)| file);
        if by_path.is_some() {
            return by_path;
        }

        let file_name = source.file_name()?;
        let mut by_name = self
            .files
            .iter()
            .filter(|(file_path, _)| Path::new(file_path).file_name() == Some(file_name));
        match (by_name.next(), by_name.next()) {
            (Some((_, file)), None) => Some(file),
            _ => None,
        }
    }
}
