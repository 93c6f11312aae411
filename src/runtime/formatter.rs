use regex::Regex;

use crate::{errors::CovError, utils::process::OutputFormatter};

const ERROR_DETAIL: &str = "E   ";
const ERROR_PREFIX: &str = "ERROR";

/// Collects test counts and load errors from pytest's terminal output.
#[derive(Clone, Debug)]
pub struct PytestSummaryFormatter {
    summary_line: Regex,
    progress_line: Regex,
    count: Regex,
    exception_line: Regex,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub skipped: usize,
    saw_summary: bool,
    error_details: Vec<String>,
    error_headlines: Vec<String>,
    last_line: Option<String>,
}

impl PytestSummaryFormatter {
    pub fn new() -> Result<Self, CovError> {
        Ok(Self {
            summary_line: Regex::new(r"^=*\s*(\d+ \w+(?:, \d+ \w+)*) in \d+(?:\.\d+)?s")?,
            progress_line: Regex::new(r"^[.FEsxX]+\s*(?:\[\s*\d+%\])?$")?,
            count: Regex::new(r"(\d+) (passed|failed|errors?|skipped)")?,
            exception_line: Regex::new(r"^[\w.]*(Error|Exception)\b")?,
            passed: 0,
            failed: 0,
            errors: 0,
            skipped: 0,
            saw_summary: false,
            error_details: vec![],
            error_headlines: vec![],
            last_line: None,
        })
    }

    pub fn saw_summary(&self) -> bool {
        self.saw_summary
    }

    /// Best explanation for a session that did not load, e.g. `SyntaxError: invalid syntax`.
    pub fn load_error_reason(&self) -> Option<String> {
        self.error_details
            .iter()
            .find(|detail| self.exception_line.is_match(detail))
            .or(self.error_details.first())
            .or(self.error_headlines.first())
            .or(self.last_line.as_ref())
            .cloned()
    }

    fn parse_line(&mut self, line: &str) {
        let trimmed = line.trim();
        // "..FE   [100%]" would otherwise pass for an "E   " detail
        if trimmed.is_empty() || self.progress_line.is_match(trimmed) {
            return;
        }
        self.last_line = Some(trimmed.trim_matches('=').trim().to_string());

        if let Some(detail) = line.strip_prefix(ERROR_DETAIL) {
            self.error_details.push(detail.trim().to_string());
            return;
        }

        if trimmed.starts_with(ERROR_PREFIX) {
            self.error_headlines
                .push(trimmed.trim_matches('=').trim().to_string());
            return;
        }

        if trimmed.contains(ERROR_PREFIX) && trimmed.starts_with('_') {
            // "____ ERROR collecting test_app.py ____"
            self.error_headlines
                .push(trimmed.trim_matches('_').trim().to_string());
            return;
        }

        let Some(captures) = self.summary_line.captures(trimmed) else {
            return;
        };
        let counts = captures[1].to_string();
        // pytest prints the summary once, keep the last one if output repeats it
        self.passed = 0;
        self.failed = 0;
        self.errors = 0;
        self.skipped = 0;
        for count in self.count.captures_iter(&counts) {
            let Ok(num) = count[1].parse::<usize>() else {
                continue;
            };
            match &count[2] {
                "passed" => self.passed = num,
                "failed" => self.failed = num,
                "error" | "errors" => self.errors = num,
                "skipped" => self.skipped = num,
                _ => {}
            }
        }
        self.saw_summary = true;
    }
}

impl OutputFormatter for PytestSummaryFormatter {
    fn line(&mut self, line: &str) -> Result<(), CovError> {
        self.parse_line(line);
        Ok(())
    }

    fn err_line(&mut self, line: &str) -> Result<(), CovError> {
        self.parse_line(line);
        Ok(())
    }
}
