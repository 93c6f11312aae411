use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use home::home_dir;

use crate::{errors::CovError, evaluator::DEFAULT_GOAL};

const DEFAULT_PYTHON: &str = "python";
const PYTHON_KEY: &str = "python";
const MIN_COVERAGE_KEY: &str = "min_coverage";

/// Resolved tool settings. Flags and env vars (handled by clap) beat the config file,
/// which beats the defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub python: String,
    pub min_coverage: f64,
}

impl Settings {
    pub fn resolve(python: Option<String>, min_coverage: Option<f64>) -> Result<Self, CovError> {
        let config = load_config()?;
        Self::from_sources(python, min_coverage, &config)
    }

    fn from_sources(
        python: Option<String>,
        min_coverage: Option<f64>,
        config: &HashMap<String, String>,
    ) -> Result<Self, CovError> {
        let python = python
            .or_else(|| config.get(PYTHON_KEY).cloned())
            .unwrap_or_else(|| DEFAULT_PYTHON.to_string());

        let min_coverage = match min_coverage {
            Some(value) => value,
            None => match config.get(MIN_COVERAGE_KEY) {
                Some(raw) => raw.parse::<f64>().map_err(|e| {
                    CovError::InvalidArgument(format!(
                        "Invalid {} '{}' in config: {}",
                        MIN_COVERAGE_KEY, raw, e
                    ))
                })?,
                None => DEFAULT_GOAL,
            },
        };
        if !(0.0..=100.0).contains(&min_coverage) {
            return Err(CovError::InvalidArgument(format!(
                "Minimum coverage must be between 0 and 100, got {}",
                min_coverage
            )));
        }

        Ok(Self {
            python,
            min_coverage,
        })
    }
}

/// Parse the config file and return a HashMap of key-value pairs
fn parse_config(config_path: &Path) -> Result<HashMap<String, String>, CovError> {
    let file = File::open(config_path)?;
    let reader = BufReader::new(file);
    let mut config = HashMap::new();

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if let Some(equals_pos) = trimmed.find('=') {
            let key = trimmed[..equals_pos].trim().to_string();
            let value = trimmed[equals_pos + 1..].trim().to_string();

            if !key.is_empty() {
                config.insert(key, value);
            }
        }
    }

    Ok(config)
}

fn config_location() -> Option<PathBuf> {
    let mut settings_location = home_dir()?;
    settings_location.push(".cov_eval");
    settings_location.push("config");
    Some(settings_location)
}

/// Load config from the default location
pub fn load_config() -> Result<HashMap<String, String>, CovError> {
    match config_location() {
        Some(location) if location.exists() => parse_config(&location),
        _ => Ok(HashMap::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_config() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "# This is a comment").unwrap();
        writeln!(temp_file, "python=python3.12").unwrap();
        writeln!(temp_file, "min_coverage = 75").unwrap();
        writeln!(temp_file, "  key = value  ").unwrap();
        writeln!(temp_file).unwrap();
        writeln!(temp_file, "no separator here").unwrap();

        let config = parse_config(temp_file.path()).unwrap();

        assert_eq!(config.get("python"), Some(&"python3.12".to_string()));
        assert_eq!(config.get("min_coverage"), Some(&"75".to_string()));
        assert_eq!(config.get("key"), Some(&"value".to_string()));
        assert_eq!(config.len(), 3);
    }

    #[test]
    fn defaults_without_flags_or_config() {
        let settings = Settings::from_sources(None, None, &HashMap::new()).unwrap();

        assert_eq!(settings.python, "python");
        assert_eq!(settings.min_coverage, 60.0);
    }

    #[test]
    fn flags_beat_config_file() {
        let config = HashMap::from([
            ("python".to_string(), "python3.11".to_string()),
            ("min_coverage".to_string(), "80".to_string()),
        ]);

        let from_config = Settings::from_sources(None, None, &config).unwrap();
        assert_eq!(from_config.python, "python3.11");
        assert_eq!(from_config.min_coverage, 80.0);

        let from_flags =
            Settings::from_sources(Some("/venv/bin/python".to_string()), Some(55.5), &config)
                .unwrap();
        assert_eq!(from_flags.python, "/venv/bin/python");
        assert_eq!(from_flags.min_coverage, 55.5);
    }

    #[test]
    fn invalid_min_coverage_is_rejected() {
        let config = HashMap::from([("min_coverage".to_string(), "lots".to_string())]);
        assert!(matches!(
            Settings::from_sources(None, None, &config),
            Err(CovError::InvalidArgument(_))
        ));

        assert!(matches!(
            Settings::from_sources(None, Some(120.0), &HashMap::new()),
            Err(CovError::InvalidArgument(_))
        ));
    }
}
