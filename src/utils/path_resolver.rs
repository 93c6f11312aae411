use std::path::{Path, PathBuf};

use crate::errors::CovError;

/// Importable dotted module name of a python file, e.g. `src/flask/app.py` -> `flask.app`.
///
/// Walks up the parent directories for as long as they are packages (contain `__init__.py`).
pub fn dotted_module_name(source_file: &Path) -> Result<String, CovError> {
    let stem = source_file
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| {
            CovError::InvalidArgument(format!(
                "File path could not be parsed: {}",
                source_file.display()
            ))
        })?;

    let mut parts = vec![stem.to_string()];
    let mut dir = source_file.parent();
    while let Some(package) = dir {
        if !package.join("__init__.py").exists() {
            break;
        }
        match package.file_name().and_then(|name| name.to_str()) {
            Some(name) => parts.insert(0, name.to_string()),
            None => break,
        }
        dir = package.parent();
    }

    Ok(parts.join("."))
}

/// Absolute form of `path`, resolved against `base` when relative.
pub fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    joined.canonicalize().unwrap_or(joined)
}
