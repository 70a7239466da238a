//! YAML parser for pipeline configuration
//!
//! Parses and validates pipeline config files.

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Load and validate a pipeline config from a file path
///
/// # Examples
///
/// ```ignore
/// let config = load_pipeline("dl.yaml")?;
/// ```
pub fn load_pipeline(path: impl AsRef<Path>) -> Result<PipelineConfig> {
    let config = read_pipeline(path)?;
    config.validate()?;
    Ok(config)
}

/// Load and validate a pipeline config from a YAML string
pub fn load_pipeline_from_str(yaml: &str) -> Result<PipelineConfig> {
    let config = parse_pipeline(yaml)?;
    config.validate()?;
    Ok(config)
}

/// Parse a pipeline config without validating it
///
/// Used when command-line overrides still have to be applied.
pub fn parse_pipeline(yaml: &str) -> Result<PipelineConfig> {
    if yaml.trim().is_empty() {
        return Ok(PipelineConfig::default());
    }
    serde_yaml::from_str(yaml)
        .map_err(|e| Error::config(format!("Failed to parse pipeline YAML: {e}")))
}

/// Read a config file without validating it
pub fn read_pipeline(path: impl AsRef<Path>) -> Result<PipelineConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        }
    })?;
    parse_pipeline(&content)
}
