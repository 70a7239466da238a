//! Configuration types for a pipeline run
//!
//! This module contains the structures read from the pipeline YAML file.
//! Loading and validation live in [`crate::loader`].

use crate::error::{Error, Result};
use crate::types::{InputFormat, OutputCompression};
use serde::{Deserialize, Serialize};

// ============================================================================
// Top-Level Pipeline Config
// ============================================================================

/// Complete pipeline configuration loaded from YAML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root of the raw JSON data (`s3a://bucket/`, `/data/raw`, ...)
    #[serde(default)]
    pub input_data: Option<String>,

    /// Root of the analytics lake the tables are written to
    #[serde(default)]
    pub output_data: Option<String>,

    /// Storage credentials; when absent the environment is used
    #[serde(default)]
    pub credentials: Option<CredentialsConfig>,

    /// Input record families
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Parquet output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Query engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl PipelineConfig {
    /// Replace the configured input/output locations
    #[must_use]
    pub fn with_overrides(mut self, input: Option<&str>, output: Option<&str>) -> Self {
        if let Some(input) = input {
            self.input_data = Some(input.to_string());
        }
        if let Some(output) = output {
            self.output_data = Some(output.to_string());
        }
        self
    }

    /// Input location, required
    pub fn input_location(&self) -> Result<&str> {
        required(self.input_data.as_deref(), "input_data")
    }

    /// Output location, required
    pub fn output_location(&self) -> Result<&str> {
        required(self.output_data.as_deref(), "output_data")
    }

    /// Check required fields and value ranges
    pub fn validate(&self) -> Result<()> {
        self.input_location()?;
        self.output_location()?;

        if self.sources.song_data.trim().is_empty() {
            return Err(Error::invalid_value("sources.song_data", "pattern is empty"));
        }
        if self.sources.log_data.trim().is_empty() {
            return Err(Error::invalid_value("sources.log_data", "pattern is empty"));
        }
        if self.output.row_group_size == 0 {
            return Err(Error::invalid_value(
                "output.row_group_size",
                "must be greater than 0",
            ));
        }
        if self.engine.threads == 0 {
            return Err(Error::invalid_value(
                "engine.threads",
                "must be greater than 0",
            ));
        }
        if let Some(limit) = &self.engine.memory_limit {
            if limit.trim().is_empty() {
                return Err(Error::invalid_value("engine.memory_limit", "is empty"));
            }
        }

        Ok(())
    }
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::missing_field(field)),
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Object storage credentials
///
/// Values given here are applied on top of whatever the storage builders
/// read from the environment (`AWS_ACCESS_KEY_ID`, `AWS_REGION`, ...).
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub access_key_id: Option<String>,

    #[serde(default)]
    pub secret_access_key: Option<String>,

    #[serde(default)]
    pub session_token: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    /// Custom endpoint (MinIO, R2, LocalStack)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Allow plain-HTTP endpoints
    #[serde(default)]
    pub allow_http: bool,
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "***");
        f.debug_struct("CredentialsConfig")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &mask(&self.secret_access_key))
            .field("session_token", &mask(&self.session_token))
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("allow_http", &self.allow_http)
            .finish()
    }
}

// ============================================================================
// Sources
// ============================================================================

/// Input record families, as glob patterns relative to `input_data`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Song-catalog files
    #[serde(default = "default_song_data")]
    pub song_data: String,

    /// Activity-log files
    #[serde(default = "default_log_data")]
    pub log_data: String,

    /// Layout of each input file
    #[serde(default)]
    pub format: InputFormat,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            song_data: default_song_data(),
            log_data: default_log_data(),
            format: InputFormat::default(),
        }
    }
}

fn default_song_data() -> String {
    "song_data/*/*/*/*.json".to_string()
}

fn default_log_data() -> String {
    "log_data/*/*/*.json".to_string()
}

// ============================================================================
// Output
// ============================================================================

/// Parquet output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub compression: OutputCompression,

    /// Maximum rows per Parquet row group
    #[serde(default = "default_row_group_size")]
    pub row_group_size: usize,

    /// Write an empty `_SUCCESS` object after each table
    #[serde(default = "default_true")]
    pub success_marker: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            compression: OutputCompression::default(),
            row_group_size: default_row_group_size(),
            success_marker: default_true(),
        }
    }
}

fn default_row_group_size() -> usize {
    1024 * 1024
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Engine
// ============================================================================

/// DuckDB session settings
///
/// A single thread keeps row order, and with it the output bytes, stable
/// from run to run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// DuckDB memory limit, e.g. `4GB`
    #[serde(default)]
    pub memory_limit: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            memory_limit: None,
        }
    }
}

fn default_threads() -> usize {
    1
}
