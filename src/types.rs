//! Common types used throughout songlake
//!
//! Shared enums for configuration and the command line.

use serde::{Deserialize, Serialize};

// ============================================================================
// Input Format
// ============================================================================

/// Layout of the JSON input files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    /// One JSON object per line
    #[default]
    Jsonl,
    /// Whole JSON objects, possibly pretty-printed
    Json,
    /// One top-level array of objects per file
    Array,
    /// Let the engine detect the layout per file
    Auto,
}

impl InputFormat {
    /// Value of the engine's `read_json(format = ...)` option
    pub fn engine_format(self) -> &'static str {
        match self {
            Self::Jsonl => "newline_delimited",
            Self::Json => "unstructured",
            Self::Array => "array",
            Self::Auto => "auto",
        }
    }
}

// ============================================================================
// Output Compression
// ============================================================================

/// Parquet compression codec for output files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputCompression {
    #[default]
    Snappy,
    Zstd,
    Gzip,
    Uncompressed,
}

impl OutputCompression {
    /// Codec name for the engine's Parquet writer
    pub fn codec(self) -> &'static str {
        match self {
            Self::Snappy => "snappy",
            Self::Zstd => "zstd",
            Self::Gzip => "gzip",
            Self::Uncompressed => "uncompressed",
        }
    }

    /// Codec tag used in output file names (`part-0.snappy.parquet`)
    pub fn file_tag(self) -> Option<&'static str> {
        match self {
            Self::Snappy => Some("snappy"),
            Self::Zstd => Some("zstd"),
            Self::Gzip => Some("gz"),
            Self::Uncompressed => None,
        }
    }
}

// ============================================================================
// Stage Selection
// ============================================================================

/// Which pipeline stages to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StageSelection {
    /// Catalog then activity
    #[default]
    All,
    /// Songs and artists only
    Catalog,
    /// Users, time and songplays only
    Activity,
}

impl StageSelection {
    /// Whether the catalog stage runs
    pub fn includes_catalog(self) -> bool {
        matches!(self, Self::All | Self::Catalog)
    }

    /// Whether the activity stage runs
    pub fn includes_activity(self) -> bool {
        matches!(self, Self::All | Self::Activity)
    }
}
