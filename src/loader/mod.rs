//! YAML Loader module
//!
//! Parse pipeline configuration from YAML files.
//!
//! # Overview
//!
//! The loader module provides:
//! - `load_pipeline` - Read and validate a config file
//! - `load_pipeline_from_str` - Parse a YAML string
//! - `read_pipeline` - Read a config file, leaving validation to the caller

mod parser;

pub use parser::{load_pipeline, load_pipeline_from_str, parse_pipeline, read_pipeline};
