//! Schema module
//!
//! Declared schemas for the JSON inputs and the five output tables.
//!
//! Schemas are declared rather than inferred so that every run produces the
//! same column types regardless of which values happen to appear.

mod tables;

pub use tables::{log_data_schema, song_data_schema, start_time_type, TableSpec};
