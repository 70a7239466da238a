//! CLI module
//!
//! Command-line interface for running the ETL.
//!
//! # Commands
//!
//! - `run` - Extract, transform and write all tables
//! - `check` - Validate the configuration and the input locations
//! - `tables` - Show the output table definitions

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::{ConsoleProgress, Runner};
