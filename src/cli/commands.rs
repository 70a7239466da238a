//! CLI commands and argument parsing

use crate::types::StageSelection;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Song-play data lake ETL
#[derive(Parser, Debug)]
#[command(name = "songlake")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pipeline configuration file (YAML)
    #[arg(short = 'C', long, global = true, default_value = "dl.yaml")]
    pub config: PathBuf,

    /// Input location, overrides `input_data`
    #[arg(long, global = true)]
    pub input: Option<String>,

    /// Output location, overrides `output_data`
    #[arg(long, global = true)]
    pub output: Option<String>,

    /// Message format
    #[arg(short, long, global = true, default_value = "plain")]
    pub format: OutputFormat,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the ETL and write all tables
    Run {
        /// Stages to run
        #[arg(long, value_enum, default_value = "all")]
        stage: StageSelection,
    },

    /// Validate the configuration and count matching input files
    Check,

    /// Show the output table definitions
    Tables,
}

/// Message format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Indented JSON
    Pretty,
    /// Plain text lines
    Plain,
}
