//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::PipelineConfig;
use crate::engine::sql_type;
use crate::error::{Error, Result};
use crate::loader::read_pipeline;
use crate::output::TableReport;
use crate::pipeline::{Pipeline, ProgressReporter};
use crate::schema::TableSpec;
use crate::session::Session;
use crate::types::StageSelection;
use serde_json::{json, Value};
use tracing::{debug, info};

/// Print one message in the selected format
fn print_message(format: OutputFormat, plain: &str, msg: &Value) {
    match format {
        OutputFormat::Plain => println!("{plain}"),
        OutputFormat::Json => println!("{}", serde_json::to_string(msg).unwrap_or_default()),
        OutputFormat::Pretty => {
            println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
        }
    }
}

/// Prints a line on stdout as each table is written
#[derive(Debug, Clone, Copy)]
pub struct ConsoleProgress {
    format: OutputFormat,
}

impl ConsoleProgress {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl ProgressReporter for ConsoleProgress {
    fn table_completed(&self, report: &TableReport) {
        let line = format!("{} table is completed", report.table);
        print_message(
            self.format,
            &line,
            &json!({
                "type": "PROGRESS",
                "message": line,
                "table": report,
            }),
        );
    }
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Run { stage } => self.run_pipeline(*stage).await,
            Commands::Check => self.check(),
            Commands::Tables => {
                self.tables();
                Ok(())
            }
        }
    }

    /// Read the config file, apply overrides and validate
    ///
    /// A missing config file is fine when both locations come from the
    /// command line.
    fn load_config(&self) -> Result<PipelineConfig> {
        let input = self.cli.input.as_deref();
        let output = self.cli.output.as_deref();

        let config = match read_pipeline(&self.cli.config) {
            Ok(config) => config,
            Err(Error::FileNotFound { path }) if input.is_some() && output.is_some() => {
                debug!("no config file at {path}, using defaults");
                PipelineConfig::default()
            }
            Err(e) => return Err(e),
        };

        let config = config.with_overrides(input, output);
        config.validate()?;
        Ok(config)
    }

    /// Run the ETL
    async fn run_pipeline(&self, stage: StageSelection) -> Result<()> {
        let config = self.load_config()?;
        let session = Session::open(&config)?;
        let pipeline = Pipeline::new(session);

        info!(?stage, "starting run");
        let report = pipeline
            .run(stage, &ConsoleProgress::new(self.cli.format))
            .await?;

        let summary = format!(
            "{} tables written ({} rows, {} files) in {} ms",
            report.tables.len(),
            report.total_rows(),
            report.total_files(),
            report.duration_ms
        );
        self.output_message(&summary, &json!({ "type": "SUMMARY", "summary": report }));
        Ok(())
    }

    /// Validate config and count input files per source
    fn check(&self) -> Result<()> {
        let config = self.load_config()?;
        let session = Session::open(&config)?;

        let sources = [
            ("song_data", config.sources.song_data.as_str()),
            ("log_data", config.sources.log_data.as_str()),
        ];
        for (name, pattern) in sources {
            let files = session.list_inputs(pattern)?;
            self.output_message(
                &format!("{name}: {} files match {pattern}", files.len()),
                &json!({
                    "type": "CHECK",
                    "source": name,
                    "pattern": pattern,
                    "files": files.len(),
                }),
            );
        }

        self.output_message(
            "Configuration is valid",
            &json!({
                "type": "CONNECTION_STATUS",
                "connectionStatus": {
                    "status": "SUCCEEDED",
                    "input": session.source().url(),
                    "output": session.sink().location().url(),
                }
            }),
        );
        Ok(())
    }

    /// Show table definitions
    fn tables(&self) {
        for table in TableSpec::all() {
            let mut plain = if table.is_partitioned() {
                format!(
                    "{} ({}) partitioned by {}",
                    table.name(),
                    table.dir_name(),
                    table.partition_by().join(", ")
                )
            } else {
                format!("{} ({})", table.name(), table.dir_name())
            };
            for field in table.schema().fields() {
                let sql = sql_type(field.data_type()).unwrap_or("UNKNOWN");
                plain.push_str(&format!("\n  {}: {sql}", field.name()));
            }

            self.output_message(&plain, &json!({ "type": "TABLE", "table": table.describe() }));
        }
    }

    /// Output a message
    fn output_message(&self, plain: &str, msg: &Value) {
        print_message(self.cli.format, plain, msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn runner(args: &[&str]) -> Runner {
        Runner::new(Cli::parse_from(args))
    }

    #[test]
    fn test_parse_run_defaults() {
        let cli = Cli::parse_from(["songlake", "run"]);
        assert_eq!(cli.config.to_str(), Some("dl.yaml"));
        assert_eq!(cli.format, OutputFormat::Plain);
        assert!(matches!(
            cli.command,
            Commands::Run {
                stage: StageSelection::All
            }
        ));
    }

    #[test]
    fn test_parse_run_options() {
        let cli = Cli::parse_from([
            "songlake",
            "-C",
            "etl.yaml",
            "run",
            "--stage",
            "activity",
            "--input",
            "s3a://udacity-dend/",
            "-f",
            "json",
        ]);
        assert_eq!(cli.config.to_str(), Some("etl.yaml"));
        assert_eq!(cli.input.as_deref(), Some("s3a://udacity-dend/"));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(matches!(
            cli.command,
            Commands::Run {
                stage: StageSelection::Activity
            }
        ));
    }

    #[test]
    fn test_load_config_missing_file_without_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dl.yaml");
        let runner = runner(&["songlake", "-C", path.to_str().unwrap(), "check"]);
        assert!(matches!(
            runner.load_config(),
            Err(Error::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_load_config_overrides_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dl.yaml");
        let runner = runner(&[
            "songlake",
            "-C",
            path.to_str().unwrap(),
            "run",
            "--input",
            "data/",
            "--output",
            "lake/",
        ]);
        let config = runner.load_config().unwrap();
        assert_eq!(config.input_data.as_deref(), Some("data/"));
        assert_eq!(config.output_data.as_deref(), Some("lake/"));
    }

    #[test]
    fn test_load_config_file_with_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dl.yaml");
        std::fs::write(&path, "input_data: raw/\noutput_data: lake/\n").unwrap();

        let runner = runner(&[
            "songlake",
            "-C",
            path.to_str().unwrap(),
            "run",
            "--output",
            "other/",
        ]);
        let config = runner.load_config().unwrap();
        assert_eq!(config.input_data.as_deref(), Some("raw/"));
        assert_eq!(config.output_data.as_deref(), Some("other/"));
    }

    #[test]
    fn test_check_counts_inputs() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        for relative in ["song_data/A/B/C/TRA.json", "log_data/2018/11/events.json"] {
            let path = input.path().join(relative);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "{}\n").unwrap();
        }

        let config = input.path().join("missing.yaml");
        let runner = runner(&[
            "songlake",
            "-C",
            config.to_str().unwrap(),
            "check",
            "--input",
            input.path().to_str().unwrap(),
            "--output",
            output.path().to_str().unwrap(),
        ]);
        runner.check().unwrap();
    }

    #[test]
    fn test_check_fails_without_log_data() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let song = input.path().join("song_data/A/B/C/TRA.json");
        std::fs::create_dir_all(song.parent().unwrap()).unwrap();
        std::fs::write(song, "{}\n").unwrap();

        let config = input.path().join("missing.yaml");
        let runner = runner(&[
            "songlake",
            "-C",
            config.to_str().unwrap(),
            "check",
            "--input",
            input.path().to_str().unwrap(),
            "--output",
            output.path().to_str().unwrap(),
        ]);
        assert!(matches!(
            runner.check(),
            Err(Error::NoInputData { ref pattern }) if pattern == "log_data/*/*/*.json"
        ));
    }
}
