//! Per-run session
//!
//! A [`Session`] bundles everything one run needs: the query engine, where
//! raw data is read from, where tables are written to and how Parquet is
//! encoded. It is opened once and dropped at the end of the run.

use crate::config::{PipelineConfig, SourcesConfig};
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::output::TableSink;
use crate::storage::{Access, StorageLocation};
use arrow::datatypes::Schema;
use tracing::info;

/// Engine, storage and writer settings for one run
pub struct Session {
    engine: Engine,
    source: StorageLocation,
    sources: SourcesConfig,
    sink: TableSink,
}

impl Session {
    /// Open the engine and the source and destination locations
    pub fn open(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;
        let credentials = config.credentials.as_ref();

        let source = StorageLocation::parse(config.input_location()?, credentials, Access::Read)?;
        let destination =
            StorageLocation::parse(config.output_location()?, credentials, Access::Write)?;

        let engine = Engine::open(&config.engine)?;
        engine.configure_storage(&source, credentials)?;
        if destination.scheme() != source.scheme() {
            engine.configure_storage(&destination, credentials)?;
        }

        info!(
            input = %source.url(),
            output = %destination.url(),
            threads = config.engine.threads,
            "session opened"
        );
        Ok(Self {
            engine,
            source,
            sources: config.sources.clone(),
            sink: TableSink::new(destination, &config.output),
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn source(&self) -> &StorageLocation {
        &self.source
    }

    /// Source glob patterns and input format
    pub fn sources(&self) -> &SourcesConfig {
        &self.sources
    }

    /// Writer for the output tables
    pub fn sink(&self) -> &TableSink {
        &self.sink
    }

    /// Input files matching a glob, sorted; nothing matching is an error
    pub fn list_inputs(&self, pattern: &str) -> Result<Vec<String>> {
        let files = self.engine.glob(&self.source.engine_url(pattern)?)?;
        if files.is_empty() {
            return Err(Error::no_input(pattern));
        }
        Ok(files)
    }

    /// Load every file matching `pattern` into the engine table `table`
    pub fn load_json(&self, table: &str, pattern: &str, schema: &Schema) -> Result<usize> {
        let files = self.list_inputs(pattern)?;
        info!(
            table,
            pattern,
            files = files.len(),
            format = self.sources.format.engine_format(),
            "reading input"
        );

        let rows = self
            .engine
            .load_json(table, &files, self.sources.format, schema)?;
        info!(table, rows, "input loaded");
        Ok(rows)
    }
}
