//! Table sink: overwrite a table directory with partitioned Parquet files

use super::writer::ParquetWriterConfig;
use crate::config::OutputConfig;
use crate::engine::{ident, Engine};
use crate::error::{Error, Result, ResultExt};
use crate::schema::TableSpec;
use crate::storage::StorageLocation;
use bytes::Bytes;
use object_store::ObjectMeta;
use parquet::arrow::async_reader::{AsyncFileReader, ParquetObjectReader};
use serde::Serialize;
use tracing::{debug, info};

/// Marker written after every file of a table
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// What was written for one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
    pub table: String,
    pub location: String,
    pub rows: usize,
    pub files: usize,
    pub partitions: usize,
    /// Bytes of Parquet data written
    pub bytes: u64,
    /// Objects deleted from the previous run
    pub replaced: usize,
}

/// Writes whole tables below the destination location
#[derive(Debug, Clone)]
pub struct TableSink {
    location: StorageLocation,
    writer: ParquetWriterConfig,
    success_marker: bool,
}

impl TableSink {
    pub fn new(location: StorageLocation, output: &OutputConfig) -> Self {
        Self {
            location,
            writer: ParquetWriterConfig::from_output(output),
            success_marker: output.success_marker,
        }
    }

    pub fn location(&self) -> &StorageLocation {
        &self.location
    }

    pub fn writer(&self) -> &ParquetWriterConfig {
        &self.writer
    }

    /// Replace the table's directory with the engine table of the same name
    ///
    /// Everything below the table directory is deleted first, so rows from
    /// earlier runs never survive. The written files are read back and their
    /// row counts must add up to the table's.
    pub async fn write(&self, engine: &Engine, table: &TableSpec) -> Result<TableReport> {
        table.check(&engine.columns(table.name())?)?;
        let rows = engine.count(table.name())?;

        let replaced = self
            .location
            .delete_prefix(&[table.dir_name()])
            .await
            .with_context(|| format!("Failed to clear previous {} output", table.name()))?;
        if replaced > 0 {
            debug!(table = table.name(), replaced, "removed previous output");
        }

        self.location.prepare_dir(&[table.dir_name()])?;
        let target = self.location.engine_url(table.dir_name())?;
        engine
            .execute(&self.writer.copy_sql(table, &target))
            .with_context(|| format!("Failed to write {} files", table.name()))?;

        let files: Vec<ObjectMeta> = self
            .location
            .list(&[table.dir_name()])
            .await?
            .into_iter()
            .filter(|meta| meta.location.as_ref().ends_with(".parquet"))
            .collect();
        self.verify(table, &files, rows).await?;

        if self.success_marker {
            self.location
                .put(&[table.dir_name(), SUCCESS_MARKER], Bytes::new())
                .await
                .with_context(|| format!("Failed to mark {} complete", table.name()))?;
        }

        let partitions = if table.is_partitioned() {
            let keys: Vec<String> = table.partition_by().iter().map(|c| ident(c)).collect();
            engine.count_query(&format!(
                "SELECT DISTINCT {} FROM {}",
                keys.join(", "),
                ident(table.name())
            ))?
        } else {
            0
        };

        let report = TableReport {
            table: table.name().to_string(),
            location: self.location.display(&self.location.path(&[table.dir_name()])),
            rows,
            files: files.len(),
            partitions,
            bytes: files.iter().map(|meta| meta.size as u64).sum(),
            replaced,
        };

        info!(
            table = %report.table,
            rows = report.rows,
            files = report.files,
            partitions = report.partitions,
            "wrote {}",
            report.location
        );
        Ok(report)
    }

    /// Read the footers of the written files and check columns and row count
    async fn verify(&self, table: &TableSpec, files: &[ObjectMeta], expected: usize) -> Result<()> {
        let file_schema = table.file_schema();
        let columns: Vec<&str> = file_schema
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect();

        let mut written = 0;
        for meta in files {
            let mut reader = ParquetObjectReader::new(self.location.store(), meta.clone());
            let metadata = reader.get_metadata().await?;
            let footer = metadata.file_metadata();

            let found: Vec<&str> = footer
                .schema_descr()
                .columns()
                .iter()
                .map(|c| c.name())
                .collect();
            if found != columns {
                return Err(Error::output(format!(
                    "{} has columns {found:?}, expected {columns:?}",
                    meta.location
                )));
            }
            debug!(rows = footer.num_rows(), "verified {}", meta.location);
            written += footer.num_rows() as usize;
        }

        if written != expected {
            return Err(Error::output(format!(
                "Table '{}' has {expected} rows but {written} were written",
                table.name()
            )));
        }
        Ok(())
    }
}
