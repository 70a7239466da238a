//! Parquet encoding settings
//!
//! The engine encodes the files itself; this module renders the options of
//! its `COPY ... TO ... (FORMAT PARQUET)` statement.

use crate::config::OutputConfig;
use crate::engine::{ident, literal};
use crate::schema::TableSpec;
use crate::types::OutputCompression;

/// Value written in place of a NULL partition value
pub const HIVE_DEFAULT_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// Configuration for Parquet writer
#[derive(Debug, Clone)]
pub struct ParquetWriterConfig {
    compression: OutputCompression,
    row_group_size: usize,
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        Self {
            compression: OutputCompression::Snappy,
            row_group_size: 1024 * 1024, // 1M rows
        }
    }
}

impl ParquetWriterConfig {
    /// Create a new config with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writer settings from the `output` section of the pipeline config
    pub fn from_output(output: &OutputConfig) -> Self {
        Self::new()
            .with_codec(output.compression)
            .with_row_group_size(output.row_group_size)
    }

    /// Set compression codec
    #[must_use]
    pub fn with_codec(mut self, codec: OutputCompression) -> Self {
        self.compression = codec;
        self
    }

    /// Set row group size
    #[must_use]
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size.max(1);
        self
    }

    pub fn compression(&self) -> OutputCompression {
        self.compression
    }

    /// Get row group size
    #[must_use]
    pub fn row_group_size(&self) -> usize {
        self.row_group_size
    }

    /// Data file stem; the engine numbers `{i}` and appends `.parquet`
    pub fn file_stem(&self) -> String {
        match self.compression.file_tag() {
            Some(tag) => format!("part-{{i}}.{tag}"),
            None => "part-{i}".to_string(),
        }
    }

    /// Name of the single data file of an unpartitioned table
    pub fn single_file_name(&self) -> String {
        format!("{}.parquet", self.file_stem().replace("{i}", "0"))
    }

    /// `COPY` statement writing a table below `target`
    ///
    /// Partitioned tables go to `target` as a Hive directory tree with the
    /// partition columns left out of the files; other tables go to
    /// `target/<single_file_name>`.
    pub fn copy_sql(&self, table: &TableSpec, target: &str) -> String {
        let options = format!(
            "FORMAT PARQUET, COMPRESSION {}, ROW_GROUP_SIZE {}",
            literal(self.compression.codec()),
            self.row_group_size
        );

        if !table.is_partitioned() {
            let file = format!("{}/{}", target.trim_end_matches('/'), self.single_file_name());
            return format!(
                "COPY (SELECT * FROM {}) TO {} ({options})",
                ident(table.name()),
                literal(&file)
            );
        }

        let schema = table.schema();
        let columns: Vec<String> = schema
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .filter(|name| !table.partition_by().contains(name))
            .map(ident)
            .chain(table.partition_by().iter().map(|name| {
                format!(
                    "COALESCE(CAST({col} AS VARCHAR), {}) AS {col}",
                    literal(HIVE_DEFAULT_PARTITION),
                    col = ident(name)
                )
            }))
            .collect();
        let partition_by: Vec<String> = table.partition_by().iter().map(|c| ident(c)).collect();

        format!(
            "COPY (SELECT {} FROM {}) TO {} ({options}, PARTITION_BY ({}), \
             OVERWRITE_OR_IGNORE, FILENAME_PATTERN {})",
            columns.join(", "),
            ident(table.name()),
            literal(target),
            partition_by.join(", "),
            literal(&self.file_stem())
        )
    }
}
