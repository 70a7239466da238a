//! Output module
//!
//! Writes engine tables as Parquet datasets in object storage.
//!
//! # Overview
//!
//! - `writer` - Parquet settings and the engine's `COPY` statement
//! - `sink` - overwrite a table directory, verify the files, write `_SUCCESS`
//!
//! Layout of one partitioned table:
//!
//! ```text
//! songplays.parquet/
//!   year=2018/month=11/part-0.snappy.parquet
//!   year=2018/month=12/part-0.snappy.parquet
//!   _SUCCESS
//! ```

mod sink;
mod writer;

pub use sink::{TableReport, TableSink, SUCCESS_MARKER};
pub use writer::{ParquetWriterConfig, HIVE_DEFAULT_PARTITION};
