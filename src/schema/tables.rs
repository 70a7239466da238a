//! Declared schemas for the raw inputs and the star-schema tables

use crate::engine::sql_type;
use crate::error::{Error, Result};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use serde_json::{json, Value};
use std::sync::Arc;

/// Wall-clock timestamp type used for `start_time` (engine `TIMESTAMP`)
pub fn start_time_type() -> DataType {
    DataType::Timestamp(TimeUnit::Microsecond, None)
}

fn schema(fields: &[(&str, DataType)]) -> SchemaRef {
    Arc::new(Schema::new(
        fields
            .iter()
            .map(|(name, dtype)| Field::new(*name, dtype.clone(), true))
            .collect::<Vec<_>>(),
    ))
}

// ============================================================================
// Source Schemas
// ============================================================================

/// One song-catalog record (song plus its artist)
pub fn song_data_schema() -> SchemaRef {
    schema(&[
        ("artist_id", DataType::Utf8),
        ("artist_latitude", DataType::Float64),
        ("artist_location", DataType::Utf8),
        ("artist_longitude", DataType::Float64),
        ("artist_name", DataType::Utf8),
        ("duration", DataType::Float64),
        ("num_songs", DataType::Int64),
        ("song_id", DataType::Utf8),
        ("title", DataType::Utf8),
        ("year", DataType::Int64),
    ])
}

/// One activity-log event
///
/// `userId` is text in the raw logs (`""` for logged-out events); it is
/// parsed when the user and songplay tables are built.
pub fn log_data_schema() -> SchemaRef {
    schema(&[
        ("artist", DataType::Utf8),
        ("auth", DataType::Utf8),
        ("firstName", DataType::Utf8),
        ("gender", DataType::Utf8),
        ("itemInSession", DataType::Int64),
        ("lastName", DataType::Utf8),
        ("length", DataType::Float64),
        ("level", DataType::Utf8),
        ("location", DataType::Utf8),
        ("method", DataType::Utf8),
        ("page", DataType::Utf8),
        ("registration", DataType::Float64),
        ("sessionId", DataType::Int64),
        ("song", DataType::Utf8),
        ("status", DataType::Int64),
        ("ts", DataType::Int64),
        ("userAgent", DataType::Utf8),
        ("userId", DataType::Utf8),
    ])
}

// ============================================================================
// Output Tables
// ============================================================================

/// An output table: its name, directory, schema and partition columns
#[derive(Debug, Clone)]
pub struct TableSpec {
    name: &'static str,
    dir_name: &'static str,
    schema: SchemaRef,
    partition_by: &'static [&'static str],
}

impl TableSpec {
    /// Songs dimension, partitioned by year and artist
    pub fn songs() -> Self {
        Self {
            name: "songs",
            dir_name: "songs.parquet",
            schema: schema(&[
                ("song_id", DataType::Utf8),
                ("title", DataType::Utf8),
                ("artist_id", DataType::Utf8),
                ("year", DataType::Int64),
                ("duration", DataType::Float64),
            ]),
            partition_by: &["year", "artist_id"],
        }
    }

    /// Artists dimension
    pub fn artists() -> Self {
        Self {
            name: "artists",
            dir_name: "artists.parquet",
            schema: schema(&[
                ("artist_id", DataType::Utf8),
                ("name", DataType::Utf8),
                ("location", DataType::Utf8),
                ("latitude", DataType::Float64),
                ("longitude", DataType::Float64),
            ]),
            partition_by: &[],
        }
    }

    /// Users dimension
    pub fn users() -> Self {
        Self {
            name: "users",
            dir_name: "users.parquet",
            schema: schema(&[
                ("user_id", DataType::Int64),
                ("first_name", DataType::Utf8),
                ("last_name", DataType::Utf8),
                ("gender", DataType::Utf8),
                ("level", DataType::Utf8),
            ]),
            partition_by: &[],
        }
    }

    /// Calendar dimension keyed by start_time
    pub fn time() -> Self {
        Self {
            name: "time",
            dir_name: "time_table.parquet",
            schema: schema(&[
                ("start_time", start_time_type()),
                ("hour", DataType::Int32),
                ("day", DataType::Int32),
                ("week", DataType::Int32),
                ("month", DataType::Int32),
                ("year", DataType::Int32),
                ("weekday", DataType::Int32),
            ]),
            partition_by: &["year", "month"],
        }
    }

    /// Songplays fact table
    pub fn songplays() -> Self {
        Self {
            name: "songplays",
            dir_name: "songplays.parquet",
            schema: schema(&[
                ("start_time", start_time_type()),
                ("user_id", DataType::Int64),
                ("level", DataType::Utf8),
                ("song_id", DataType::Utf8),
                ("artist_id", DataType::Utf8),
                ("session_id", DataType::Int64),
                ("location", DataType::Utf8),
                ("user_agent", DataType::Utf8),
                ("month", DataType::Int32),
                ("year", DataType::Int32),
                ("songplay_id", DataType::Int64),
            ]),
            partition_by: &["year", "month"],
        }
    }

    /// Every output table in write order
    pub fn all() -> Vec<Self> {
        vec![
            Self::songs(),
            Self::artists(),
            Self::users(),
            Self::time(),
            Self::songplays(),
        ]
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Directory below `output_data`
    pub fn dir_name(&self) -> &'static str {
        self.dir_name
    }

    pub fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    pub fn partition_by(&self) -> &'static [&'static str] {
        self.partition_by
    }

    pub fn is_partitioned(&self) -> bool {
        !self.partition_by.is_empty()
    }

    /// Schema of the data files: partition columns live in directory names
    pub fn file_schema(&self) -> SchemaRef {
        let fields: Vec<Field> = self
            .schema
            .fields()
            .iter()
            .filter(|f| !self.partition_by.contains(&f.name().as_str()))
            .map(|f| f.as_ref().clone())
            .collect();
        Arc::new(Schema::new(fields))
    }

    /// Column names and engine types, in order
    pub fn sql_columns(&self) -> Result<Vec<(String, String)>> {
        self.schema
            .fields()
            .iter()
            .map(|f| Ok((f.name().clone(), sql_type(f.data_type())?.to_string())))
            .collect()
    }

    /// Check that a built table has this table's columns and types, in order
    pub fn check(&self, actual: &[(String, String)]) -> Result<()> {
        let expected = self.sql_columns()?;
        if expected != actual {
            return Err(Error::schema(format!(
                "Table '{}' expects columns {:?}, got {:?}",
                self.name, expected, actual
            )));
        }
        Ok(())
    }

    /// JSON description for the `tables` command
    pub fn describe(&self) -> Value {
        let columns: Vec<Value> = self
            .schema
            .fields()
            .iter()
            .map(|f| {
                json!({
                    "name": f.name(),
                    "type": sql_type(f.data_type()).unwrap_or("UNKNOWN"),
                })
            })
            .collect();
        json!({
            "name": self.name,
            "path": self.dir_name,
            "columns": columns,
            "partition_by": self.partition_by,
        })
    }
}
