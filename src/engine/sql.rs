//! SQL text builders
//!
//! Identifiers and literals are always quoted here; nothing user-supplied is
//! spliced into a statement unquoted.

use crate::error::{Error, Result};
use arrow::datatypes::{DataType, Schema, TimeUnit};

/// Double-quoted identifier
pub fn ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Single-quoted string literal
pub fn literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// List literal of strings: `['a', 'b']`
pub fn string_list<S: AsRef<str>>(values: &[S]) -> String {
    let items: Vec<String> = values.iter().map(|v| literal(v.as_ref())).collect();
    format!("[{}]", items.join(", "))
}

/// Quoted column reference
pub fn col(name: &str) -> String {
    ident(name)
}

/// `expr AS "name"`
pub fn alias(expr: &str, name: &str) -> String {
    format!("{expr} AS {}", ident(name))
}

/// Engine type name for an Arrow type
pub fn sql_type(data_type: &DataType) -> Result<&'static str> {
    match data_type {
        DataType::Utf8 => Ok("VARCHAR"),
        DataType::Int64 => Ok("BIGINT"),
        DataType::Int32 => Ok("INTEGER"),
        DataType::Float64 => Ok("DOUBLE"),
        DataType::Boolean => Ok("BOOLEAN"),
        DataType::Timestamp(TimeUnit::Microsecond, None) => Ok("TIMESTAMP"),
        other => Err(Error::schema(format!("No engine type for {other}"))),
    }
}

/// `read_json` column map: `{'song_id': 'VARCHAR', ...}`
pub fn columns_struct(schema: &Schema) -> Result<String> {
    let entries = schema
        .fields()
        .iter()
        .map(|f| Ok(format!("{}: {}", literal(f.name()), literal(sql_type(f.data_type())?))))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("{{{}}}", entries.join(", ")))
}

/// Ordinal of a source row: file index in the high bits, row in the low 33
pub const ROW_ORDINAL: &str = "(_file << 33) + _row";

/// Distinct rows of `columns`, in order of first occurrence
///
/// `from` must carry the `_file`/`_row` columns added when JSON is loaded.
/// NULLs compare equal to each other.
pub fn select_distinct(columns: &[String], from: &str, filter: Option<&str>) -> String {
    let group_by: Vec<String> = (1..=columns.len()).map(|i| i.to_string()).collect();
    let filter = filter.map(|f| format!(" WHERE {f}")).unwrap_or_default();
    format!(
        "SELECT {} FROM {from}{filter} GROUP BY {} ORDER BY min({ROW_ORDINAL})",
        columns.join(", "),
        group_by.join(", ")
    )
}
