//! DuckDB query engine
//!
//! Every relational step of a run happens inside one in-memory DuckDB
//! database: raw JSON is loaded with `read_json`, the star-schema tables are
//! built with SQL and written out with `COPY ... (FORMAT PARQUET)`.
//!
//! Loaded source tables carry two bookkeeping columns:
//! - `_file` - index of the input file in sorted listing order
//! - `_row` - position of the record within its file

mod sql;

pub use sql::{
    alias, col, columns_struct, ident, literal, select_distinct, sql_type, string_list,
    ROW_ORDINAL,
};

use crate::config::{CredentialsConfig, EngineConfig};
use crate::error::{Error, Result};
use crate::storage::StorageLocation;
use crate::types::InputFormat;
use arrow::datatypes::Schema;
use duckdb::Connection;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// In-memory DuckDB database for one run
pub struct Engine {
    /// DuckDB connection
    conn: Mutex<Connection>,
}

impl Engine {
    /// Open an in-memory database with the configured settings
    pub fn open(config: &EngineConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::engine(format!("Failed to create DuckDB connection: {e}")))?;

        let mut settings = format!(
            "SET threads = {}; SET preserve_insertion_order = true;",
            config.threads.max(1)
        );
        if let Some(limit) = &config.memory_limit {
            settings.push_str(&format!(" SET memory_limit = {};", literal(limit)));
        }
        conn.execute_batch(&settings)
            .map_err(|e| Error::engine(format!("Failed to apply engine settings: {e}")))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::engine("DuckDB connection lock poisoned"))
    }

    /// Load the extension and credentials a location needs
    pub fn configure_storage(
        &self,
        location: &StorageLocation,
        credentials: Option<&CredentialsConfig>,
    ) -> Result<()> {
        let statements = storage_statements(location.scheme(), credentials, |key| {
            std::env::var(key).ok()
        });
        if statements.is_empty() {
            return Ok(());
        }
        self.lock()?
            .execute_batch(&statements.join(" "))
            .map_err(|e| {
                Error::config(format!(
                    "Failed to configure {} storage: {e}",
                    location.scheme()
                ))
            })
    }

    /// Run one or more statements
    pub fn execute(&self, sql: &str) -> Result<()> {
        debug!("Executing: {}", sql);
        self.lock()?
            .execute_batch(sql)
            .map_err(|e| Error::engine(format!("Query failed: {e}")))
    }

    /// Create (or replace) a table from a query, returning its row count
    pub fn create_table(&self, name: &str, query: &str) -> Result<usize> {
        let sql = format!("CREATE OR REPLACE TABLE {} AS {query}", ident(name));
        debug!("Executing: {}", sql);
        self.lock()?
            .execute_batch(&sql)
            .map_err(|e| Error::engine(format!("Failed to build table '{name}': {e}")))?;
        self.count(name)
    }

    /// Rows in a table
    pub fn count(&self, table: &str) -> Result<usize> {
        self.count_query(&format!("SELECT * FROM {}", ident(table)))
    }

    /// Rows a query returns
    pub fn count_query(&self, query: &str) -> Result<usize> {
        let count_sql = format!("SELECT COUNT(*) FROM ({query}) AS q");
        let count: i64 = self
            .lock()?
            .query_row(&count_sql, [], |row| row.get(0))
            .map_err(|e| Error::engine(format!("Failed to count rows: {e}")))?;
        Ok(count as usize)
    }

    /// Files matching a glob URL, sorted
    pub fn glob(&self, pattern: &str) -> Result<Vec<String>> {
        let rows = self.query_text(&format!(
            "SELECT file FROM glob({}) ORDER BY file",
            literal(pattern)
        ))?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.into_iter().next().flatten())
            .collect())
    }

    /// Load JSON files into a table with a declared schema
    ///
    /// Keys missing from a record become NULL and undeclared keys are
    /// ignored. A value that does not convert to its column type fails the
    /// load. Rows keep file order, then record order within each file.
    pub fn load_json(
        &self,
        table: &str,
        files: &[String],
        format: InputFormat,
        schema: &Schema,
    ) -> Result<usize> {
        let query = format!(
            "SELECT * EXCLUDE (filename, _seq), \
             CAST(dense_rank() OVER (ORDER BY filename) - 1 AS BIGINT) AS _file, \
             CAST(row_number() OVER (PARTITION BY filename ORDER BY _seq) - 1 AS BIGINT) AS _row \
             FROM (SELECT *, row_number() OVER () AS _seq FROM read_json({}, format = {}, \
             columns = {}, filename = true)) ORDER BY _file, _row",
            string_list(files),
            literal(format.engine_format()),
            columns_struct(schema)?
        );
        self.create_table(table, &query)
    }

    /// Column names and engine types of a table, in order
    pub fn columns(&self, table: &str) -> Result<Vec<(String, String)>> {
        let rows = self.query_text(&format!(
            "SELECT column_name, data_type FROM information_schema.columns \
             WHERE table_name = {} ORDER BY ordinal_position",
            literal(table)
        ))?;
        Ok(rows
            .into_iter()
            .filter_map(|row| match row.as_slice() {
                [Some(name), Some(data_type)] => Some((name.clone(), data_type.clone())),
                _ => None,
            })
            .collect())
    }

    /// Run a query and return every cell rendered as text
    pub fn query_text(&self, query: &str) -> Result<Vec<Vec<Option<String>>>> {
        let conn = self.lock()?;
        let text_sql = format!("SELECT CAST(COLUMNS(*) AS VARCHAR) FROM ({query}) AS q");
        let mut stmt = conn
            .prepare(&text_sql)
            .map_err(|e| Error::engine(format!("Failed to prepare query: {e}")))?;
        let mut rows = stmt
            .query([])
            .map_err(|e| Error::engine(format!("Query failed: {e}")))?;
        let width = rows.as_ref().map_or(0, |s| s.column_count());

        let mut out = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| Error::engine(format!("Failed to read row: {e}")))?
        {
            let cells = (0..width)
                .map(|i| row.get::<_, Option<String>>(i))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| Error::engine(format!("Failed to read value: {e}")))?;
            out.push(cells);
        }
        Ok(out)
    }
}

/// Statements that give the engine access to a storage scheme
///
/// Explicit credentials win over the environment, read through `env`.
pub fn storage_statements(
    scheme: &str,
    credentials: Option<&CredentialsConfig>,
    env: impl Fn(&str) -> Option<String>,
) -> Vec<String> {
    let from_config = |pick: fn(&CredentialsConfig) -> Option<&String>| {
        credentials.and_then(pick).cloned()
    };
    let set = |name: &str, value: &str| format!("SET {name} = {};", literal(value));

    match scheme {
        "s3" | "r2" | "gs" => {
            let mut statements = vec!["INSTALL httpfs; LOAD httpfs;".to_string()];

            let key_id = from_config(|c| c.access_key_id.as_ref())
                .or_else(|| env("AWS_ACCESS_KEY_ID"))
                .or_else(|| env("GCS_ACCESS_KEY_ID"));
            let secret = from_config(|c| c.secret_access_key.as_ref())
                .or_else(|| env("AWS_SECRET_ACCESS_KEY"))
                .or_else(|| env("GCS_SECRET_ACCESS_KEY"));
            if let (Some(key_id), Some(secret)) = (key_id, secret) {
                statements.push(set("s3_access_key_id", &key_id));
                statements.push(set("s3_secret_access_key", &secret));
            }
            if let Some(token) =
                from_config(|c| c.session_token.as_ref()).or_else(|| env("AWS_SESSION_TOKEN"))
            {
                statements.push(set("s3_session_token", &token));
            }
            if let Some(region) = from_config(|c| c.region.as_ref())
                .or_else(|| env("AWS_REGION"))
                .or_else(|| env("AWS_DEFAULT_REGION"))
            {
                statements.push(set("s3_region", &region));
            }

            // R2, MinIO, LocalStack
            let endpoint = match scheme {
                "gs" => Some("storage.googleapis.com".to_string()),
                "r2" => from_config(|c| c.endpoint.as_ref()).or_else(|| env("R2_ENDPOINT_URL")),
                _ => from_config(|c| c.endpoint.as_ref()).or_else(|| env("AWS_ENDPOINT")),
            };
            if let Some(endpoint) = endpoint {
                let plain_http = endpoint.starts_with("http://")
                    || credentials.is_some_and(|c| c.allow_http);
                let host = endpoint
                    .trim_start_matches("https://")
                    .trim_start_matches("http://")
                    .trim_end_matches('/');
                statements.push(set("s3_endpoint", host));
                statements.push(set("s3_url_style", "path"));
                if plain_http {
                    statements.push("SET s3_use_ssl = false;".to_string());
                }
            }
            statements
        }
        "az" => {
            let mut statements = vec!["INSTALL azure; LOAD azure;".to_string()];
            if let Some(conn_str) = env("AZURE_STORAGE_CONNECTION_STRING") {
                statements.push(set("azure_storage_connection_string", &conn_str));
            }
            statements
        }
        _ => Vec::new(),
    }
}
