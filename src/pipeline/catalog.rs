//! Catalog stage: songs and artists dimensions

use super::{write_table, ProgressReporter, Stage};
use crate::engine::{alias, col, ident, select_distinct};
use crate::error::Result;
use crate::output::TableReport;
use crate::schema::{song_data_schema, TableSpec};
use crate::session::Session;
use async_trait::async_trait;
use tracing::info;

/// Engine table holding the raw song catalog
pub const SONG_DATA: &str = "song_data";

/// Distinct songs from the catalog
pub fn songs_query() -> String {
    select_distinct(
        &[
            col("song_id"),
            col("title"),
            col("artist_id"),
            col("year"),
            col("duration"),
        ],
        &ident(SONG_DATA),
        None,
    )
}

/// Distinct artists from the catalog
pub fn artists_query() -> String {
    select_distinct(
        &[
            col("artist_id"),
            alias(&col("artist_name"), "name"),
            alias(&col("artist_location"), "location"),
            alias(&col("artist_latitude"), "latitude"),
            alias(&col("artist_longitude"), "longitude"),
        ],
        &ident(SONG_DATA),
        None,
    )
}

/// Reads the song catalog and writes `songs` and `artists`
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogStage;

#[async_trait]
impl Stage for CatalogStage {
    fn name(&self) -> &'static str {
        "catalog"
    }

    async fn run(
        &self,
        session: &Session,
        progress: &dyn ProgressReporter,
    ) -> Result<Vec<TableReport>> {
        let records =
            session.load_json(SONG_DATA, &session.sources().song_data, &song_data_schema())?;
        info!(records, "song catalog loaded");

        let songs_report =
            write_table(session, progress, &TableSpec::songs(), &songs_query()).await?;
        let artists_report =
            write_table(session, progress, &TableSpec::artists(), &artists_query()).await?;

        Ok(vec![songs_report, artists_report])
    }
}
