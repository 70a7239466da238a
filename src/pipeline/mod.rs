//! Pipeline module
//!
//! The two ETL stages and the runner that sequences them.
//!
//! # Overview
//!
//! - `CatalogStage` - song catalog → `songs`, `artists`
//! - `ActivityStage` - activity log (+ catalog) → `users`, `time`, `songplays`
//! - `Pipeline` - runs the selected stages in order, catalog first
//!
//! Each stage loads its raw JSON into engine tables and builds every output
//! table with one SQL query.
//!
//! Stages are fail-fast: the first error aborts the run. Tables already
//! written by an earlier stage stay in place.

mod activity;
mod catalog;
mod types;

pub use activity::{
    song_play_filter, songplays_query, time_query, user_id_sql, users_query, ActivityStage,
    LOG_DATA, NEXT_SONG,
};
pub use catalog::{artists_query, songs_query, CatalogStage, SONG_DATA};
pub use types::{NoProgress, PipelineReport, ProgressReporter};

use crate::error::Result;
use crate::output::TableReport;
use crate::schema::TableSpec;
use crate::session::Session;
use crate::types::StageSelection;
use async_trait::async_trait;
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, info};

/// One step of the pipeline
#[async_trait]
pub trait Stage: Send + Sync {
    /// Short name for logging and reports
    fn name(&self) -> &'static str;

    /// Load, build and write this stage's tables
    async fn run(
        &self,
        session: &Session,
        progress: &dyn ProgressReporter,
    ) -> Result<Vec<TableReport>>;
}

/// Build one table from a query, write it and tell the reporter about it
async fn write_table(
    session: &Session,
    progress: &dyn ProgressReporter,
    table: &TableSpec,
    query: &str,
) -> Result<TableReport> {
    let rows = session.engine().create_table(table.name(), query)?;
    debug!(table = table.name(), rows, "table built");
    let report = session.sink().write(session.engine(), table).await?;
    progress.table_completed(&report);
    Ok(report)
}

/// Runs stages against one session
pub struct Pipeline {
    session: Session,
}

impl Pipeline {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Stages included in a selection, in run order
    pub fn stages(selection: StageSelection) -> Vec<Box<dyn Stage>> {
        let mut stages: Vec<Box<dyn Stage>> = Vec::new();
        if selection.includes_catalog() {
            stages.push(Box::new(CatalogStage));
        }
        if selection.includes_activity() {
            stages.push(Box::new(ActivityStage));
        }
        stages
    }

    /// Run the selected stages, stopping at the first error
    pub async fn run(
        &self,
        selection: StageSelection,
        progress: &dyn ProgressReporter,
    ) -> Result<PipelineReport> {
        let start = Instant::now();
        let mut report = PipelineReport::new(Utc::now());

        for stage in Self::stages(selection) {
            info!(stage = stage.name(), "stage started");
            let tables = stage.run(&self.session, progress).await?;
            info!(stage = stage.name(), tables = tables.len(), "stage finished");
            report.add_stage(stage.name(), tables);
        }

        report.set_duration(start.elapsed().as_millis() as u64);
        info!(
            rows = report.total_rows(),
            files = report.total_files(),
            duration_ms = report.duration_ms,
            "pipeline finished"
        );
        Ok(report)
    }
}
