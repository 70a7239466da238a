//! Pipeline report and progress types

use crate::output::TableReport;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Receives a call as soon as each table has been written
pub trait ProgressReporter: Send + Sync {
    fn table_completed(&self, report: &TableReport);
}

/// Progress reporter that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn table_completed(&self, _report: &TableReport) {}
}

/// Summary of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Stages that ran, in order
    pub stages: Vec<String>,
    /// One entry per written table, in write order
    pub tables: Vec<TableReport>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl PipelineReport {
    /// Create an empty report
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            stages: Vec::new(),
            tables: Vec::new(),
            duration_ms: 0,
        }
    }

    /// Record a finished stage and its tables
    pub fn add_stage(&mut self, name: &str, tables: Vec<TableReport>) {
        self.stages.push(name.to_string());
        self.tables.extend(tables);
    }

    /// Report for a table by name
    pub fn table(&self, name: &str) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.table == name)
    }

    /// Rows written across all tables
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }

    /// Files written across all tables
    pub fn total_files(&self) -> usize {
        self.tables.iter().map(|t| t.files).sum()
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
