//! Study data loading.
//!
//! The study ships as two pre-computed CSV files: a task-level table with
//! one row per (participant, task) pair and a user-level table with one row
//! per participant. Both are loaded once and treated as read-only.

pub mod loader;
pub mod table;

pub use loader::{load_table, millis_to_seconds};
pub use table::{Column, ColumnKind, Table, Value};

use crate::error::EdaResult;
use std::path::{Path, PathBuf};
use tracing::info;

/// Where to find the study tables.
#[derive(Debug, Clone)]
pub struct DataSource {
    /// Task-level CSV.
    pub task_data: PathBuf,
    /// User-level CSV.
    pub user_data: PathBuf,
    /// Task-level column holding durations in milliseconds.
    pub duration_column: String,
}

impl From<&crate::config::DataConfig> for DataSource {
    fn from(config: &crate::config::DataConfig) -> Self {
        Self {
            task_data: PathBuf::from(&config.task_data),
            user_data: PathBuf::from(&config.user_data),
            duration_column: config.duration_column.clone(),
        }
    }
}

/// Both study tables, as loaded.
#[derive(Debug, Clone)]
pub struct StudyData {
    pub tasks: Table,
    pub users: Table,
}

impl StudyData {
    /// Load both tables. Task durations are converted to seconds.
    pub fn load(source: &DataSource) -> EdaResult<Self> {
        let tasks = load_task_table(&source.task_data, &source.duration_column)?;
        let users = load_table(&source.user_data)?;

        info!(
            "Loaded {} task observations and {} participants",
            tasks.n_rows(),
            users.n_rows()
        );

        Ok(Self { tasks, users })
    }
}

/// Load the task-level table, converting `duration_column` from ms to s.
pub fn load_task_table(path: &Path, duration_column: &str) -> EdaResult<Table> {
    let raw = load_table(path)?;
    millis_to_seconds(&raw, duration_column, path)
}

/// One line of a schema listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub kind: ColumnKind,
    pub missing: usize,
}

/// Column names, kinds and missing counts of a table.
pub fn describe(table: &Table) -> Vec<ColumnSummary> {
    table
        .columns()
        .iter()
        .map(|c| ColumnSummary {
            name: c.name.clone(),
            kind: c.kind,
            missing: c.missing_count(),
        })
        .collect()
}
