//! services/turntable/src/tools.rs
//!
//! One-shot developer utilities around local storage: backing it up to a file,
//! copying it into the remote backend, and wiping it.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{error, info, warn};
use turntable_core::domain::{Category, CategoryDraft, CategoryType};
use turntable_core::ports::{CategoryRepository, PortError};
use turntable_core::PersistenceBridge;

use crate::error::AppError;

//=========================================================================================
// Export
//=========================================================================================

/// The backup file name for a given day.
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("turntable-backup-{}.json", date.format("%Y-%m-%d"))
}

/// Writes the stored blob, pretty-printed, to `turntable-backup-<date>.json` in `dir`.
///
/// A blob that is not valid JSON is written as stored; a missing blob is written as `null`.
pub fn export_local_data(bridge: &PersistenceBridge, dir: &Path) -> Result<PathBuf, AppError> {
    let contents = match bridge.load_raw()? {
        Some(raw) => match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(value) => serde_json::to_string_pretty(&value)?,
            Err(e) => {
                warn!("Stored data is not valid JSON, exporting it verbatim: {}", e);
                raw
            }
        },
        None => "null".to_string(),
    };

    std::fs::create_dir_all(dir)?;
    let path = dir.join(backup_file_name(Utc::now().date_naive()));
    std::fs::write(&path, contents)?;
    info!(path = %path.display(), "Exported local data");
    Ok(path)
}

//=========================================================================================
// Migration
//=========================================================================================

/// Reasons the migration stopped before copying anything.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Remote backend is not configured")]
    NotConfigured,
    #[error("No local data found")]
    NoLocalData,
    #[error("Migration cancelled")]
    Cancelled,
    #[error("Remote check failed: {0}")]
    Remote(#[from] PortError),
}

/// A category that could not be copied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationFailure {
    pub label: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MigrationReport {
    pub success_count: usize,
    pub error_count: usize,
    pub errors: Vec<MigrationFailure>,
}

impl MigrationReport {
    pub fn is_success(&self) -> bool {
        self.error_count == 0
    }
}

/// Copies every locally stored category and its resources into the backend.
///
/// `confirm` is asked only when the backend already has categories, since the
/// copy creates new rows rather than matching existing ones. Per-category
/// failures are collected in the report and do not stop the run. Selection
/// pointers are not carried over because every category gets a new id.
pub async fn migrate_local_to_remote<F>(
    bridge: &PersistenceBridge,
    backend: Option<&dyn CategoryRepository>,
    confirm: F,
) -> Result<MigrationReport, MigrationError>
where
    F: FnOnce() -> bool,
{
    let Some(backend) = backend else {
        error!("Remote backend is not configured, cannot migrate");
        return Err(MigrationError::NotConfigured);
    };

    let snapshot = bridge
        .load()
        .filter(|snapshot| !snapshot.categories.is_empty())
        .ok_or(MigrationError::NoLocalData)?;
    info!(categories = snapshot.categories.len(), "Starting migration");

    if backend.has_categories().await? && !confirm() {
        return Err(MigrationError::Cancelled);
    }

    let mut report = MigrationReport::default();
    for category in &snapshot.categories {
        match copy_category(backend, category).await {
            Ok(()) => {
                report.success_count += 1;
                info!(label = %category.label, "Migrated category");
            }
            Err(e) => {
                report.error_count += 1;
                error!(label = %category.label, "Failed to migrate category: {}", e);
                report.errors.push(MigrationFailure {
                    label: category.label.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    let pointers = &snapshot.current_category_ids;
    if CategoryType::ALL.iter().any(|kind| pointers.get(*kind).is_some()) {
        info!("Selection state must be re-applied manually after migration");
    }

    info!(
        succeeded = report.success_count,
        failed = report.error_count,
        "Migration finished"
    );
    Ok(report)
}

async fn copy_category(backend: &dyn CategoryRepository, category: &Category) -> Result<(), PortError> {
    let created = backend.create_category(&CategoryDraft::from(category)).await?;
    backend.create_resources(&created.id, &category.resources).await
}

//=========================================================================================
// Clear
//=========================================================================================

/// Removes the stored blob if `confirm` agrees. Returns whether anything was cleared.
pub fn clear_local_data<F>(bridge: &PersistenceBridge, confirm: F) -> Result<bool, AppError>
where
    F: FnOnce() -> bool,
{
    if !confirm() {
        return Ok(false);
    }
    bridge.clear()?;
    info!("Local data cleared");
    Ok(true)
}
