//! JSON output and resume input.
//!
//! The JSON file is an array of full [`OutbreakRecord`]s. Feeding it back
//! with `--resume` lets a later run skip detail pages it already has.

use crate::error::ScrapeError;
use crate::models::OutbreakRecord;
use crate::table::OutbreakTable;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Write every record, with all fields, as a pretty-printed JSON array.
///
/// # Arguments
///
/// * `table` - The normalized result table
/// * `path` - Destination file, later usable as `--resume` input
///
/// # Errors
///
/// Returns an error if serialization or the file write fails.
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
pub async fn write_records(table: &OutbreakTable, path: impl AsRef<Path>) -> Result<(), ScrapeError> {
    let json = serde_json::to_string_pretty(table.records())?;
    fs::write(path.as_ref(), json).await?;
    info!(rows = table.len(), "Wrote JSON");
    Ok(())
}

#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
pub async fn read_records(path: impl AsRef<Path>) -> Result<Vec<OutbreakRecord>, ScrapeError> {
    let text = fs::read_to_string(path.as_ref()).await?;
    let records: Vec<OutbreakRecord> = serde_json::from_str(&text)?;
    info!(rows = records.len(), "Read previous records");
    Ok(records)
}
