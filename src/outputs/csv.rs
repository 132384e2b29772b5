//! CSV output.
//!
//! Missing values (failed detail page, unparseable date) are written as
//! empty cells.

use crate::error::ScrapeError;
use crate::models::CsvRow;
use crate::table::OutbreakTable;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Serialize the table to CSV bytes, header row included.
pub fn to_csv(table: &OutbreakTable) -> Result<Vec<u8>, ScrapeError> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    for record in table.iter() {
        writer.serialize(CsvRow::from(record))?;
    }
    writer
        .into_inner()
        .map_err(|e| ScrapeError::Io(e.into_error()))
}

/// Write the table as CSV to `path`, replacing any existing file.
///
/// # Arguments
///
/// * `table` - The normalized result table
/// * `path` - Destination file; its directory must already exist
///
/// # Errors
///
/// Returns an error if serialization or the file write fails.
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
pub async fn write_table(table: &OutbreakTable, path: impl AsRef<Path>) -> Result<(), ScrapeError> {
    let bytes = to_csv(table)?;
    fs::write(path.as_ref(), bytes).await?;
    info!(rows = table.len(), "Wrote CSV");
    Ok(())
}
