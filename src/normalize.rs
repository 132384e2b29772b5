//! Published-date normalization.
//!
//! The detail pages show dates as `DD Mon YYYY` (`05 Jan 2019`). This pass
//! turns the raw strings collected by the pipeline into calendar dates and
//! fills the derived year/month/day columns.

use crate::error::ScrapeError;
use crate::models::RecordStage;
use crate::table::OutbreakTable;
use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

/// Day, abbreviated month name, four-digit year.
pub const PUBLISHED_FORMAT: &str = "%d %b %Y";

/// Outcome of one normalization pass.
#[derive(Debug, Default)]
pub struct NormalizeReport {
    pub parsed: usize,
    /// Records that never got a raw date (fetch or structure failure).
    pub missing: usize,
    /// Records whose raw date did not match [`PUBLISHED_FORMAT`].
    pub failures: Vec<ScrapeError>,
}

impl NormalizeReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

pub fn parse_published(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(raw.trim(), PUBLISHED_FORMAT)
}

/// Normalize every record's raw date in place.
///
/// Derived fields are always recomputed from `raw_date`, so running this
/// twice leaves the table unchanged.
///
/// # Arguments
///
/// * `table` - The accumulated table; every row is visited
///
/// # Returns
///
/// A [`NormalizeReport`] separating rows that never had a date from rows
/// whose date did not match [`PUBLISHED_FORMAT`]. Each failure names its
/// row and raw string.
#[instrument(level = "info", skip_all, fields(rows = table.len()))]
pub fn normalize(table: &mut OutbreakTable) -> NormalizeReport {
    let mut report = NormalizeReport::default();

    for (row, record) in table.iter_mut().enumerate() {
        let Some(raw) = record.raw_date.clone() else {
            record.clear_date();
            report.missing += 1;
            continue;
        };

        match parse_published(&raw) {
            Ok(date) => {
                record.set_date(date);
                if record.stage == RecordStage::Detailed {
                    record.stage = RecordStage::Normalized;
                }
                report.parsed += 1;
            }
            Err(source) => {
                record.clear_date();
                let err = ScrapeError::DateParse { row, raw, source };
                warn!(row, link = ?record.link, error = %err, "Unparseable published date");
                record.error = Some(err.to_string());
                report.failures.push(err);
            }
        }
    }

    debug!(?report, "Normalization report");
    info!(
        parsed = report.parsed,
        missing = report.missing,
        failed = report.failed(),
        "Normalized published dates"
    );
    report
}
