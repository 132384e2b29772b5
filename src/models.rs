//! Data models for scraped outbreak reports.
//!
//! - [`ListingItem`]: one entry from a paginated listing page
//! - [`DetailPage`]: the two fields pulled from a report's detail page
//! - [`OutbreakRecord`]: one row of the result table, filled in stages
//! - [`CsvRow`]: the flat export shape of a record

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A single report entry on a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingItem {
    /// The report title as shown in the entry heading.
    pub title: String,
    /// Absolute URL of the report's detail page.
    pub link: String,
}

/// Fields extracted from one detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailPage {
    /// The "date published" text, exactly as displayed.
    pub published: String,
    /// Visible text of the content blocks.
    pub description: String,
}

/// How far a record has progressed through the pipeline.
///
/// `Empty → Listed → Detailed → Normalized`; `Normalized` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStage {
    #[default]
    Empty,
    Listed,
    Detailed,
    Normalized,
}

/// The settable scraped fields of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Outbreak,
    Link,
    Date,
    Description,
}

/// One DON report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutbreakRecord {
    pub outbreak: Option<String>,
    /// Normalized publication date.
    pub date: Option<NaiveDate>,
    /// Published-date string as scraped, before normalization.
    pub raw_date: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub description: Option<String>,
    pub link: Option<String>,
    /// Why a stage failed for this record, if it did.
    pub error: Option<String>,
    pub stage: RecordStage,
}

impl OutbreakRecord {
    /// Set the calendar date and the derived year/month/day columns.
    pub fn set_date(&mut self, date: NaiveDate) {
        self.date = Some(date);
        self.year = Some(date.year());
        self.month = Some(date.month());
        self.day = Some(date.day());
    }

    /// Drop the calendar date and everything derived from it.
    pub fn clear_date(&mut self) {
        self.date = None;
        self.year = None;
        self.month = None;
        self.day = None;
    }

    /// Whether both detail-page fields are present.
    pub fn has_detail(&self) -> bool {
        self.raw_date.is_some() && self.description.is_some()
    }
}

/// Flat CSV shape with the published column names.
#[derive(Debug, Serialize)]
pub struct CsvRow<'a> {
    #[serde(rename = "Outbreak")]
    pub outbreak: Option<&'a str>,
    #[serde(rename = "Date")]
    pub date: Option<String>,
    #[serde(rename = "Year")]
    pub year: Option<i32>,
    #[serde(rename = "Month")]
    pub month: Option<u32>,
    #[serde(rename = "Day")]
    pub day: Option<u32>,
    #[serde(rename = "Description")]
    pub description: Option<&'a str>,
    #[serde(rename = "Link")]
    pub link: Option<&'a str>,
}

impl<'a> From<&'a OutbreakRecord> for CsvRow<'a> {
    fn from(r: &'a OutbreakRecord) -> Self {
        CsvRow {
            outbreak: r.outbreak.as_deref(),
            date: r.date.map(|d| d.format("%Y-%m-%d").to_string()),
            year: r.year,
            month: r.month,
            day: r.day,
            description: r.description.as_deref(),
            link: r.link.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_clear_date() {
        let mut r = OutbreakRecord::default();
        r.set_date(NaiveDate::from_ymd_opt(2019, 3, 12).unwrap());
        assert_eq!((r.year, r.month, r.day), (Some(2019), Some(3), Some(12)));

        r.clear_date();
        assert_eq!(r.date, None);
        assert_eq!((r.year, r.month, r.day), (None, None, None));
    }

    #[test]
    fn test_stage_ordering() {
        assert!(RecordStage::Empty < RecordStage::Listed);
        assert!(RecordStage::Listed < RecordStage::Detailed);
        assert!(RecordStage::Detailed < RecordStage::Normalized);
    }

    #[test]
    fn test_csv_row_formats_date_and_leaves_missing_empty() {
        let mut r = OutbreakRecord {
            outbreak: Some("Cholera – Country X".into()),
            link: Some("https://example.com/don-1".into()),
            ..OutbreakRecord::default()
        };
        let row = CsvRow::from(&r);
        assert_eq!(row.date, None);
        assert_eq!(row.year, None);

        r.set_date(NaiveDate::from_ymd_opt(2019, 1, 5).unwrap());
        let row = CsvRow::from(&r);
        assert_eq!(row.date.as_deref(), Some("2019-01-05"));
        assert_eq!(row.outbreak, Some("Cholera – Country X"));
    }

    #[test]
    fn test_record_json_roundtrip_keeps_stage() {
        let r = OutbreakRecord {
            outbreak: Some("Ebola".into()),
            raw_date: Some("05 Jan 2019".into()),
            description: Some("Text".into()),
            stage: RecordStage::Detailed,
            ..OutbreakRecord::default()
        };
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"stage\":\"detailed\""));
        let back: OutbreakRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
