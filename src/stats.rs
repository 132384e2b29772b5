//! Aggregate counts over a finished table.
//!
//! These are the figures the downstream outbreak dashboards chart from the
//! CSV: reports per year and month of publication, and how often each
//! disease appears.

use crate::table::OutbreakTable;
use itertools::Itertools;
use std::collections::BTreeMap;

/// Title separators between the disease and the country part, e.g.
/// `Cholera – Yemen`.
const TITLE_SEPARATORS: [&str; 3] = [" \u{2013} ", " \u{2014} ", " - "];

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OutbreakStats {
    /// Reports per `(year, month)`. Rows without a normalized date are excluded.
    pub by_month: BTreeMap<(i32, u32), usize>,
    /// Reports per disease name, taken from the title.
    pub by_disease: BTreeMap<String, usize>,
    /// Rows that have no normalized date.
    pub undated: usize,
}

/// The disease part of a DON title: everything before the first separator.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(disease_of("Cholera – Yemen"), "Cholera");
/// assert_eq!(disease_of("Disease X"), "Disease X");
/// ```
pub fn disease_of(title: &str) -> &str {
    TITLE_SEPARATORS
        .iter()
        .filter_map(|sep| title.find(sep))
        .min()
        .map_or(title, |i| &title[..i])
        .trim()
}

impl OutbreakStats {
    /// Count reports per month and per disease.
    ///
    /// # Arguments
    ///
    /// * `table` - The table after date normalization
    ///
    /// # Returns
    ///
    /// Counts keyed in sorted order, ready for logging or charting.
    pub fn from_table(table: &OutbreakTable) -> Self {
        let by_month = table
            .iter()
            .filter_map(|r| r.year.zip(r.month))
            .counts()
            .into_iter()
            .collect();
        let by_disease = table
            .iter()
            .filter_map(|r| r.outbreak.as_deref())
            .map(disease_of)
            .counts()
            .into_iter()
            .map(|(disease, n)| (disease.to_string(), n))
            .collect();
        let undated = table.iter().filter(|r| r.date.is_none()).count();

        Self {
            by_month,
            by_disease,
            undated,
        }
    }

    /// Reports per year, summed over months.
    pub fn by_year(&self) -> BTreeMap<i32, usize> {
        let mut years = BTreeMap::new();
        for (&(year, _), &n) in &self.by_month {
            *years.entry(year).or_insert(0) += n;
        }
        years
    }

    pub fn unique_diseases(&self) -> usize {
        self.by_disease.len()
    }
}
