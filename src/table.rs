//! Growable result table keyed by row index.

use crate::models::{Field, OutbreakRecord, RecordStage};

/// Ordered collection of [`OutbreakRecord`]s.
///
/// Rows are addressed by index; writing past the end grows the table with
/// empty records. No deduplication is performed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutbreakTable {
    rows: Vec<OutbreakRecord>,
}

impl OutbreakTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign one field of the record at `index`, creating it if absent.
    pub fn set(&mut self, index: usize, field: Field, value: impl Into<String>) {
        let record = self.entry(index);
        let value = value.into();
        match field {
            Field::Outbreak => record.outbreak = Some(value),
            Field::Link => record.link = Some(value),
            Field::Date => record.raw_date = Some(value),
            Field::Description => record.description = Some(value),
        }

        match field {
            Field::Outbreak | Field::Link if record.stage == RecordStage::Empty => {
                record.stage = RecordStage::Listed;
            }
            Field::Date | Field::Description
                if record.stage < RecordStage::Detailed && record.has_detail() =>
            {
                record.stage = RecordStage::Detailed;
            }
            _ => {}
        }
    }

    /// Attach a failure reason to the record at `index`, creating it if absent.
    pub fn mark_failed(&mut self, index: usize, reason: impl Into<String>) {
        self.entry(index).error = Some(reason.into());
    }

    #[cfg(test)]
    pub fn get(&self, index: usize) -> Option<&OutbreakRecord> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutbreakRecord> {
        self.rows.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut OutbreakRecord> {
        self.rows.iter_mut()
    }

    pub fn records(&self) -> &[OutbreakRecord] {
        &self.rows
    }

    fn entry(&mut self, index: usize) -> &mut OutbreakRecord {
        if index >= self.rows.len() {
            self.rows.resize_with(index + 1, OutbreakRecord::default);
        }
        &mut self.rows[index]
    }
}
