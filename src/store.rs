use tracing::debug;

use crate::models::AnalysisRecord;

/// Session-scoped record list, newest first. Grows only by whole-batch
/// prepends; records are never edited or removed.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<AnalysisRecord>,
    version: u64,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from an existing newest-first list (e.g. an imported export).
    pub fn from_records(records: Vec<AnalysisRecord>) -> Self {
        let version = u64::from(!records.is_empty());
        Self { records, version }
    }

    /// Insert `batch` ahead of everything already stored, keeping the
    /// batch's own order. Returns how many records were added.
    pub fn prepend_batch(&mut self, batch: Vec<AnalysisRecord>) -> usize {
        let added = batch.len();
        if added == 0 {
            return 0;
        }
        self.records.splice(0..0, batch);
        self.version += 1;
        debug!("Store updated - added={}, total={}, version={}", added, self.records.len(), self.version);
        added
    }

    pub fn records(&self) -> &[AnalysisRecord] {
        &self.records
    }

    /// Oldest first.
    pub fn chronological(&self) -> impl DoubleEndedIterator<Item = &AnalysisRecord> + ExactSizeIterator {
        self.records.iter().rev()
    }

    pub fn get(&self, id: &str) -> Option<&AnalysisRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Bumped on every non-empty prepend; usable as a memoization key.
    pub fn version(&self) -> u64 {
        self.version
    }
}
