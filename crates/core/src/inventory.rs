//! Inventory of verified uploads

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// One payload that was uploaded and confirmed by a head request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    /// Object key
    pub key: String,

    /// Size in bytes as reported by the storage service
    pub size: u64,

    /// Last modified time as reported by the storage service
    pub modified_date: Option<Timestamp>,

    /// Echoed `type` metadata field, empty when absent
    #[serde(rename = "type")]
    pub kind: String,
}

/// Ordered, append-only collection of upload records
///
/// Owned by the caller of the walk and passed in by mutable reference, so
/// records gathered before a fatal error are still available for reporting.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Inventory {
    records: Vec<UploadRecord>,
}

impl Inventory {
    /// Create an empty inventory
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record
    pub fn push(&mut self, record: UploadRecord) {
        self.records.push(record);
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record was collected
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over records in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, UploadRecord> {
        self.records.iter()
    }

    /// Sum of all record sizes
    pub fn total_size(&self) -> u64 {
        self.records.iter().map(|r| r.size).sum()
    }

    /// Consume the inventory and return its records
    pub fn into_records(self) -> Vec<UploadRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a Inventory {
    type Item = &'a UploadRecord;
    type IntoIter = std::slice::Iter<'a, UploadRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
