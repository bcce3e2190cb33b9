use layoffs_core::domain::{BusinessKey, LayoffRecord};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A record travelling through the pipeline, plus bookkeeping the
/// cleaned output schema does not carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingRecord {
    pub record: LayoffRecord,
    /// Position in the source table; the dedup tie-break order.
    pub source_row: usize,
    /// Unparsed date text, consumed by the Normalizer's date pass.
    pub raw_date: Option<String>,
    /// Set when industry backfill found disagreeing sibling values.
    pub industry_conflict: bool,
}

impl WorkingRecord {
    pub fn business_key(&self) -> BusinessKey {
        BusinessKey::from_record(&self.record, self.raw_date.as_deref())
    }
}

/// A sibling disagreement found during industry backfill. The affected
/// records keep a null industry and are flagged, never silently filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillConflict {
    pub company: String,
    /// Disagreeing sibling values, sorted for deterministic output.
    pub candidates: Vec<String>,
}

/// The working collection. Exactly one owner at any time: each stage
/// takes the batch by value and hands it to the next, so nothing else
/// can mutate it mid-run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub run_id: Uuid,
    pub records: Vec<WorkingRecord>,
    pub conflicts: Vec<BackfillConflict>,
}

impl Batch {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            records: Vec::new(),
            conflicts: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Strip bookkeeping and return records in the cleaned schema.
    pub fn into_cleaned(self) -> Vec<LayoffRecord> {
        self.records.into_iter().map(|w| w.record).collect()
    }

    /// Cleaned-schema view without consuming the batch.
    pub fn cleaned_records(&self) -> Vec<LayoffRecord> {
        self.records.iter().map(|w| w.record.clone()).collect()
    }
}
