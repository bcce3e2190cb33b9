//! Business-key deduplication: group, rank, keep rank 1.

use std::collections::HashMap;

use layoffs_core::domain::BusinessKey;
use tracing::debug;

use crate::pipeline::batch::Batch;

/// Outcome of one deduplication pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupOutcome {
    pub groups: usize,
    pub removed: usize,
}

/// Partition the batch into business-key groups and keep exactly one
/// record per group.
///
/// Records are visited in `source_row` order, so rank within a group is
/// the stable ingestion order and the survivor is always the earliest
/// occurrence. Nulls in the key compare equal to nulls (`BusinessKey`
/// is a tuple of `Option`s), so an all-null optional tail still forms a
/// valid group. Running the pass again on its own output is a no-op:
/// every surviving key is unique, so every record ranks 1.
pub fn dedupe(batch: &mut Batch) -> DedupOutcome {
    batch.records.sort_by_key(|w| w.source_row);

    let before = batch.records.len();
    let mut ranks: HashMap<BusinessKey, u32> = HashMap::new();

    batch.records.retain(|working| {
        let rank = ranks
            .entry(working.business_key())
            .and_modify(|r| *r += 1)
            .or_insert(1);
        if *rank > 1 {
            debug!(
                row = working.source_row,
                company = %working.record.company,
                rank = *rank,
                "dropping duplicate record"
            );
        }
        *rank == 1
    });

    DedupOutcome {
        groups: ranks.len(),
        removed: before - batch.records.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::batch::WorkingRecord;
    use layoffs_core::domain::LayoffRecord;
    use uuid::Uuid;

    fn working(row: usize, company: &str, raw_date: Option<&str>) -> WorkingRecord {
        WorkingRecord {
            record: LayoffRecord {
                company: company.to_string(),
                location: "Seattle".to_string(),
                industry: None,
                total_laid_off: Some(10),
                percentage_laid_off: None,
                event_date: None,
                stage: None,
                country: "United States".to_string(),
                funds_raised_millions: None,
            },
            source_row: row,
            raw_date: raw_date.map(str::to_owned),
            industry_conflict: false,
        }
    }

    fn batch_of(records: Vec<WorkingRecord>) -> Batch {
        let mut batch = Batch::new(Uuid::new_v4());
        batch.records = records;
        batch
    }

    #[test]
    fn keeps_one_record_per_duplicate_group() {
        // Two identical Acme rows for 1/2/2023 plus one with another
        // date: exactly two records survive.
        let mut batch = batch_of(vec![
            working(0, "Acme", Some("1/2/2023")),
            working(1, "Acme", Some("1/2/2023")),
            working(2, "Acme", Some("3/4/2023")),
        ]);

        let outcome = dedupe(&mut batch);
        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.groups, 2);
        assert_eq!(batch.len(), 2);
        // Earliest occurrence survives.
        assert_eq!(batch.records[0].source_row, 0);
        assert_eq!(batch.records[1].source_row, 2);
    }

    #[test]
    fn all_null_optional_fields_still_group() {
        let mut a = working(0, "Acme", None);
        a.record.total_laid_off = None;
        let mut b = working(1, "Acme", None);
        b.record.total_laid_off = None;

        let mut batch = batch_of(vec![a, b]);
        let outcome = dedupe(&mut batch);
        assert_eq!(outcome.removed, 1);
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn dedupe_is_idempotent() {
        let mut batch = batch_of(vec![
            working(0, "Acme", Some("1/2/2023")),
            working(1, "Acme", Some("1/2/2023")),
            working(2, "Beta", Some("1/2/2023")),
        ]);

        dedupe(&mut batch);
        let first = batch.clone();
        let outcome = dedupe(&mut batch);

        assert_eq!(outcome.removed, 0);
        assert_eq!(batch.len(), first.len());
        for (after, before) in batch.records.iter().zip(&first.records) {
            assert_eq!(after.source_row, before.source_row);
            assert_eq!(after.record, before.record);
        }
    }
}
