//! The Normalizer's ordered passes. Each pass rewrites fields in place;
//! only the final no-signal filter removes records.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use layoffs_core::common::error::PipelineError;
use tracing::{debug, warn};

use crate::pipeline::batch::{BackfillConflict, Batch};
use crate::pipeline::processing::rules::CanonicalRules;

/// Pass 1: strip leading/trailing whitespace from `company`.
pub fn trim_company(batch: &mut Batch) -> usize {
    let mut changed = 0;
    for working in &mut batch.records {
        let trimmed = working.record.company.trim();
        if trimmed.len() != working.record.company.len() {
            working.record.company = trimmed.to_string();
            changed += 1;
        }
    }
    changed
}

/// Pass 2: an empty or whitespace-only `industry` is not a distinct
/// category; reclassify it as null so backfill can see it.
pub fn blank_industry_to_null(batch: &mut Batch) -> usize {
    let mut changed = 0;
    for working in &mut batch.records {
        if working
            .record
            .industry
            .as_deref()
            .is_some_and(|s| s.trim().is_empty())
        {
            working.record.industry = None;
            changed += 1;
        }
    }
    changed
}

/// Outcome of the industry backfill pass.
#[derive(Debug, Clone, Default)]
pub struct BackfillOutcome {
    pub filled: usize,
    pub conflicts: Vec<BackfillConflict>,
}

/// Pass 3: adopt a missing `industry` from same-company siblings.
///
/// When every non-null sibling agrees, the value is adopted. When
/// siblings disagree there is no defensible winner: the record keeps a
/// null industry, gets its conflict flag set, and the disagreement is
/// reported once per company. A record with no informative sibling
/// simply stays null.
pub fn backfill_industry(batch: &mut Batch) -> BackfillOutcome {
    let mut sibling_values: HashMap<String, BTreeSet<String>> = HashMap::new();
    for working in &batch.records {
        if let Some(industry) = &working.record.industry {
            sibling_values
                .entry(working.record.company.clone())
                .or_default()
                .insert(industry.clone());
        }
    }

    let mut outcome = BackfillOutcome::default();
    let mut conflicted_companies: BTreeSet<String> = BTreeSet::new();

    for working in &mut batch.records {
        if working.record.industry.is_some() {
            continue;
        }
        match sibling_values.get(&working.record.company) {
            Some(values) if values.len() == 1 => {
                let value = values.iter().next().cloned();
                debug!(
                    company = %working.record.company,
                    industry = value.as_deref(),
                    "backfilled industry from sibling"
                );
                working.record.industry = value;
                outcome.filled += 1;
            }
            Some(values) => {
                working.industry_conflict = true;
                if conflicted_companies.insert(working.record.company.clone()) {
                    let candidates: Vec<String> = values.iter().cloned().collect();
                    warn!(
                        company = %working.record.company,
                        candidates = ?candidates,
                        "industry backfill conflict, leaving null"
                    );
                    outcome.conflicts.push(BackfillConflict {
                        company: working.record.company.clone(),
                        candidates,
                    });
                }
            }
            None => {} // no informative sibling, terminal state
        }
    }

    batch.conflicts.extend(outcome.conflicts.iter().cloned());
    outcome
}

/// Pass 4: fold near-duplicate industry labels into canonical form.
pub fn collapse_categories(batch: &mut Batch, rules: &CanonicalRules) -> usize {
    let mut changed = 0;
    for working in &mut batch.records {
        if let Some(industry) = &working.record.industry {
            if let Some(canonical) = rules.collapse_industry(industry) {
                if canonical != industry {
                    working.record.industry = Some(canonical.to_string());
                    changed += 1;
                }
            }
        }
    }
    changed
}

/// Pass 5: strip trailing punctuation from `country`.
pub fn trim_country(batch: &mut Batch, rules: &CanonicalRules) -> usize {
    let punctuation: Vec<char> = rules.country_trailing_punctuation.chars().collect();
    let mut changed = 0;
    for working in &mut batch.records {
        let trimmed = working.record.country.trim_end_matches(punctuation.as_slice());
        if trimmed.len() != working.record.country.len() {
            working.record.country = trimmed.to_string();
            changed += 1;
        }
    }
    changed
}

/// Outcome of the date parsing pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateOutcome {
    pub parsed: usize,
    pub failures: usize,
}

/// Pass 6: parse the raw date text into a proper date.
///
/// A value that does not match the source format is a record-level
/// problem: it is logged and the field stays null; the record remains
/// in the batch for every non-date view.
pub fn parse_dates(batch: &mut Batch, rules: &CanonicalRules) -> DateOutcome {
    let mut outcome = DateOutcome::default();
    for working in &mut batch.records {
        let Some(raw) = working.raw_date.take() else {
            continue;
        };
        match NaiveDate::parse_from_str(&raw, &rules.date_format) {
            Ok(date) => {
                working.record.event_date = Some(date);
                outcome.parsed += 1;
            }
            Err(_) => {
                let err = PipelineError::DateParse {
                    row: working.source_row,
                    value: raw,
                };
                warn!(%err, format = %rules.date_format, "leaving event_date null");
                working.record.event_date = None;
                outcome.failures += 1;
            }
        }
    }
    outcome
}

/// Final filter: a record with both layoff metrics null carries no
/// analyzable signal and is dropped. A documented cleaning rule, not a
/// failure; it runs after the six in-place passes so they stay purely
/// rewriting.
pub fn drop_no_signal(batch: &mut Batch) -> usize {
    let before = batch.records.len();
    batch.records.retain(|working| {
        working.record.total_laid_off.is_some() || working.record.percentage_laid_off.is_some()
    });
    before - batch.records.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::batch::WorkingRecord;
    use layoffs_core::domain::LayoffRecord;
    use uuid::Uuid;

    fn working(row: usize, company: &str, industry: Option<&str>) -> WorkingRecord {
        WorkingRecord {
            record: LayoffRecord {
                company: company.to_string(),
                location: "Seattle".to_string(),
                industry: industry.map(str::to_owned),
                total_laid_off: Some(10),
                percentage_laid_off: None,
                event_date: None,
                stage: None,
                country: "United States".to_string(),
                funds_raised_millions: None,
            },
            source_row: row,
            raw_date: None,
            industry_conflict: false,
        }
    }

    fn batch_of(records: Vec<WorkingRecord>) -> Batch {
        let mut batch = Batch::new(Uuid::new_v4());
        batch.records = records;
        batch
    }

    #[test]
    fn trims_company_whitespace() {
        let mut batch = batch_of(vec![working(0, "  Acme ", None), working(1, "Beta", None)]);
        assert_eq!(trim_company(&mut batch), 1);
        assert_eq!(batch.records[0].record.company, "Acme");
        assert_eq!(batch.records[1].record.company, "Beta");
    }

    #[test]
    fn blank_industry_becomes_null() {
        let mut batch = batch_of(vec![
            working(0, "Acme", Some("")),
            working(1, "Beta", Some("  ")),
            working(2, "Gamma", Some("Tech")),
        ]);
        assert_eq!(blank_industry_to_null(&mut batch), 2);
        assert_eq!(batch.records[0].record.industry, None);
        assert_eq!(batch.records[1].record.industry, None);
        assert_eq!(batch.records[2].record.industry.as_deref(), Some("Tech"));
    }

    #[test]
    fn backfill_adopts_agreeing_sibling_value() {
        let mut batch = batch_of(vec![
            working(0, "Beta", Some("Tech")),
            working(1, "Beta", None),
        ]);

        let outcome = backfill_industry(&mut batch);
        assert_eq!(outcome.filled, 1);
        assert!(outcome.conflicts.is_empty());
        assert_eq!(batch.records[1].record.industry.as_deref(), Some("Tech"));
        assert!(!batch.records[1].industry_conflict);
    }

    #[test]
    fn backfill_flags_disagreeing_siblings() {
        let mut batch = batch_of(vec![
            working(0, "Beta", Some("Tech")),
            working(1, "Beta", Some("Retail")),
            working(2, "Beta", None),
        ]);

        let outcome = backfill_industry(&mut batch);
        assert_eq!(outcome.filled, 0);
        assert_eq!(batch.records[2].record.industry, None);
        assert!(batch.records[2].industry_conflict);
        assert_eq!(
            outcome.conflicts,
            vec![BackfillConflict {
                company: "Beta".to_string(),
                candidates: vec!["Retail".to_string(), "Tech".to_string()],
            }]
        );
        assert_eq!(batch.conflicts.len(), 1);
    }

    #[test]
    fn backfill_without_sibling_stays_null() {
        let mut batch = batch_of(vec![working(0, "Solo", None)]);
        let outcome = backfill_industry(&mut batch);
        assert_eq!(outcome.filled, 0);
        assert!(outcome.conflicts.is_empty());
        assert_eq!(batch.records[0].record.industry, None);
    }

    #[test]
    fn collapses_categories_via_rules() {
        let rules = CanonicalRules::default();
        let mut batch = batch_of(vec![
            working(0, "Acme", Some("Crypto Currency")),
            working(1, "Beta", Some("Crypto")),
            working(2, "Gamma", Some("Retail")),
        ]);
        assert_eq!(collapse_categories(&mut batch, &rules), 1);
        assert_eq!(batch.records[0].record.industry.as_deref(), Some("Crypto"));
        assert_eq!(batch.records[1].record.industry.as_deref(), Some("Crypto"));
        assert_eq!(batch.records[2].record.industry.as_deref(), Some("Retail"));
    }

    #[test]
    fn trims_trailing_country_punctuation() {
        let rules = CanonicalRules::default();
        let mut batch = batch_of(vec![working(0, "Acme", None)]);
        batch.records[0].record.country = "United States.".to_string();
        assert_eq!(trim_country(&mut batch, &rules), 1);
        assert_eq!(batch.records[0].record.country, "United States");
    }

    #[test]
    fn parses_dates_and_tolerates_bad_values() {
        let rules = CanonicalRules::default();
        let mut good = working(0, "Acme", None);
        good.raw_date = Some("1/2/2023".to_string());
        let mut bad = working(1, "Beta", None);
        bad.raw_date = Some("not-a-date".to_string());
        let none = working(2, "Gamma", None);

        let mut batch = batch_of(vec![good, bad, none]);
        let outcome = parse_dates(&mut batch, &rules);

        assert_eq!(outcome.parsed, 1);
        assert_eq!(outcome.failures, 1);
        assert_eq!(
            batch.records[0].record.event_date,
            NaiveDate::from_ymd_opt(2023, 1, 2)
        );
        assert_eq!(batch.records[1].record.event_date, None);
        // Bad-date record stays in the batch.
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn drops_records_with_no_signal() {
        let mut silent = working(0, "Acme", None);
        silent.record.total_laid_off = None;
        silent.record.percentage_laid_off = None;
        let mut pct_only = working(1, "Beta", None);
        pct_only.record.total_laid_off = None;
        pct_only.record.percentage_laid_off = Some(0.2);
        let totals = working(2, "Gamma", None);

        let mut batch = batch_of(vec![silent, pct_only, totals]);
        assert_eq!(drop_no_signal(&mut batch), 1);
        assert_eq!(batch.len(), 2);
        assert!(batch.records.iter().all(|w| w.record.company != "Acme"));
    }
}
