use anyhow::Result;
use layoffs_core::common::error::PipelineError;
use layoffs_core::domain::{LayoffRecord, RawRecord};
use tracing::info;

use super::{PipelineStep, StepResult};
use crate::pipeline::batch::{Batch, WorkingRecord};

/// Pipeline stage that types raw rows into the working collection.
///
/// No filtering, no value rewrites: cardinality and ingestion order are
/// preserved exactly. The only job here is type checking — a non-null
/// value that does not fit its column type is a fatal `SchemaMismatch`,
/// because the batch cannot proceed with an inconsistent shape.
pub struct IngestStep {
    raw: Vec<RawRecord>,
}

impl IngestStep {
    pub fn new(raw: Vec<RawRecord>) -> Self {
        Self { raw }
    }

    fn typed(&self, row: usize, raw: &RawRecord) -> Result<WorkingRecord, PipelineError> {
        let total_laid_off = parse_integer(row, "total_laid_off", raw.total_laid_off.as_deref())?;
        let percentage_laid_off =
            parse_fraction(row, raw.percentage_laid_off.as_deref())?;
        let funds_raised_millions =
            parse_integer(row, "funds_raised_millions", raw.funds_raised_millions.as_deref())?;

        Ok(WorkingRecord {
            record: LayoffRecord {
                company: raw.company.clone(),
                location: raw.location.clone(),
                industry: raw.industry.clone(),
                total_laid_off,
                percentage_laid_off,
                // Parsed by the Normalizer's date pass; a bad date must
                // stay record-level, not fail ingestion.
                event_date: None,
                stage: raw.stage.clone(),
                country: raw.country.clone(),
                funds_raised_millions,
            },
            source_row: row,
            raw_date: raw.event_date.clone(),
            industry_conflict: false,
        })
    }
}

fn parse_integer(
    row: usize,
    column: &str,
    value: Option<&str>,
) -> Result<Option<i64>, PipelineError> {
    match value {
        None => Ok(None),
        Some(text) => text.trim().parse::<i64>().map(Some).map_err(|_| {
            PipelineError::SchemaMismatch {
                row,
                detail: format!("{column}: expected integer, found {text:?}"),
            }
        }),
    }
}

fn parse_fraction(row: usize, value: Option<&str>) -> Result<Option<f64>, PipelineError> {
    let Some(text) = value else {
        return Ok(None);
    };
    let fraction: f64 = text.trim().parse().map_err(|_| PipelineError::SchemaMismatch {
        row,
        detail: format!("percentage_laid_off: expected decimal, found {text:?}"),
    })?;
    if !(0.0..=1.0).contains(&fraction) {
        return Err(PipelineError::SchemaMismatch {
            row,
            detail: format!("percentage_laid_off: {fraction} outside [0,1]"),
        });
    }
    Ok(Some(fraction))
}

impl PipelineStep for IngestStep {
    fn execute(&self, mut batch: Batch) -> Result<(Batch, StepResult)> {
        info!("📥 Ingesting {} raw rows", self.raw.len());

        for (row, raw) in self.raw.iter().enumerate() {
            batch.records.push(self.typed(row, raw)?);
        }

        let message = format!("Ingest completed: {} records loaded", batch.len());
        info!("✅ {}", message);
        let result = StepResult::success(batch.len(), message);
        Ok((batch, result))
    }

    fn step_name(&self) -> &'static str {
        "ingest"
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn raw(company: &str, total: Option<&str>, pct: Option<&str>) -> RawRecord {
        RawRecord {
            company: company.to_string(),
            location: "Seattle".to_string(),
            industry: None,
            total_laid_off: total.map(str::to_owned),
            percentage_laid_off: pct.map(str::to_owned),
            event_date: Some("1/2/2023".to_string()),
            stage: None,
            country: "United States".to_string(),
            funds_raised_millions: None,
        }
    }

    #[test]
    fn types_values_and_preserves_order() {
        let step = IngestStep::new(vec![
            raw("Acme", Some("100"), Some("0.25")),
            raw("Beta", None, None),
        ]);
        let (batch, result) = step.execute(Batch::new(Uuid::new_v4())).unwrap();

        assert!(result.success);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.records[0].record.total_laid_off, Some(100));
        assert_eq!(batch.records[0].record.percentage_laid_off, Some(0.25));
        assert_eq!(batch.records[0].raw_date.as_deref(), Some("1/2/2023"));
        assert_eq!(batch.records[0].record.event_date, None);
        assert_eq!(batch.records[1].source_row, 1);
        assert_eq!(batch.records[1].record.total_laid_off, None);
    }

    #[test]
    fn bad_integer_is_fatal_schema_mismatch() {
        let step = IngestStep::new(vec![raw("Acme", Some("lots"), None)]);
        let err = step.execute(Batch::new(Uuid::new_v4())).unwrap_err();
        let err = err.downcast::<PipelineError>().unwrap();
        assert!(matches!(err, PipelineError::SchemaMismatch { row: 0, .. }));
    }

    #[test]
    fn out_of_range_fraction_is_schema_mismatch() {
        let step = IngestStep::new(vec![raw("Acme", None, Some("25.0"))]);
        let err = step.execute(Batch::new(Uuid::new_v4())).unwrap_err();
        let err = err.downcast::<PipelineError>().unwrap();
        assert!(matches!(err, PipelineError::SchemaMismatch { .. }));
    }
}
