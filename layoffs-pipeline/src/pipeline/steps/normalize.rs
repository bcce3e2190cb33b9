use anyhow::Result;
use tracing::{debug, info};

use super::{PipelineStep, StepResult};
use crate::pipeline::batch::Batch;
use crate::pipeline::processing::normalize;
use crate::pipeline::processing::rules::CanonicalRules;

/// Pipeline stage running the ordered normalization passes, then the
/// documented no-signal filter.
pub struct NormalizeStep {
    rules: CanonicalRules,
}

impl NormalizeStep {
    pub fn new(rules: CanonicalRules) -> Self {
        Self { rules }
    }
}

impl PipelineStep for NormalizeStep {
    fn execute(&self, mut batch: Batch) -> Result<(Batch, StepResult)> {
        info!("🔧 Running normalize over {} records", batch.len());

        let trimmed = normalize::trim_company(&mut batch);
        let blanked = normalize::blank_industry_to_null(&mut batch);
        let backfill = normalize::backfill_industry(&mut batch);
        let collapsed = normalize::collapse_categories(&mut batch, &self.rules);
        let countries = normalize::trim_country(&mut batch, &self.rules);
        let dates = normalize::parse_dates(&mut batch, &self.rules);
        debug!(
            trimmed,
            blanked,
            backfilled = backfill.filled,
            collapsed,
            countries,
            dates_parsed = dates.parsed,
            "normalization passes applied"
        );

        let dropped = normalize::drop_no_signal(&mut batch);

        let warnings = dates.failures + backfill.conflicts.len();
        let message = format!(
            "Normalize completed: {} records remain ({} backfilled, {} no-signal dropped, {} date failures, {} backfill conflicts)",
            batch.len(),
            backfill.filled,
            dropped,
            dates.failures,
            backfill.conflicts.len()
        );
        info!("✅ {}", message);

        let mut result = StepResult::with_counts(batch.len(), dropped, warnings, message);
        if !backfill.conflicts.is_empty() {
            result.metadata.insert(
                "backfill_conflicts".to_string(),
                serde_json::to_string(&backfill.conflicts)?,
            );
        }
        Ok((batch, result))
    }

    fn step_name(&self) -> &'static str {
        "normalize"
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["dedup"]
    }
}
