use anyhow::Result;
use tracing::info;

use super::{PipelineStep, StepResult};
use crate::pipeline::batch::Batch;
use crate::pipeline::processing::dedup::dedupe;

/// Pipeline stage that removes business-key duplicates, keeping the
/// rank-1 (earliest ingested) record of every group.
pub struct DedupStep;

impl PipelineStep for DedupStep {
    fn execute(&self, mut batch: Batch) -> Result<(Batch, StepResult)> {
        info!("🔍 Running dedup over {} records", batch.len());

        let outcome = dedupe(&mut batch);

        let message = format!(
            "Dedup completed: {} groups, {} duplicates removed, {} records remain",
            outcome.groups,
            outcome.removed,
            batch.len()
        );
        info!("✅ {}", message);

        let mut result = StepResult::with_counts(batch.len(), outcome.removed, 0, message);
        result
            .metadata
            .insert("groups".to_string(), outcome.groups.to_string());
        Ok((batch, result))
    }

    fn step_name(&self) -> &'static str {
        "dedup"
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["ingest"]
    }
}
