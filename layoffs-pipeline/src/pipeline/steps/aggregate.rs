use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use super::{PipelineStep, StepResult};
use crate::pipeline::batch::Batch;
use crate::pipeline::output::persist_to_json;
use crate::pipeline::processing::aggregate::AggregateReport;

/// Pipeline stage computing the reporting views over the cleaned batch
/// and persisting them as one JSON report.
///
/// Strictly read-only with respect to the records: the batch leaves
/// this stage exactly as it entered.
pub struct AggregateStep {
    top_stages: usize,
    top_countries: usize,
    output_dir: PathBuf,
}

impl AggregateStep {
    pub fn new(top_stages: usize, top_countries: usize, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            top_stages,
            top_countries,
            output_dir: output_dir.into(),
        }
    }
}

impl PipelineStep for AggregateStep {
    fn execute(&self, batch: Batch) -> Result<(Batch, StepResult)> {
        info!("📊 Running aggregate views over {} records", batch.len());

        let records = batch.cleaned_records();
        let report = AggregateReport::build(&records, self.top_stages, self.top_countries);
        let path = persist_to_json(&report, "layoffs_report", &self.output_dir)?;
        info!("💾 Saved report views to {}", path.display());

        let message = format!(
            "Aggregate completed: {} views over {} records",
            report.view_counts().len(),
            records.len()
        );
        info!("✅ {}", message);

        let mut result = StepResult::success(records.len(), message);
        for (view, rows) in report.view_counts() {
            result.metadata.insert(view.to_string(), rows.to_string());
        }
        result
            .metadata
            .insert("report_path".to_string(), path.display().to_string());
        Ok((batch, result))
    }

    fn step_name(&self) -> &'static str {
        "aggregate"
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["normalize"]
    }
}
