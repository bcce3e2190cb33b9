use std::path::PathBuf;

use anyhow::Result;
use layoffs_core::domain::{LayoffRecord, PipelineRun, RawRecord};
use tracing::{error, info};

use super::batch::{BackfillConflict, Batch};
use super::pipeline_config::{PipelineConfig, PipelineStepConfig};
use super::processing::rules::CanonicalRules;
use super::steps::{AggregateStep, DedupStep, IngestStep, NormalizeStep, PipelineStep, StepResult};

/// Lightweight orchestrator for running declarative pipelines over one
/// raw batch. The batch moves by value from stage to stage, so each
/// stage is the sole owner of the working collection while it runs.
pub struct PipelineOrchestrator {
    raw: Vec<RawRecord>,
    rules: CanonicalRules,
    output_dir: PathBuf,
}

impl PipelineOrchestrator {
    pub fn new(raw: Vec<RawRecord>, rules: CanonicalRules, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            raw,
            rules,
            output_dir: output_dir.into(),
        }
    }

    /// Run a complete pipeline based on configuration.
    pub fn run_pipeline(&self, config: PipelineConfig) -> Result<PipelineExecutionResult> {
        info!("🚀 Starting pipeline '{}': {}", config.name, config.description);
        config.validate()?;

        let mut run = PipelineRun::start(&config.name);
        let mut execution = PipelineExecutionResult::new(run.clone());
        let mut batch = Batch::new(run.id);

        for (step_index, step_config) in config.steps.iter().enumerate() {
            info!(
                "🔄 Executing step {}/{}: {}",
                step_index + 1,
                config.steps.len(),
                step_config.step_name()
            );

            let step = self.create_step(step_config);
            match step.execute(batch) {
                Ok((next_batch, step_result)) => {
                    info!(
                        "✅ Step '{}' completed: {}",
                        step_config.step_name(),
                        step_result.message
                    );
                    execution.add_step_result(step_config.step_name(), step_result);
                    batch = next_batch;
                }
                Err(e) => {
                    // A step-level error is always fatal: the failed
                    // stage owned the batch, so there is nothing sound
                    // to hand the next stage. Record-level problems
                    // (bad dates, conflicts) never reach this branch.
                    error!("❌ Step '{}' failed: {}", step_config.step_name(), e);
                    return Err(e);
                }
            }
        }

        run.finish();
        execution.run = run;
        execution.conflicts = batch.conflicts.clone();
        execution.cleaned = batch.into_cleaned();
        info!(
            "🏁 Pipeline '{}' finished: {} cleaned records, {} conflicts",
            config.name,
            execution.cleaned.len(),
            execution.conflicts.len()
        );
        Ok(execution)
    }

    fn create_step(&self, config: &PipelineStepConfig) -> Box<dyn PipelineStep> {
        match config {
            PipelineStepConfig::Ingest => Box::new(IngestStep::new(self.raw.clone())),
            PipelineStepConfig::Dedup => Box::new(DedupStep),
            PipelineStepConfig::Normalize => Box::new(NormalizeStep::new(self.rules.clone())),
            PipelineStepConfig::Aggregate {
                top_stages,
                top_countries,
            } => Box::new(AggregateStep::new(
                top_stages.unwrap_or(5),
                top_countries.unwrap_or(5),
                self.output_dir.clone(),
            )),
        }
    }
}

/// Result of a complete pipeline run.
#[derive(Debug)]
pub struct PipelineExecutionResult {
    pub run: PipelineRun,
    pub step_results: Vec<(String, StepResult)>,
    /// The cleaned working collection, bookkeeping stripped.
    pub cleaned: Vec<LayoffRecord>,
    /// Backfill conflicts observed during normalization.
    pub conflicts: Vec<BackfillConflict>,
}

impl PipelineExecutionResult {
    fn new(run: PipelineRun) -> Self {
        Self {
            run,
            step_results: Vec::new(),
            cleaned: Vec::new(),
            conflicts: Vec::new(),
        }
    }

    fn add_step_result(&mut self, step_name: &str, result: StepResult) {
        self.step_results.push((step_name.to_string(), result));
    }

    pub fn step_result(&self, step_name: &str) -> Option<&StepResult> {
        self.step_results
            .iter()
            .find(|(name, _)| name == step_name)
            .map(|(_, result)| result)
    }
}
