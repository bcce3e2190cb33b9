use anyhow::Result;

use crate::pipeline::batch::Batch;

/// Common trait for all pipeline stages.
///
/// A stage takes the batch by value and hands ownership back with its
/// result, so exactly one owner can touch the working collection at a
/// time. Stages run strictly in sequence; each depends on the
/// invariants the previous one established.
pub trait PipelineStep {
    /// Execute this stage over the working collection.
    fn execute(&self, batch: Batch) -> Result<(Batch, StepResult)>;

    /// Get the name of this pipeline stage.
    fn step_name(&self) -> &'static str;

    /// Get the stages that must complete before this one.
    fn dependencies(&self) -> Vec<&'static str>;
}

/// Result of executing a pipeline stage.
#[derive(Debug, Clone)]
pub struct StepResult {
    pub success: bool,
    pub processed_count: usize,
    pub removed_count: usize,
    pub warning_count: usize,
    pub message: String,
    pub metadata: std::collections::HashMap<String, String>,
}

impl StepResult {
    pub fn success(processed: usize, message: String) -> Self {
        Self {
            success: true,
            processed_count: processed,
            removed_count: 0,
            warning_count: 0,
            message,
            metadata: std::collections::HashMap::new(),
        }
    }

    pub fn with_counts(
        processed: usize,
        removed: usize,
        warnings: usize,
        message: String,
    ) -> Self {
        Self {
            success: true,
            processed_count: processed,
            removed_count: removed,
            warning_count: warnings,
            message,
            metadata: std::collections::HashMap::new(),
        }
    }
}

// Re-export all pipeline stages
pub mod aggregate;
pub mod dedup;
pub mod ingest;
pub mod normalize;

pub use aggregate::AggregateStep;
pub use dedup::DedupStep;
pub use ingest::IngestStep;
pub use normalize::NormalizeStep;
