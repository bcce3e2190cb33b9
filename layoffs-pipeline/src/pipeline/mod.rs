pub mod batch;
pub mod orchestrator;
pub mod output;
pub mod pipeline_config;
pub mod processing;
pub mod steps;

pub use batch::{BackfillConflict, Batch, WorkingRecord};
pub use orchestrator::{PipelineExecutionResult, PipelineOrchestrator};
pub use pipeline_config::{PipelineConfig, PipelineStepConfig};
