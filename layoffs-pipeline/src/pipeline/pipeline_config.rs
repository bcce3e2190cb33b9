use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Configuration for a complete pipeline execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: String,
    pub steps: Vec<PipelineStepConfig>,
}

/// Configuration for individual pipeline stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineStepConfig {
    Ingest,
    Dedup,
    Normalize,
    Aggregate {
        top_stages: Option<usize>,
        top_countries: Option<usize>,
    },
}

impl PipelineStepConfig {
    pub fn step_name(&self) -> &'static str {
        match self {
            Self::Ingest => "ingest",
            Self::Dedup => "dedup",
            Self::Normalize => "normalize",
            Self::Aggregate { .. } => "aggregate",
        }
    }

    /// Stages that must complete before this one; mirrors
    /// `PipelineStep::dependencies` on the built steps.
    pub fn dependencies(&self) -> Vec<&'static str> {
        match self {
            Self::Ingest => vec![],
            Self::Dedup => vec!["ingest"],
            Self::Normalize => vec!["dedup"],
            Self::Aggregate { .. } => vec!["normalize"],
        }
    }
}

impl PipelineConfig {
    /// The default full pipeline: ingest, dedup, normalize, aggregate.
    pub fn default_full_pipeline() -> Self {
        Self::full_pipeline(None, None)
    }

    /// Full pipeline with explicit top-N collapse sizes for the
    /// aggregate stage.
    pub fn full_pipeline(top_stages: Option<usize>, top_countries: Option<usize>) -> Self {
        Self {
            name: "full_pipeline".to_string(),
            description: "Complete cleaning and reporting pipeline over one raw batch"
                .to_string(),
            steps: vec![
                PipelineStepConfig::Ingest,
                PipelineStepConfig::Dedup,
                PipelineStepConfig::Normalize,
                PipelineStepConfig::Aggregate {
                    top_stages,
                    top_countries,
                },
            ],
        }
    }

    /// Cleaning only: stop after normalization, emit no views.
    pub fn clean_only() -> Self {
        Self {
            name: "clean_only".to_string(),
            description: "Clean the raw batch without computing report views".to_string(),
            steps: vec![
                PipelineStepConfig::Ingest,
                PipelineStepConfig::Dedup,
                PipelineStepConfig::Normalize,
            ],
        }
    }

    /// Every stage's dependencies must appear earlier in the list;
    /// later stages assume the invariants the earlier ones establish.
    pub fn validate(&self) -> Result<()> {
        if self.steps.is_empty() {
            bail!("pipeline '{}' has no steps", self.name);
        }
        let mut seen: Vec<&str> = Vec::new();
        for step in &self.steps {
            for dependency in step.dependencies() {
                if !seen.contains(&dependency) {
                    bail!(
                        "pipeline '{}': step '{}' requires '{}' to run first",
                        self.name,
                        step.step_name(),
                        dependency
                    );
                }
            }
            seen.push(step.step_name());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_pipeline_validates() {
        assert!(PipelineConfig::default_full_pipeline().validate().is_ok());
        assert!(PipelineConfig::clean_only().validate().is_ok());
    }

    #[test]
    fn out_of_order_steps_are_rejected() {
        let config = PipelineConfig {
            name: "broken".to_string(),
            description: String::new(),
            steps: vec![PipelineStepConfig::Normalize, PipelineStepConfig::Dedup],
        };
        assert!(config.validate().is_err());
    }
}
