use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use layoffs_pipeline::ingestion::load_csv;
use layoffs_pipeline::observability::logging::init_logging;
use layoffs_pipeline::pipeline::output::persist_to_json;
use layoffs_pipeline::pipeline::processing::rules::CanonicalRules;
use layoffs_pipeline::pipeline::{PipelineConfig, PipelineOrchestrator};

#[derive(Parser)]
#[command(name = "layoffs")]
#[command(about = "Batch cleaning and reporting pipeline for the layoffs dataset")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the complete pipeline: clean the batch and emit all report views
    Run {
        /// Raw layoffs CSV file
        #[arg(long)]
        input: PathBuf,
        /// Canonicalization rule file (TOML); built-in defaults if omitted
        #[arg(long)]
        rules: Option<PathBuf>,
        /// Directory for cleaned output and report views
        #[arg(long, default_value = "output")]
        output: PathBuf,
        /// How many funding stages to keep before collapsing into Others
        #[arg(long, default_value_t = 5)]
        top_stages: usize,
        /// How many countries to keep in the rolling-total view
        #[arg(long, default_value_t = 5)]
        top_countries: usize,
    },
    /// Clean the batch only: dedup and normalize, no report views
    Clean {
        /// Raw layoffs CSV file
        #[arg(long)]
        input: PathBuf,
        /// Canonicalization rule file (TOML); built-in defaults if omitted
        #[arg(long)]
        rules: Option<PathBuf>,
        /// Directory for the cleaned output
        #[arg(long, default_value = "output")]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            input,
            rules,
            output,
            top_stages,
            top_countries,
        } => {
            let config = PipelineConfig::full_pipeline(Some(top_stages), Some(top_countries));
            execute(&input, rules.as_deref(), &output, config)
        }
        Commands::Clean {
            input,
            rules,
            output,
        } => execute(&input, rules.as_deref(), &output, PipelineConfig::clean_only()),
    }
}

fn execute(
    input: &std::path::Path,
    rules: Option<&std::path::Path>,
    output: &std::path::Path,
    config: PipelineConfig,
) -> anyhow::Result<()> {
    let rules = match rules {
        Some(path) => CanonicalRules::from_path(path)?,
        None => CanonicalRules::default(),
    };

    let raw = load_csv(input)?;
    let orchestrator = PipelineOrchestrator::new(raw, rules, output);
    let execution = orchestrator.run_pipeline(config)?;

    let cleaned_path = persist_to_json(&execution.cleaned, "layoffs_cleaned", output)?;
    info!("💾 Saved cleaned records to {}", cleaned_path.display());
    if !execution.conflicts.is_empty() {
        let conflicts_path =
            persist_to_json(&execution.conflicts, "backfill_conflicts", output)?;
        info!(
            "⚠️ {} backfill conflicts, details in {}",
            execution.conflicts.len(),
            conflicts_path.display()
        );
    }

    println!(
        "✅ Pipeline '{}' (run {}) finished: {} cleaned records, {} conflicts",
        execution.run.name,
        execution.run.id,
        execution.cleaned.len(),
        execution.conflicts.len()
    );
    for (step, result) in &execution.step_results {
        println!("   {step}: {}", result.message);
    }
    Ok(())
}
