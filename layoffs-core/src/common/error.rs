use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("schema mismatch at row {row}: {detail}")]
    SchemaMismatch { row: usize, detail: String },

    #[error("unparseable date at row {row}: {value:?}")]
    DateParse { row: usize, value: String },

    #[error("CSV read failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid rule configuration: {detail}")]
    Config { detail: String },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
