pub mod ingestion;
pub mod observability;
pub mod pipeline;
