//! JSON persistence for cleaned records and report views.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use layoffs_core::common::error::Result;
use serde::Serialize;

/// Persist a serializable artifact to `<output_dir>/<name>_<ts>.json`.
pub fn persist_to_json<T: Serialize>(
    artifact: &T,
    name: &str,
    output_dir: &Path,
) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;

    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let filename = format!("{name}_{timestamp}.json");
    let filepath = output_dir.join(filename);

    let json_content = serde_json::to_string_pretty(artifact)?;
    fs::write(&filepath, json_content)?;

    Ok(filepath)
}
