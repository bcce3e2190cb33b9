//! CSV loading for the raw layoffs table.
//!
//! The loader is an external collaborator of the pipeline proper: it
//! only turns a file into `RawRecord`s, verbatim. All typing, cleaning
//! and filtering decisions belong to the pipeline steps.

use std::path::Path;

use layoffs_core::common::error::{PipelineError, Result};
use layoffs_core::domain::RawRecord;
use tracing::{debug, info};

/// Header the source table is expected to carry, in column order.
pub const EXPECTED_HEADERS: [&str; 9] = [
    "company",
    "location",
    "industry",
    "total_laid_off",
    "percentage_laid_off",
    "date",
    "stage",
    "country",
    "funds_raised_millions",
];

/// Load raw rows from a CSV file.
///
/// Fails with `SchemaMismatch` when the header does not carry the nine
/// expected columns; a row with a deviating field count surfaces as a
/// `Csv` error from the reader. Values are not inspected here.
pub fn load_csv(path: &Path) -> Result<Vec<RawRecord>> {
    info!("📥 Loading raw layoffs table from {}", path.display());

    // Non-flexible reader: a row with a deviating field count is a
    // hard error, the batch cannot proceed with an inconsistent shape.
    let mut reader = csv::ReaderBuilder::new().from_path(path)?;

    let headers = reader.headers()?.clone();
    verify_headers(&headers)?;

    let mut rows = Vec::new();
    for result in reader.deserialize::<RawRecord>() {
        rows.push(result?);
    }

    debug!("Loaded {} raw rows", rows.len());
    Ok(rows)
}

fn verify_headers(headers: &csv::StringRecord) -> Result<()> {
    if headers.len() != EXPECTED_HEADERS.len() {
        return Err(PipelineError::SchemaMismatch {
            row: 0,
            detail: format!(
                "expected {} columns, found {}",
                EXPECTED_HEADERS.len(),
                headers.len()
            ),
        });
    }
    for (position, (found, expected)) in headers.iter().zip(EXPECTED_HEADERS).enumerate() {
        if found != expected {
            return Err(PipelineError::SchemaMismatch {
                row: 0,
                detail: format!(
                    "column {position}: expected header {expected:?}, found {found:?}"
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_rows_verbatim_with_empty_fields_as_null() {
        let file = write_csv(
            "company,location,industry,total_laid_off,percentage_laid_off,date,stage,country,funds_raised_millions\n\
             Acme,Seattle,Tech,100,0.1,1/2/2023,Series B,United States,120\n\
             Beta,Portland,,,,,,Canada,\n",
        );

        let rows = load_csv(file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].company, "Acme");
        assert_eq!(rows[0].total_laid_off.as_deref(), Some("100"));
        assert_eq!(rows[0].event_date.as_deref(), Some("1/2/2023"));
        assert_eq!(rows[1].industry, None);
        assert_eq!(rows[1].funds_raised_millions, None);
    }

    #[test]
    fn rejects_wrong_header() {
        let file = write_csv("company,location\nAcme,Seattle\n");
        let err = load_csv(file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch { row: 0, .. }));
    }

    #[test]
    fn rejects_misnamed_column() {
        let file = write_csv(
            "company,location,industry,total_laid_off,percentage_laid_off,event_day,stage,country,funds_raised_millions\n",
        );
        let err = load_csv(file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch { .. }));
    }
}
