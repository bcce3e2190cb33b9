use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One observation of a layoff event, in the cleaned schema.
///
/// `percentage_laid_off` is stored as a fraction in [0,1]; any ×100
/// display transform is presentation-only and never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoffRecord {
    pub company: String,
    pub location: String,
    pub industry: Option<String>,
    pub total_laid_off: Option<i64>,
    pub percentage_laid_off: Option<f64>,
    pub event_date: Option<NaiveDate>,
    pub stage: Option<String>,
    pub country: String,
    pub funds_raised_millions: Option<i64>,
}

/// A row as loaded from the source table, values verbatim.
///
/// Numeric and date columns stay textual here: the Ingestor owns type
/// checking (`SchemaMismatch`), and date parsing is deferred to the
/// Normalizer so a bad date stays record-level instead of fatal.
/// The CSV loader maps empty fields of nullable columns to `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    pub company: String,
    pub location: String,
    pub industry: Option<String>,
    pub total_laid_off: Option<String>,
    pub percentage_laid_off: Option<String>,
    #[serde(rename = "date")]
    pub event_date: Option<String>,
    pub stage: Option<String>,
    pub country: String,
    pub funds_raised_millions: Option<String>,
}

/// The tuple of fields that identifies a real-world duplicate event.
///
/// Grouping must treat two nulls in the same position as equal, which
/// standard SQL-style three-valued logic would not. Deriving `Eq` and
/// `Hash` over `Option` fields gives exactly that semantics natively.
/// `percentage_laid_off` is keyed by its bit pattern so the key stays
/// hashable; identical source values produce identical bits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BusinessKey {
    pub company: String,
    pub location: String,
    pub industry: Option<String>,
    pub total_laid_off: Option<i64>,
    pub percentage_bits: Option<u64>,
    pub event_date: Option<String>,
    pub stage: Option<String>,
    pub country: String,
    pub funds_raised_millions: Option<i64>,
}

impl BusinessKey {
    /// Build the key from a record plus its still-unparsed date text.
    /// Deduplication runs before date normalization, so the date
    /// participates in the key as the raw source text.
    pub fn from_record(record: &LayoffRecord, raw_date: Option<&str>) -> Self {
        Self {
            company: record.company.clone(),
            location: record.location.clone(),
            industry: record.industry.clone(),
            total_laid_off: record.total_laid_off,
            percentage_bits: record.percentage_laid_off.map(f64::to_bits),
            event_date: raw_date.map(str::to_owned),
            stage: record.stage.clone(),
            country: record.country.clone(),
            funds_raised_millions: record.funds_raised_millions,
        }
    }
}

/// One pipeline invocation, for run-level bookkeeping in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub id: Uuid,
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl PipelineRun {
    pub fn start(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(company: &str, total: Option<i64>, pct: Option<f64>) -> LayoffRecord {
        LayoffRecord {
            company: company.to_string(),
            location: "Seattle".to_string(),
            industry: None,
            total_laid_off: total,
            percentage_laid_off: pct,
            event_date: None,
            stage: None,
            country: "United States".to_string(),
            funds_raised_millions: None,
        }
    }

    #[test]
    fn business_key_treats_null_fields_as_equal() {
        let a = BusinessKey::from_record(&record("Acme", None, None), None);
        let b = BusinessKey::from_record(&record("Acme", None, None), None);
        assert_eq!(a, b);
    }

    #[test]
    fn business_key_distinguishes_differing_values() {
        let a = BusinessKey::from_record(&record("Acme", Some(10), None), None);
        let b = BusinessKey::from_record(&record("Acme", Some(11), None), None);
        assert_ne!(a, b);

        let c = BusinessKey::from_record(&record("Acme", Some(10), None), Some("1/2/2023"));
        assert_ne!(a, c);
    }

    #[test]
    fn business_key_uses_percentage_bits() {
        let a = BusinessKey::from_record(&record("Acme", None, Some(0.25)), None);
        let b = BusinessKey::from_record(&record("Acme", None, Some(0.25)), None);
        let c = BusinessKey::from_record(&record("Acme", None, Some(0.26)), None);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
