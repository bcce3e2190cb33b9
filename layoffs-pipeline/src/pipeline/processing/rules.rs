//! Canonicalization rules for the Normalizer, loaded from TOML so new
//! label mappings never require a code change.

use std::path::Path;

use layoffs_core::common::error::{PipelineError, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Folds every industry label starting with `prefix` into `canonical`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollapseRule {
    pub prefix: String,
    pub canonical: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalRules {
    /// Source format the date column is written in.
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// Characters stripped from the end of `country` values.
    #[serde(default = "default_country_punctuation")]
    pub country_trailing_punctuation: String,
    #[serde(default)]
    pub industry_collapse: Vec<CollapseRule>,
}

fn default_date_format() -> String {
    "%m/%d/%Y".to_string()
}

fn default_country_punctuation() -> String {
    ".".to_string()
}

/// Rules applied when no rule file is given: the one near-duplicate
/// family known in the source data plus the stock date/country formats.
pub static DEFAULT_RULES: Lazy<CanonicalRules> = Lazy::new(|| CanonicalRules {
    date_format: default_date_format(),
    country_trailing_punctuation: default_country_punctuation(),
    industry_collapse: vec![CollapseRule {
        prefix: "Crypto".to_string(),
        canonical: "Crypto".to_string(),
    }],
});

impl Default for CanonicalRules {
    fn default() -> Self {
        DEFAULT_RULES.clone()
    }
}

impl CanonicalRules {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let rules: CanonicalRules =
            toml::from_str(&text).map_err(|e| PipelineError::Config {
                detail: format!("{}: {e}", path.display()),
            })?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> Result<()> {
        if self.date_format.is_empty() {
            return Err(PipelineError::Config {
                detail: "date_format must not be empty".to_string(),
            });
        }
        for rule in &self.industry_collapse {
            if rule.prefix.is_empty() {
                return Err(PipelineError::Config {
                    detail: format!(
                        "industry_collapse rule for {:?} has an empty prefix",
                        rule.canonical
                    ),
                });
            }
        }
        Ok(())
    }

    /// Canonical label for an industry, if any rule matches.
    pub fn collapse_industry(&self, industry: &str) -> Option<&str> {
        self.industry_collapse
            .iter()
            .find(|rule| industry.starts_with(&rule.prefix))
            .map(|rule| rule.canonical.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_rules_fold_crypto_variants() {
        let rules = CanonicalRules::default();
        assert_eq!(rules.collapse_industry("Crypto Currency"), Some("Crypto"));
        assert_eq!(rules.collapse_industry("CryptoCurrency"), Some("Crypto"));
        assert_eq!(rules.collapse_industry("Retail"), None);
    }

    #[test]
    fn loads_rules_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "date_format = \"%Y-%m-%d\"\n\n\
             [[industry_collapse]]\nprefix = \"Fin\"\ncanonical = \"Finance\"\n"
        )
        .unwrap();

        let rules = CanonicalRules::from_path(file.path()).unwrap();
        assert_eq!(rules.date_format, "%Y-%m-%d");
        assert_eq!(rules.country_trailing_punctuation, ".");
        assert_eq!(rules.collapse_industry("FinTech"), Some("Finance"));
    }

    #[test]
    fn rejects_empty_prefix() {
        let rules = CanonicalRules {
            date_format: "%m/%d/%Y".to_string(),
            country_trailing_punctuation: ".".to_string(),
            industry_collapse: vec![CollapseRule {
                prefix: String::new(),
                canonical: "X".to_string(),
            }],
        };
        assert!(rules.validate().is_err());
    }
}
