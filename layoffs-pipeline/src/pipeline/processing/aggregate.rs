//! Read-only reporting views over the cleaned collection.
//!
//! Every view filters out null grouping keys before aggregating and
//! leaves the records untouched. Percentages stay fractions in [0,1];
//! `display_percentage` is the presentation transform.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use layoffs_core::domain::LayoffRecord;
use serde::{Deserialize, Serialize};

/// Label absorbing every stage outside the top-N set.
pub const OTHERS_LABEL: &str = "Others";

/// Presentation-only transform: fraction to a percentage rounded to
/// two decimals. Never written back to a record.
pub fn display_percentage(fraction: f64) -> f64 {
    (fraction * 100.0 * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageYearRow {
    pub year: i32,
    pub stage: String,
    pub total_laid_off: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryDeclineRow {
    pub industry: String,
    pub year: i32,
    /// Year-over-year change in summed layoffs; negative by selection.
    pub delta: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRollingRow {
    pub country: String,
    pub year: i32,
    pub yearly_total: i64,
    pub rolling_total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyPeakRow {
    pub company: String,
    pub year: i32,
    pub total_laid_off: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySpanRow {
    pub company: String,
    pub first_event: NaiveDate,
    pub last_event: NaiveDate,
    pub span_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryPercentageRow {
    pub industry: String,
    /// Mean fraction in [0,1]; apply `display_percentage` to present.
    pub average_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakEventRow {
    pub company: String,
    pub event_date: NaiveDate,
    pub total_laid_off: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthTotalRow {
    /// Calendar month as `YYYY-MM`.
    pub month: String,
    pub total_laid_off: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryCumulativeRow {
    pub industry: String,
    pub year: i32,
    pub yearly_total: i64,
    pub rolling_total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryTotalRow {
    pub country: String,
    pub total_laid_off: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearTotalRow {
    pub year: i32,
    pub total_laid_off: i64,
}

/// Sum of layoffs by (year, stage), with every stage outside the
/// all-time top `n` collapsed into [`OTHERS_LABEL`].
///
/// The top-N set is computed once over the whole dataset (dateless
/// records included) and then applied uniformly to each year. Rows are
/// ordered by year, then stage label.
pub fn top_stages_by_year(records: &[LayoffRecord], n: usize) -> Vec<StageYearRow> {
    let mut stage_totals: BTreeMap<&str, i64> = BTreeMap::new();
    for record in records {
        if let (Some(stage), Some(total)) = (record.stage.as_deref(), record.total_laid_off) {
            *stage_totals.entry(stage).or_insert(0) += total;
        }
    }

    let mut ranked: Vec<(&str, i64)> = stage_totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    let top: BTreeSet<&str> = ranked.iter().take(n).map(|(stage, _)| *stage).collect();

    let mut rows: BTreeMap<(i32, String), i64> = BTreeMap::new();
    for record in records {
        let (Some(stage), Some(total), Some(date)) =
            (record.stage.as_deref(), record.total_laid_off, record.event_date)
        else {
            continue;
        };
        let label = if top.contains(stage) {
            stage.to_string()
        } else {
            OTHERS_LABEL.to_string()
        };
        *rows.entry((date.year(), label)).or_insert(0) += total;
    }

    rows.into_iter()
        .map(|((year, stage), total_laid_off)| StageYearRow {
            year,
            stage,
            total_laid_off,
        })
        .collect()
}

/// Per industry, the year with the steepest year-over-year drop in
/// summed layoffs. Deltas are dense-ranked ascending, so a tie for the
/// most negative delta yields one row per tied year. Industries with no
/// declining year are absent.
pub fn declining_industries(records: &[LayoffRecord]) -> Vec<IndustryDeclineRow> {
    let mut rows = Vec::new();
    for (industry, by_year) in sums_by_key_and_year(records, |r| r.industry.as_deref()) {
        let deltas: Vec<(i32, i64)> = by_year
            .iter()
            .zip(by_year.iter().skip(1))
            .map(|((_, prev), (year, cur))| (*year, cur - prev))
            .filter(|(_, delta)| *delta < 0)
            .collect();

        let Some(steepest) = deltas.iter().map(|(_, delta)| *delta).min() else {
            continue;
        };
        for (year, delta) in deltas {
            if delta == steepest {
                rows.push(IndustryDeclineRow {
                    industry: industry.to_string(),
                    year,
                    delta,
                });
            }
        }
    }
    rows
}

/// Cumulative layoffs per year for the `n` countries with the highest
/// all-time totals. Countries are ordered by all-time total descending
/// (name ascending on ties), years ascending within a country.
pub fn rolling_totals_by_top_country(records: &[LayoffRecord], n: usize) -> Vec<CountryRollingRow> {
    let mut country_totals: BTreeMap<&str, i64> = BTreeMap::new();
    for record in records {
        if let Some(total) = record.total_laid_off {
            *country_totals.entry(record.country.as_str()).or_insert(0) += total;
        }
    }
    let mut ranked: Vec<(&str, i64)> = country_totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let by_country = sums_by_key_and_year(records, |r| Some(r.country.as_str()));

    let mut rows = Vec::new();
    for (country, _) in ranked.into_iter().take(n) {
        let Some(by_year) = by_country.get(country) else {
            continue;
        };
        let mut rolling = 0;
        for (year, yearly_total) in by_year {
            rolling += yearly_total;
            rows.push(CountryRollingRow {
                country: country.to_string(),
                year: *year,
                yearly_total: *yearly_total,
                rolling_total: rolling,
            });
        }
    }
    rows
}

/// Per company, the year with its maximum summed layoffs; the earliest
/// year wins a tie.
pub fn peak_company_years(records: &[LayoffRecord]) -> Vec<CompanyPeakRow> {
    let mut rows = Vec::new();
    for (company, by_year) in sums_by_key_and_year(records, |r| Some(r.company.as_str())) {
        let mut peak: Option<(i32, i64)> = None;
        for (year, total) in by_year {
            // Strictly greater keeps the first (earliest) year on ties.
            if peak.is_none_or(|(_, best)| total > best) {
                peak = Some((year, total));
            }
        }
        if let Some((year, total_laid_off)) = peak {
            rows.push(CompanyPeakRow {
                company: company.to_string(),
                year,
                total_laid_off,
            });
        }
    }
    rows
}

/// Longest observation span per company: max date minus min date.
pub fn company_observation_spans(records: &[LayoffRecord]) -> Vec<CompanySpanRow> {
    let mut spans: BTreeMap<&str, (NaiveDate, NaiveDate)> = BTreeMap::new();
    for record in records {
        let Some(date) = record.event_date else {
            continue;
        };
        spans
            .entry(record.company.as_str())
            .and_modify(|(first, last)| {
                *first = (*first).min(date);
                *last = (*last).max(date);
            })
            .or_insert((date, date));
    }
    spans
        .into_iter()
        .map(|(company, (first_event, last_event))| CompanySpanRow {
            company: company.to_string(),
            first_event,
            last_event,
            span_days: (last_event - first_event).num_days(),
        })
        .collect()
}

/// Mean fraction laid off per industry, over records carrying both a
/// non-null industry and a non-null percentage.
pub fn average_percentage_by_industry(records: &[LayoffRecord]) -> Vec<IndustryPercentageRow> {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for record in records {
        if let (Some(industry), Some(pct)) =
            (record.industry.as_deref(), record.percentage_laid_off)
        {
            let entry = sums.entry(industry).or_insert((0.0, 0));
            entry.0 += pct;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(industry, (sum, count))| IndustryPercentageRow {
            industry: industry.to_string(),
            average_percentage: sum / count as f64,
        })
        .collect()
}

/// The single dated event with the highest layoff count. Ties resolve
/// to the earliest date, then the lexicographically first company.
pub fn peak_single_event(records: &[LayoffRecord]) -> Option<PeakEventRow> {
    records
        .iter()
        .filter_map(|record| {
            let date = record.event_date?;
            let total = record.total_laid_off?;
            Some(PeakEventRow {
                company: record.company.clone(),
                event_date: date,
                total_laid_off: total,
            })
        })
        .min_by(|a, b| {
            b.total_laid_off
                .cmp(&a.total_laid_off)
                .then_with(|| a.event_date.cmp(&b.event_date))
                .then_with(|| a.company.cmp(&b.company))
        })
}

/// The calendar month with the highest global total; earliest month
/// wins a tie.
pub fn peak_month(records: &[LayoffRecord]) -> Option<MonthTotalRow> {
    let mut months: BTreeMap<(i32, u32), i64> = BTreeMap::new();
    for record in records {
        if let (Some(date), Some(total)) = (record.event_date, record.total_laid_off) {
            *months.entry((date.year(), date.month())).or_insert(0) += total;
        }
    }
    // BTreeMap iterates months ascending, and strictly-greater keeps
    // the earliest month on ties.
    let mut peak: Option<((i32, u32), i64)> = None;
    for (month, total) in months {
        if peak.is_none_or(|(_, best)| total > best) {
            peak = Some((month, total));
        }
    }
    peak.map(|((year, month), total_laid_off)| MonthTotalRow {
        month: format!("{year:04}-{month:02}"),
        total_laid_off,
    })
}

/// Running cumulative layoffs per industry over years.
pub fn cumulative_by_industry(records: &[LayoffRecord]) -> Vec<IndustryCumulativeRow> {
    let mut rows = Vec::new();
    for (industry, by_year) in sums_by_key_and_year(records, |r| r.industry.as_deref()) {
        let mut rolling = 0;
        for (year, yearly_total) in by_year {
            rolling += yearly_total;
            rows.push(IndustryCumulativeRow {
                industry: industry.to_string(),
                year,
                yearly_total,
                rolling_total: rolling,
            });
        }
    }
    rows
}

/// All-time totals per country, highest first.
pub fn country_totals(records: &[LayoffRecord]) -> Vec<CountryTotalRow> {
    let mut totals: BTreeMap<&str, i64> = BTreeMap::new();
    for record in records {
        if let Some(total) = record.total_laid_off {
            *totals.entry(record.country.as_str()).or_insert(0) += total;
        }
    }
    let mut rows: Vec<CountryTotalRow> = totals
        .into_iter()
        .map(|(country, total_laid_off)| CountryTotalRow {
            country: country.to_string(),
            total_laid_off,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.total_laid_off
            .cmp(&a.total_laid_off)
            .then_with(|| a.country.cmp(&b.country))
    });
    rows
}

/// Global totals per year, ascending.
pub fn yearly_totals(records: &[LayoffRecord]) -> Vec<YearTotalRow> {
    let mut totals: BTreeMap<i32, i64> = BTreeMap::new();
    for record in records {
        if let (Some(date), Some(total)) = (record.event_date, record.total_laid_off) {
            *totals.entry(date.year()).or_insert(0) += total;
        }
    }
    totals
        .into_iter()
        .map(|(year, total_laid_off)| YearTotalRow {
            year,
            total_laid_off,
        })
        .collect()
}

/// All reporting views computed over one cleaned collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateReport {
    pub top_stages_by_year: Vec<StageYearRow>,
    pub declining_industries: Vec<IndustryDeclineRow>,
    pub rolling_totals_by_top_country: Vec<CountryRollingRow>,
    pub peak_company_years: Vec<CompanyPeakRow>,
    pub company_observation_spans: Vec<CompanySpanRow>,
    pub average_percentage_by_industry: Vec<IndustryPercentageRow>,
    pub peak_single_event: Option<PeakEventRow>,
    pub peak_month: Option<MonthTotalRow>,
    pub cumulative_by_industry: Vec<IndustryCumulativeRow>,
    pub country_totals: Vec<CountryTotalRow>,
    pub yearly_totals: Vec<YearTotalRow>,
}

impl AggregateReport {
    pub fn build(records: &[LayoffRecord], top_stages: usize, top_countries: usize) -> Self {
        Self {
            top_stages_by_year: top_stages_by_year(records, top_stages),
            declining_industries: declining_industries(records),
            rolling_totals_by_top_country: rolling_totals_by_top_country(records, top_countries),
            peak_company_years: peak_company_years(records),
            company_observation_spans: company_observation_spans(records),
            average_percentage_by_industry: average_percentage_by_industry(records),
            peak_single_event: peak_single_event(records),
            peak_month: peak_month(records),
            cumulative_by_industry: cumulative_by_industry(records),
            country_totals: country_totals(records),
            yearly_totals: yearly_totals(records),
        }
    }

    /// Row counts per view, for step-result metadata.
    pub fn view_counts(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("top_stages_by_year", self.top_stages_by_year.len()),
            ("declining_industries", self.declining_industries.len()),
            (
                "rolling_totals_by_top_country",
                self.rolling_totals_by_top_country.len(),
            ),
            ("peak_company_years", self.peak_company_years.len()),
            (
                "company_observation_spans",
                self.company_observation_spans.len(),
            ),
            (
                "average_percentage_by_industry",
                self.average_percentage_by_industry.len(),
            ),
            (
                "peak_single_event",
                usize::from(self.peak_single_event.is_some()),
            ),
            ("peak_month", usize::from(self.peak_month.is_some())),
            ("cumulative_by_industry", self.cumulative_by_industry.len()),
            ("country_totals", self.country_totals.len()),
            ("yearly_totals", self.yearly_totals.len()),
        ]
    }
}

/// Summed layoffs per (grouping key, year), for records with a non-null
/// key, date and count. Years ascend within a key.
fn sums_by_key_and_year<'a, F>(
    records: &'a [LayoffRecord],
    key: F,
) -> BTreeMap<&'a str, BTreeMap<i32, i64>>
where
    F: Fn(&'a LayoffRecord) -> Option<&'a str>,
{
    let mut sums: BTreeMap<&str, BTreeMap<i32, i64>> = BTreeMap::new();
    for record in records {
        let (Some(group), Some(date), Some(total)) = (key(record), record.event_date, record.total_laid_off)
        else {
            continue;
        };
        *sums
            .entry(group)
            .or_default()
            .entry(date.year())
            .or_insert(0) += total;
    }
    sums
}
