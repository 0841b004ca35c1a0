//! Map raw breakdown rows onto bucket keys.
//!
//! ```text
//! posted_date  "2024-05-01T23:30:00-07:00"  →  date_utc        2024-05-02
//! work_city    " Burbank, CA "              →  region_code     LA
//! project_type "Feature Film"               →  proj_type_code  F
//! ```
//!
//! Rows whose date cannot be parsed or whose city has no region are
//! dropped and tallied by reason. An unmatched project type is not a
//! failure: it lands in the `V` catch-all.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::config::maps::normalize_key;
use crate::config::{ProjectTypeMap, PulseConfig, RegionMap};
use crate::error::RowError;
use crate::models::{Billing, BucketKey, NormalizedRow, RawRow};

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("Invalid number regex"));

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const OFFSET_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

const UNION_TRUE_VALUES: [&str; 5] = ["true", "yes", "y", "1", "t"];

const UNION_KEYWORDS: [&str; 4] = ["union", "sag", "aftra", "aea"];

/// Per-reason counts of rows that never reached a bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DropTally {
    pub invalid_date: usize,
    pub unmapped_region: usize,
    /// Rows the CSV reader could not decode.
    pub malformed: usize,
}

impl DropTally {
    pub fn record(&mut self, err: &RowError) {
        match err {
            RowError::InvalidDate(_) => self.invalid_date += 1,
            RowError::UnmappedRegion(_) => self.unmapped_region += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.invalid_date + self.unmapped_region + self.malformed
    }
}

/// Result of normalizing a whole table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Normalized {
    pub rows: Vec<NormalizedRow>,
    pub drops: DropTally,
}

/// Row normalizer bound to a pair of lookup tables.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'a> {
    regions: &'a RegionMap,
    project_types: &'a ProjectTypeMap,
}

impl<'a> Normalizer<'a> {
    pub fn new(regions: &'a RegionMap, project_types: &'a ProjectTypeMap) -> Self {
        Self { regions, project_types }
    }

    pub fn from_config(config: &'a PulseConfig) -> Self {
        Self::new(&config.region_map, &config.project_type_map)
    }

    /// Compute the bucket key of a row.
    ///
    /// The date is checked first, so a row that is bad on both counts is
    /// tallied as `InvalidDate`.
    pub fn key(&self, row: &RawRow) -> Result<BucketKey, RowError> {
        let raw_date = row.posted_date.as_deref().unwrap_or("");
        let date_utc = parse_date_utc(raw_date)
            .ok_or_else(|| RowError::InvalidDate(raw_date.to_string()))?;

        let raw_city = row.work_city.as_deref().unwrap_or("");
        let region_code = self
            .regions
            .lookup(raw_city)
            .ok_or_else(|| RowError::UnmappedRegion(raw_city.trim().to_string()))?
            .to_string();

        let proj_type_code = self
            .project_types
            .classify(row.project_type.as_deref().unwrap_or(""));

        Ok(BucketKey {
            date_utc,
            region_code,
            proj_type_code,
        })
    }

    /// Normalize one row: bucket key plus interpreted metric fields.
    pub fn normalize(&self, row: &RawRow) -> Result<NormalizedRow, RowError> {
        let key = self.key(row)?;

        Ok(NormalizedRow {
            key,
            lead_tier: row
                .role_billing
                .as_deref()
                .map(|b| Billing::parse(b).is_lead_tier())
                .unwrap_or(false),
            union_member: row.union_status.as_deref().map(parse_union).unwrap_or(false),
            rate: row.rate_value.as_deref().and_then(parse_rate),
            description: row
                .role_description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(String::from),
        })
    }

    /// Normalize every row, tallying the ones that have to be dropped.
    pub fn normalize_all(&self, rows: &[RawRow]) -> Normalized {
        let mut normalized = Normalized::default();

        for row in rows {
            match self.normalize(row) {
                Ok(n) => normalized.rows.push(n),
                Err(err) => {
                    tracing::trace!(error = %err, "row dropped");
                    normalized.drops.record(&err);
                }
            }
        }

        normalized
    }
}

/// Parse a timestamp and truncate it to its UTC calendar day.
///
/// Timestamps with an offset are converted to UTC first; naive timestamps
/// and bare dates are taken as UTC.
pub fn parse_date_utc(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }

    for fmt in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc).date_naive());
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ndt.date());
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Parse a non-negative rate, tolerating currency formatting.
///
/// `"150"`, `"$1,200/day"` and `"250.50 USD"` all parse; negative,
/// non-finite or digit-free values are treated as missing. The sign is
/// looked for wherever the number sits, so `"$-100"` is negative too.
pub fn parse_rate(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let value = match s.parse::<f64>() {
        Ok(v) => v,
        Err(_) => {
            let cleaned = s.replace(',', "");
            NUMBER_RE.find(&cleaned)?.as_str().parse::<f64>().ok()?
        }
    };

    (value.is_finite() && value >= 0.0 && !s.starts_with('-')).then_some(value)
}

/// Interpret a boolean-like union status.
///
/// Explicit negatives (`non-union`, `nonunion`) win over the keywords they contain.
pub fn parse_union(raw: &str) -> bool {
    let value = normalize_key(raw);
    if UNION_TRUE_VALUES.contains(&value.as_str()) {
        return true;
    }

    let tokens: Vec<&str> = value
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    if tokens.iter().any(|t| *t == "non" || *t == "nonunion") {
        return false;
    }

    tokens.iter().any(|t| UNION_KEYWORDS.contains(t))
}
