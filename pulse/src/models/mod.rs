//! Domain models for the Casting Pulse pipeline.
//!
//! - [`RawRow`] - One breakdown view event as read from the input table
//! - [`NormalizedRow`] - A row with its bucket key and interpreted metric fields
//! - [`BucketKey`] - `(date_utc, region_code, proj_type_code)`
//! - [`ProjTypeCode`] - Closed project type set `{C, F, T, V}`
//! - [`Billing`] - Role billing tier
//! - [`PulseRecord`] - One output row per surviving bucket

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Raw input
// =============================================================================

/// A single breakdown view event.
///
/// Every field is kept as raw text; interpretation happens in the normalizer.
/// Columns not listed here (including any identity columns) are ignored by
/// the reader and never reach the output. Alternative header names are
/// mapped onto these fields by the parser before deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    #[serde(default)]
    pub posted_date: Option<String>,

    #[serde(default)]
    pub work_city: Option<String>,

    #[serde(default)]
    pub project_type: Option<String>,

    #[serde(default)]
    pub rate_value: Option<String>,

    #[serde(default)]
    pub role_billing: Option<String>,

    #[serde(default)]
    pub union_status: Option<String>,

    #[serde(default)]
    pub role_description: Option<String>,
}

// =============================================================================
// Project type
// =============================================================================

/// Project type bucket code.
///
/// Variants are declared in code-letter order so the derived `Ord`
/// sorts lexicographically by code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProjTypeCode {
    /// Commercials, ads, campaigns, print.
    #[serde(rename = "C")]
    Commercial,
    /// Features, shorts, documentaries.
    #[serde(rename = "F")]
    Film,
    /// Series, pilots, streaming.
    #[serde(rename = "T")]
    Television,
    /// Voice, audio, web and the catch-all for anything unmatched.
    #[serde(rename = "V")]
    Voice,
}

impl ProjTypeCode {
    /// All codes in sort order.
    pub const ALL: [ProjTypeCode; 4] =
        [Self::Commercial, Self::Film, Self::Television, Self::Voice];

    /// Single-letter code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Commercial => "C",
            Self::Film => "F",
            Self::Television => "T",
            Self::Voice => "V",
        }
    }

    /// Parse a single-letter code (case-insensitive).
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "C" => Some(Self::Commercial),
            "F" => Some(Self::Film),
            "T" => Some(Self::Television),
            "V" => Some(Self::Voice),
            _ => None,
        }
    }
}

impl fmt::Display for ProjTypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Billing
// =============================================================================

/// Role billing tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Billing {
    Lead,
    Principal,
    Supporting,
    Background,
    Other(String),
}

impl Billing {
    /// Parse a billing label. Unknown labels are kept as `Other`.
    ///
    /// The first word naming a tier decides, so `"Lead Role"` and
    /// `"Principal - Female"` parse. A `co` prefix joins the next word:
    /// `"Co-Star"` is supporting, not a star.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        let mut words = normalized
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty());

        while let Some(word) = words.next() {
            let tier = if word == "co" {
                words.next().and_then(|next| Self::from_word(&format!("co{}", next)))
            } else {
                Self::from_word(word)
            };
            if let Some(tier) = tier {
                return tier;
            }
        }

        Self::Other(raw.trim().to_string())
    }

    fn from_word(word: &str) -> Option<Self> {
        match word {
            "lead" | "colead" | "starring" | "star" => Some(Self::Lead),
            "principal" => Some(Self::Principal),
            "supporting" | "support" | "costar" => Some(Self::Supporting),
            "background" | "extra" | "extras" => Some(Self::Background),
            _ => None,
        }
    }

    /// Lead and Principal count toward `lead_share_pct_day`.
    pub fn is_lead_tier(&self) -> bool {
        matches!(self, Self::Lead | Self::Principal)
    }
}

// =============================================================================
// Bucket key and normalized row
// =============================================================================

/// Composite aggregation key. Field order defines the output sort order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BucketKey {
    pub date_utc: NaiveDate,
    pub region_code: String,
    pub proj_type_code: ProjTypeCode,
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.date_utc, self.region_code, self.proj_type_code)
    }
}

/// A breakdown row after normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRow {
    pub key: BucketKey,
    pub lead_tier: bool,
    pub union_member: bool,
    /// `None` when the rate was absent or unusable.
    pub rate: Option<f64>,
    /// `None` when the description was absent or blank.
    pub description: Option<String>,
}

// =============================================================================
// Output record
// =============================================================================

/// One row of the daily pulse table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulseRecord {
    pub date_utc: NaiveDate,
    pub region_code: String,
    pub proj_type_code: ProjTypeCode,
    pub role_count_day: u64,
    pub lead_share_pct_day: f64,
    pub union_share_pct_day: f64,
    pub median_rate_day_usd: Option<i64>,
    pub sentiment_avg_day: Option<f64>,
    pub theme_ai_share_pct_day: f64,
}

impl PulseRecord {
    /// Column names in output order.
    pub const COLUMNS: [&'static str; 9] = [
        "date_utc",
        "region_code",
        "proj_type_code",
        "role_count_day",
        "lead_share_pct_day",
        "union_share_pct_day",
        "median_rate_day_usd",
        "sentiment_avg_day",
        "theme_ai_share_pct_day",
    ];

    /// Bucket key this record was aggregated from.
    pub fn key(&self) -> BucketKey {
        BucketKey {
            date_utc: self.date_utc,
            region_code: self.region_code.clone(),
            proj_type_code: self.proj_type_code,
        }
    }

    /// Fields formatted with the fixed output precision.
    ///
    /// Percentages carry one decimal, sentiment two, the rate is an integer.
    /// Nulls become empty fields.
    pub fn to_fields(&self) -> [String; 9] {
        [
            self.date_utc.format("%Y-%m-%d").to_string(),
            self.region_code.clone(),
            self.proj_type_code.to_string(),
            self.role_count_day.to_string(),
            format!("{:.1}", self.lead_share_pct_day),
            format!("{:.1}", self.union_share_pct_day),
            self.median_rate_day_usd.map(|r| r.to_string()).unwrap_or_default(),
            self.sentiment_avg_day.map(|s| format!("{:.2}", s)).unwrap_or_default(),
            format!("{:.1}", self.theme_ai_share_pct_day),
        ]
    }
}
