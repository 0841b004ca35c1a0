//! Lookup tables that turn free-text fields into bucket codes.
//!
//! Both tables are plain data: the shipped defaults are embedded from
//! `data/*.json` and any config file may replace them wholesale.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::ProjTypeCode;

/// Keywords this short must match a whole token rather than a substring.
const SHORT_KEYWORD_LEN: usize = 3;

static DEFAULT_REGION_MAP: Lazy<RegionMap> = Lazy::new(|| {
    let table: BTreeMap<String, String> =
        serde_json::from_str(include_str!("../../data/region-map.json"))
            .expect("Invalid embedded region map");
    RegionMap::from(table)
});

static DEFAULT_PROJECT_TYPE_MAP: Lazy<ProjectTypeMap> = Lazy::new(|| {
    let rules: Vec<KeywordRule> =
        serde_json::from_str(include_str!("../../data/project-type-map.json"))
            .expect("Invalid embedded project type map");
    ProjectTypeMap::from(rules)
});

/// Lower-case, trim, and collapse inner whitespace.
pub(crate) fn normalize_key(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// =============================================================================
// Region map
// =============================================================================

/// City → region code table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct RegionMap {
    cities: BTreeMap<String, String>,
    codes: BTreeSet<String>,
}

impl From<BTreeMap<String, String>> for RegionMap {
    fn from(table: BTreeMap<String, String>) -> Self {
        let cities: BTreeMap<String, String> = table
            .into_iter()
            .map(|(city, code)| (normalize_key(&city), code.trim().to_string()))
            .collect();
        let codes = cities.values().cloned().collect();
        Self { cities, codes }
    }
}

impl From<RegionMap> for BTreeMap<String, String> {
    fn from(map: RegionMap) -> Self {
        map.cities
    }
}

impl Default for RegionMap {
    fn default() -> Self {
        DEFAULT_REGION_MAP.clone()
    }
}

impl RegionMap {
    /// Look up a region code for a free-text city.
    ///
    /// Tries the whole value, then the segment before the first comma,
    /// then the value as an already-assigned region code.
    pub fn lookup(&self, city: &str) -> Option<&str> {
        let key = normalize_key(city);
        if key.is_empty() {
            return None;
        }

        if let Some(code) = self.cities.get(&key) {
            return Some(code);
        }

        if let Some((head, _)) = key.split_once(',') {
            if let Some(code) = self.cities.get(head.trim()) {
                return Some(code);
            }
        }

        self.codes
            .iter()
            .find(|code| code.eq_ignore_ascii_case(&key))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Distinct region codes.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.codes.iter().map(String::as_str)
    }
}

// =============================================================================
// Project type map
// =============================================================================

/// One keyword → code rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub keyword: String,
    pub code: ProjTypeCode,
}

/// Ordered keyword rules; the first rule that matches wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<KeywordRule>", into = "Vec<KeywordRule>")]
pub struct ProjectTypeMap {
    rules: Vec<KeywordRule>,
}

impl From<Vec<KeywordRule>> for ProjectTypeMap {
    fn from(rules: Vec<KeywordRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|rule| KeywordRule {
                keyword: normalize_key(&rule.keyword),
                code: rule.code,
            })
            .filter(|rule| !rule.keyword.is_empty())
            .collect();
        Self { rules }
    }
}

impl From<ProjectTypeMap> for Vec<KeywordRule> {
    fn from(map: ProjectTypeMap) -> Self {
        map.rules
    }
}

impl Default for ProjectTypeMap {
    fn default() -> Self {
        DEFAULT_PROJECT_TYPE_MAP.clone()
    }
}

impl ProjectTypeMap {
    /// Classify a free-text project type. Never fails: unmatched values are `V`.
    pub fn classify(&self, project_type: &str) -> ProjTypeCode {
        let lowered = normalize_key(project_type);
        if let Some(code) = ProjTypeCode::from_code(&lowered) {
            return code;
        }

        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        self.rules
            .iter()
            .find(|rule| {
                if rule.keyword.chars().count() <= SHORT_KEYWORD_LEN {
                    tokens.contains(&rule.keyword.as_str())
                } else {
                    lowered.contains(&rule.keyword)
                }
            })
            .map(|rule| rule.code)
            .unwrap_or(ProjTypeCode::Voice)
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }
}
