//! Run configuration.
//!
//! A [`PulseConfig`] is built from defaults, optionally overlaid with a JSON
//! file, and finally overridden by CLI flags. Files are checked against the
//! embedded Draft 7 schema (`schemas/pulse-config.json`) before they are
//! deserialized, then [`PulseConfig::validate`] checks value domains.
//!
//! ```json
//! {
//!   "minimum_bucket_size": 5,
//!   "laplace_noise_scale": 1.0,
//!   "noise_seed": 42,
//!   "sentiment_scorer": { "kind": "lexicon" }
//! }
//! ```

pub mod maps;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::validation::validate;

pub use maps::{KeywordRule, ProjectTypeMap, RegionMap};

static CONFIG_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/pulse-config.json"))
        .expect("Invalid embedded config schema")
});

fn default_timeout_secs() -> u64 {
    30
}

/// Which sentiment scorer to use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScorerConfig {
    /// Built-in word-polarity lexicon, optionally extended.
    Lexicon {
        #[serde(default)]
        extra_words: BTreeMap<String, f64>,
    },
    /// Remote HTTP scoring service.
    Remote {
        endpoint: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self::Lexicon {
            extra_words: BTreeMap::new(),
        }
    }
}

/// Complete configuration for one pulse run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    /// Buckets with fewer rows are suppressed entirely.
    pub minimum_bucket_size: i64,

    /// Scale `b` of the Laplace noise added to counts and rates. 0 disables noise.
    pub laplace_noise_scale: f64,

    /// Seed for the noise generator. `None` draws from OS entropy.
    pub noise_seed: Option<u64>,

    /// Share of dropped input rows above which a warning is logged.
    pub drop_warning_ratio: f64,

    pub region_map: RegionMap,

    pub project_type_map: ProjectTypeMap,

    pub sentiment_scorer: ScorerConfig,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            minimum_bucket_size: 5,
            laplace_noise_scale: 1.0,
            noise_seed: None,
            drop_warning_ratio: 0.2,
            region_map: RegionMap::default(),
            project_type_map: ProjectTypeMap::default(),
            sentiment_scorer: ScorerConfig::default(),
        }
    }
}

impl PulseConfig {
    /// Load and validate a config file.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Parse and validate a config document.
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let document: Value = serde_json::from_str(content)?;
        validate(&CONFIG_SCHEMA, &document).map_err(ConfigError::Schema)?;

        let config: PulseConfig = serde_json::from_value(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value domain. Call again after applying overrides.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.minimum_bucket_size < 0 {
            return Err(ConfigError::InvalidValue {
                field: "minimum_bucket_size",
                message: format!("must be >= 0, got {}", self.minimum_bucket_size),
            });
        }

        if !self.laplace_noise_scale.is_finite() || self.laplace_noise_scale < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "laplace_noise_scale",
                message: format!("must be a finite value >= 0, got {}", self.laplace_noise_scale),
            });
        }

        if !(0.0..=1.0).contains(&self.drop_warning_ratio) {
            return Err(ConfigError::InvalidValue {
                field: "drop_warning_ratio",
                message: format!("must be within [0, 1], got {}", self.drop_warning_ratio),
            });
        }

        if self.region_map.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "region_map",
                message: "must contain at least one city".into(),
            });
        }

        match &self.sentiment_scorer {
            ScorerConfig::Lexicon { extra_words } => {
                if let Some((word, weight)) = extra_words
                    .iter()
                    .find(|(_, w)| !(-1.0..=1.0).contains(*w))
                {
                    return Err(ConfigError::InvalidValue {
                        field: "sentiment_scorer.extra_words",
                        message: format!(
                            "polarity of '{}' must be within [-1, 1], got {}",
                            word, weight
                        ),
                    });
                }
            }
            ScorerConfig::Remote { endpoint, timeout_secs } => {
                if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                    return Err(ConfigError::InvalidValue {
                        field: "sentiment_scorer.endpoint",
                        message: format!("must be an http(s) URL, got '{}'", endpoint),
                    });
                }
                if *timeout_secs == 0 {
                    return Err(ConfigError::InvalidValue {
                        field: "sentiment_scorer.timeout_secs",
                        message: "must be >= 1".into(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Suppression threshold as a count. Only meaningful after [`Self::validate`].
    pub fn min_bucket_size(&self) -> usize {
        usize::try_from(self.minimum_bucket_size).unwrap_or(0)
    }

    /// Serialize the effective configuration.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
