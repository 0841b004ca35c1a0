//! # Casting Pulse - privacy-safe daily rollup of casting breakdown views
//!
//! Casting Pulse reads a table of individual breakdown "view" events and
//! produces one row per day, region and project type, with small buckets
//! suppressed and sensitive numbers perturbed with Laplace noise.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌────────────┐   ┌────────────┐   ┌────────────┐   ┌───────────┐   ┌───────────┐
//! │  CSV File   │──▶│ Normalizer │──▶│ Bucketizer │──▶│ Aggregator │──▶│  Privacy  │──▶│  Emitter  │
//! │ (ISO/UTF8)  │   │ (keys)     │   │ (groups)   │   │ (metrics)  │   │ (suppress │   │ (CSV/JSON)│
//! └─────────────┘   └────────────┘   └────────────┘   └────────────┘   │  + noise) │   └───────────┘
//!                                                            ▲         └───────────┘
//!                                                            │
//!                                                    SentimentScorer
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use casting_pulse::{LaplaceNoise, LexiconScorer, PulseBuilder, PulseConfig};
//!
//! let config = PulseConfig::default();
//! let scorer = LexiconScorer::new();
//! let parsed = casting_pulse::read_input_file("views.csv", None)?;
//! let report = PulseBuilder::new(&config, &scorer)
//!     .build_parsed(&parsed, &mut LaplaceNoise::seeded(7))?;
//! println!("{} buckets emitted", report.records.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (RawRow, BucketKey, PulseRecord)
//! - [`config`] - Run configuration and lookup tables
//! - [`parser`] - CSV reading with auto-detection
//! - [`transform`] - Normalizer, bucketizer, aggregator and pipeline
//! - [`privacy`] - Suppression and Laplace noise
//! - [`emit`] - Ordering and output writers
//! - [`sentiment`] - Sentiment scorers
//! - [`validation`] - JSON Schema validation

// Core modules
pub mod error;
pub mod models;

// Configuration
pub mod config;
pub mod validation;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Privacy and output
pub mod emit;
pub mod privacy;

// Scoring
pub mod sentiment;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ConfigError, InputError, OutputError, PipelineError, RowError, ScorerError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Billing, BucketKey, NormalizedRow, ProjTypeCode, PulseRecord, RawRow};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{KeywordRule, ProjectTypeMap, PulseConfig, RegionMap, ScorerConfig};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content,
    detect_delimiter,
    detect_encoding,
    parse_bytes,
    parse_str,
    read_input_file,
    ParsedInput,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::{
    aggregate,
    bucketize,
    build_pulse_file,
    BuildOptions,
    DropTally,
    Normalizer,
    PulseBuilder,
    PulseReport,
    PulseStats,
};

// =============================================================================
// Re-exports - Privacy and output
// =============================================================================

pub use emit::{render, sort_records, OutputFormat};
pub use privacy::{perturb, suppress, FixedNoise, LaplaceNoise, NoiseSource};

// =============================================================================
// Re-exports - Sentiment
// =============================================================================

pub use sentiment::{build_scorer, LexiconScorer, MemoScorer, RemoteScorer, SentimentScorer};
