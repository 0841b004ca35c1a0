//! Error types for the Casting Pulse pipeline.
//!
//! - [`ConfigError`] - Invalid configuration, fatal before any input is read
//! - [`InputError`] - Reading or decoding the breakdown CSV
//! - [`RowError`] - Per-row normalization failures (row dropped, run continues)
//! - [`ScorerError`] - Sentiment collaborator failures (metric skipped for that row)
//! - [`OutputError`] - Writing the pulse table
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Conversion into [`PipelineError`] is automatic via `From`, so `?` works
//! across stage boundaries.

use thiserror::Error;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Invalid configuration. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON or does not match the expected shape.
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Config file violates the embedded JSON schema.
    #[error("Config schema violation: {}", .0.join("; "))]
    Schema(Vec<String>),

    /// A field holds a value outside its domain.
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: &'static str, message: String },
}

// =============================================================================
// Input Errors
// =============================================================================

/// Errors while reading the breakdown table.
#[derive(Debug, Error)]
pub enum InputError {
    /// Failed to read file.
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    /// Input has no content at all.
    #[error("Input CSV is empty")]
    EmptyFile,

    /// Header line could not be read.
    #[error("No header row found in input CSV: {0}")]
    NoHeaders(String),

    /// A required column is absent from the header.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// The CSV reader only accepts single-byte delimiters.
    #[error("Delimiter must be a single ASCII character, got {0:?}")]
    InvalidDelimiter(char),
}

// =============================================================================
// Row Errors
// =============================================================================

/// Reasons a single breakdown row cannot be assigned to a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    /// `posted_date` missing or unparseable.
    #[error("Invalid posted_date: '{0}'")]
    InvalidDate(String),

    /// `work_city` has no region mapping.
    #[error("No region mapping for work_city '{0}'")]
    UnmappedRegion(String),
}

// =============================================================================
// Scorer Errors
// =============================================================================

/// Errors from a sentiment scorer.
#[derive(Debug, Clone, Error)]
pub enum ScorerError {
    /// HTTP request failed.
    #[error("Scorer request failed: {0}")]
    RequestFailed(String),

    /// Scorer replied with something that is not a score list.
    #[error("Invalid scorer response: {0}")]
    InvalidResponse(String),

    /// Score outside [-1, 1] or not finite.
    #[error("Score {0} outside [-1, 1]")]
    OutOfRange(f64),
}

// =============================================================================
// Output Errors
// =============================================================================

/// Errors while writing the pulse table.
#[derive(Debug, Error)]
pub enum OutputError {
    /// IO error.
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization error.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON write error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors returned by [`crate::transform::pipeline::build_pulse_file`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Input error.
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// Output error.
    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    /// The configured scorer could not be set up.
    #[error("Scorer error: {0}")]
    Scorer(#[from] ScorerError),

    /// Two surviving records share a bucket key.
    #[error("Duplicate bucket key in output: {0}")]
    DuplicateKey(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for input reading.
pub type InputResult<T> = Result<T, InputError>;

/// Result type for output writing.
pub type OutputResult<T> = Result<T, OutputError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
