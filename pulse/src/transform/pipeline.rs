//! High-level pipeline API: breakdown CSV to daily pulse table.
//!
//! ```text
//! RawRow ─▶ Normalizer ─▶ Bucketizer ─▶ Aggregator ─▶ Privacy ─▶ Emitter
//!              │                                         │
//!              └─ drops (by reason)                      └─ suppressed
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use casting_pulse::{build_pulse_file, BuildOptions, PulseConfig};
//! use std::path::Path;
//!
//! let config = PulseConfig::default();
//! let report = build_pulse_file(
//!     Path::new("views.csv"),
//!     Some(Path::new("pulse.csv")),
//!     &config,
//!     &BuildOptions::default(),
//! )?;
//! println!("{} buckets emitted", report.records.len());
//! ```

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, warn};

use super::aggregator::aggregate;
use super::bucketizer::bucketize;
use super::normalizer::{DropTally, Normalizer};
use crate::config::PulseConfig;
use crate::emit::{render, sort_records, write_output, OutputFormat};
use crate::error::PipelineResult;
use crate::models::{PulseRecord, RawRow};
use crate::parser::{read_input_file, ParsedInput};
use crate::privacy::{perturb, suppress, LaplaceNoise, NoiseSource};
use crate::sentiment::{build_scorer, MemoScorer, SentimentScorer};

/// Options for a file-to-file run that are not part of [`PulseConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Output table format.
    pub format: OutputFormat,

    /// CSV delimiter (auto-detect if `None`).
    pub delimiter: Option<char>,
}

/// Run statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PulseStats {
    /// Input records, including malformed ones.
    pub input_rows: usize,

    /// Rows that never reached a bucket, per reason.
    pub drops: DropTally,

    /// Buckets formed before suppression.
    pub buckets: usize,

    /// Buckets discarded for being below the minimum size.
    pub suppressed: usize,

    /// Descriptions the scorer could not score.
    pub scorer_failures: usize,
}

impl PulseStats {
    /// Share of input rows that were dropped.
    pub fn drop_ratio(&self) -> f64 {
        if self.input_rows == 0 {
            0.0
        } else {
            self.drops.total() as f64 / self.input_rows as f64
        }
    }

    /// Whether the drop ratio is strictly above `threshold`.
    pub fn drop_rate_exceeded(&self, threshold: f64) -> bool {
        self.drop_ratio() > threshold
    }
}

/// Emitted records plus run statistics.
#[derive(Debug, Clone, Serialize)]
pub struct PulseReport {
    pub records: Vec<PulseRecord>,
    pub stats: PulseStats,
}

/// Runs the five stages over an in-memory table.
pub struct PulseBuilder<'a> {
    config: &'a PulseConfig,
    scorer: &'a dyn SentimentScorer,
}

impl<'a> PulseBuilder<'a> {
    pub fn new(config: &'a PulseConfig, scorer: &'a dyn SentimentScorer) -> Self {
        Self { config, scorer }
    }

    /// Build the pulse table from raw rows.
    pub fn build(
        &self,
        rows: &[RawRow],
        noise: &mut dyn NoiseSource,
    ) -> PipelineResult<PulseReport> {
        self.run(rows, 0, noise)
    }

    /// Build from reader output, counting its malformed records as drops.
    pub fn build_parsed(
        &self,
        input: &ParsedInput,
        noise: &mut dyn NoiseSource,
    ) -> PipelineResult<PulseReport> {
        self.run(&input.rows, input.malformed, noise)
    }

    fn run(
        &self,
        rows: &[RawRow],
        malformed: usize,
        noise: &mut dyn NoiseSource,
    ) -> PipelineResult<PulseReport> {
        let config = self.config;
        config.validate()?;

        let mut stats = PulseStats {
            input_rows: rows.len() + malformed,
            ..PulseStats::default()
        };

        // Step 1: Normalize
        let normalized = Normalizer::from_config(config).normalize_all(rows);
        stats.drops = normalized.drops;
        stats.drops.malformed = malformed;
        info!(
            kept = normalized.rows.len(),
            invalid_date = stats.drops.invalid_date,
            unmapped_region = stats.drops.unmapped_region,
            malformed = stats.drops.malformed,
            "normalized input rows"
        );

        if stats.drop_rate_exceeded(config.drop_warning_ratio) {
            warn!(
                dropped = stats.drops.total(),
                input = stats.input_rows,
                ratio = %format!("{:.1}%", stats.drop_ratio() * 100.0),
                "drop rate above warning threshold"
            );
        }

        // Step 2: Bucketize
        let buckets = bucketize(&normalized.rows);
        stats.buckets = buckets.len();
        info!(buckets = stats.buckets, "bucketized rows");

        // Step 3: Aggregate
        let scorer = MemoScorer::new(self.scorer);
        let mut records = Vec::with_capacity(buckets.len());
        for bucket in buckets.values() {
            let aggregation = aggregate(bucket, &scorer);
            stats.scorer_failures += aggregation.scorer_failures;
            records.push(aggregation.record);
        }
        if stats.scorer_failures > 0 {
            warn!(
                scorer = scorer.name(),
                failures = stats.scorer_failures,
                "some descriptions could not be scored; excluded from sentiment"
            );
        }

        // Step 4: Suppress, then perturb survivors
        let (kept, suppressed) = suppress(records, config.min_bucket_size());
        stats.suppressed = suppressed;
        let scale = config.laplace_noise_scale;
        let perturbed: Vec<PulseRecord> = kept
            .iter()
            .map(|r| perturb(r, scale, &mut *noise))
            .collect();
        info!(
            suppressed,
            kept = perturbed.len(),
            minimum_bucket_size = config.minimum_bucket_size,
            noise_scale = scale,
            "applied privacy filter"
        );

        // Step 5: Order
        let records = sort_records(perturbed)?;
        log_summary(&records);

        Ok(PulseReport { records, stats })
    }
}

/// Read a CSV file, build the pulse table and write it once everything succeeded.
///
/// The configuration is validated before the input is opened; on any error
/// nothing is written.
pub fn build_pulse_file(
    input: &Path,
    output: Option<&Path>,
    config: &PulseConfig,
    options: &BuildOptions,
) -> PipelineResult<PulseReport> {
    config.validate()?;
    let scorer = build_scorer(&config.sentiment_scorer)?;
    let mut noise = LaplaceNoise::from_seed_option(config.noise_seed);

    info!(input = %input.display(), "reading breakdown table");
    let parsed = read_input_file(input, options.delimiter)?;
    info!(
        encoding = %parsed.encoding,
        delimiter = %format_delimiter(parsed.delimiter),
        rows = parsed.rows.len(),
        columns = parsed.headers.len(),
        "parsed input"
    );

    let report = PulseBuilder::new(config, scorer.as_ref()).build_parsed(&parsed, &mut noise)?;

    let bytes = render(&report.records, options.format)?;
    write_output(&bytes, output)?;
    if let Some(path) = output {
        info!(output = %path.display(), records = report.records.len(), "pulse table written");
    }

    Ok(report)
}

/// Format delimiter for display
fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}

fn log_summary(records: &[PulseRecord]) {
    let (Some(first), Some(last)) = (records.first(), records.last()) else {
        info!("no buckets survived the privacy filter");
        return;
    };
    let regions: BTreeSet<&str> = records.iter().map(|r| r.region_code.as_str()).collect();
    let types: BTreeSet<&str> = records.iter().map(|r| r.proj_type_code.as_str()).collect();
    info!(
        records = records.len(),
        from = %first.date_utc,
        to = %last.date_utc,
        regions = ?regions,
        project_types = ?types,
        "pulse table ready"
    );
}
