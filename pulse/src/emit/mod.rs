//! Final ordering and serialization of the pulse table.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{OutputResult, PipelineError, PipelineResult};
use crate::models::PulseRecord;

/// Output table format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

/// Sort by `(date_utc, region_code, proj_type_code)`.
///
/// Two records sharing a key means buckets were not a partition; that is
/// reported instead of silently emitting both.
pub fn sort_records(mut records: Vec<PulseRecord>) -> PipelineResult<Vec<PulseRecord>> {
    records.sort_by_key(PulseRecord::key);

    if let Some(pair) = records.windows(2).find(|w| w[0].key() == w[1].key()) {
        return Err(PipelineError::DuplicateKey(pair[0].key().to_string()));
    }

    Ok(records)
}

/// Render records as CSV with a header line.
pub fn write_csv(records: &[PulseRecord]) -> OutputResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(PulseRecord::COLUMNS)?;
    for record in records {
        writer.write_record(record.to_fields())?;
    }
    writer.into_inner().map_err(|e| e.into_error().into())
}

/// Render records as a pretty-printed JSON array.
pub fn write_json(records: &[PulseRecord]) -> OutputResult<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(records)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Render records in the requested format.
pub fn render(records: &[PulseRecord], format: OutputFormat) -> OutputResult<Vec<u8>> {
    match format {
        OutputFormat::Csv => write_csv(records),
        OutputFormat::Json => write_json(records),
    }
}

/// Write a fully rendered buffer to `path`, or stdout when `None`.
pub fn write_output(bytes: &[u8], path: Option<&Path>) -> OutputResult<()> {
    match path {
        Some(p) => fs::write(p, bytes)?,
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            lock.write_all(bytes)?;
            lock.flush()?;
        }
    }
    Ok(())
}
