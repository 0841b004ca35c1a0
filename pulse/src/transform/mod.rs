//! Transformation module.
//!
//! This module turns breakdown rows into the daily pulse table:
//! - Normalizer: raw rows to bucket keys and metric fields
//! - Bucketizer: normalized rows to `(date, region, project type)` buckets
//! - Aggregator: one bucket to one pulse record
//! - Rounding: grid and decimal rounding shared by the stages
//! - Pipeline: all stages plus the privacy filter and emitter

pub mod aggregator;
pub mod bucketizer;
pub mod normalizer;
pub mod pipeline;
pub mod rounding;

pub use aggregator::{aggregate, has_ai_theme, Aggregation};
pub use bucketizer::{bucketize, Bucket};
pub use normalizer::{DropTally, Normalized, Normalizer};
pub use pipeline::*;
