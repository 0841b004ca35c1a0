//! Reduce one bucket to its pulse metrics.
//!
//! | metric | denominator |
//! |---|---|
//! | `lead_share_pct_day`, `union_share_pct_day`, `theme_ai_share_pct_day` | all rows |
//! | `median_rate_day_usd` | rows with a rate |
//! | `sentiment_avg_day` | rows with a description the scorer accepted |
//!
//! Every metric is a pure function of the bucket's row set; floating sums
//! run over sorted values so row order cannot leak into the last bit.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::bucketizer::Bucket;
use super::rounding::{median, round_rate, round_sentiment, share_pct};
use crate::models::PulseRecord;
use crate::sentiment::SentimentScorer;

/// "ai" as a standalone word: matches "AI lab", not "Thai" or "said".
static AI_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bai\b").expect("Invalid AI token regex"));

const THEME_SUBSTRINGS: [&str; 2] = ["robot", "android"];

/// Aggregated record plus per-bucket diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub record: PulseRecord,
    /// Descriptions the scorer failed on (excluded from the sentiment mean).
    pub scorer_failures: usize,
}

/// Whether a description touches the AI/robotics theme.
pub fn has_ai_theme(text: &str) -> bool {
    if AI_TOKEN_RE.is_match(text) {
        return true;
    }
    let lowered = text.to_lowercase();
    THEME_SUBSTRINGS.iter().any(|k| lowered.contains(k))
}

/// Aggregate a non-empty bucket.
pub fn aggregate(bucket: &Bucket<'_>, scorer: &dyn SentimentScorer) -> Aggregation {
    let rows = &bucket.rows;
    let n = rows.len();

    let lead = rows.iter().filter(|r| r.lead_tier).count();
    let union = rows.iter().filter(|r| r.union_member).count();
    let themed = rows
        .iter()
        .filter(|r| r.description.as_deref().is_some_and(has_ai_theme))
        .count();

    let rates: Vec<f64> = rows.iter().filter_map(|r| r.rate).collect();
    let median_rate = median(&rates).map(round_rate);

    let texts: Vec<&str> = rows.iter().filter_map(|r| r.description.as_deref()).collect();
    let (sentiment, scorer_failures) = mean_sentiment(&texts, scorer);

    debug!(
        bucket = %bucket.key,
        rows = n,
        rated = rates.len(),
        scored = texts.len() - scorer_failures,
        "aggregated bucket"
    );

    Aggregation {
        record: PulseRecord {
            date_utc: bucket.key.date_utc,
            region_code: bucket.key.region_code.clone(),
            proj_type_code: bucket.key.proj_type_code,
            role_count_day: n as u64,
            lead_share_pct_day: share_pct(lead, n),
            union_share_pct_day: share_pct(union, n),
            median_rate_day_usd: median_rate,
            sentiment_avg_day: sentiment,
            theme_ai_share_pct_day: share_pct(themed, n),
        },
        scorer_failures,
    }
}

/// Rounded mean score over the texts the scorer accepted, and the failure count.
fn mean_sentiment(texts: &[&str], scorer: &dyn SentimentScorer) -> (Option<f64>, usize) {
    if texts.is_empty() {
        return (None, 0);
    }

    let mut scores = Vec::with_capacity(texts.len());
    let mut failures = 0;
    for result in scorer.score_batch(texts) {
        match result {
            Ok(score) => scores.push(score),
            Err(e) => {
                debug!(scorer = scorer.name(), error = %e, "description not scored");
                failures += 1;
            }
        }
    }

    if scores.is_empty() {
        return (None, failures);
    }

    scores.sort_by(f64::total_cmp);
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    (Some(round_sentiment(mean)), failures)
}
