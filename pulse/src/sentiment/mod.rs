//! Sentiment scoring collaborators.
//!
//! The aggregator only sees [`SentimentScorer`]: `text -> score in [-1, 1]`.
//! Two implementations ship with the crate:
//!
//! - [`LexiconScorer`] - local word-polarity lexicon (default)
//! - [`RemoteScorer`] - HTTP scoring service, one request per batch
//!
//! [`MemoScorer`] wraps either so a description is scored once per run and
//! always gets the same answer.

pub mod lexicon;
pub mod remote;

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::ScorerConfig;
use crate::error::ScorerError;

pub use lexicon::LexiconScorer;
pub use remote::RemoteScorer;

/// A sentiment model.
pub trait SentimentScorer {
    /// Score one text. `Ok` values are always within [-1, 1].
    fn score(&self, text: &str) -> Result<f64, ScorerError>;

    /// Score several texts; one result per input, in order.
    fn score_batch(&self, texts: &[&str]) -> Vec<Result<f64, ScorerError>> {
        texts.iter().map(|t| self.score(t)).collect()
    }

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

impl<S: SentimentScorer + ?Sized> SentimentScorer for Box<S> {
    fn score(&self, text: &str) -> Result<f64, ScorerError> {
        (**self).score(text)
    }

    fn score_batch(&self, texts: &[&str]) -> Vec<Result<f64, ScorerError>> {
        (**self).score_batch(texts)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

impl<S: SentimentScorer + ?Sized> SentimentScorer for &S {
    fn score(&self, text: &str) -> Result<f64, ScorerError> {
        (**self).score(text)
    }

    fn score_batch(&self, texts: &[&str]) -> Vec<Result<f64, ScorerError>> {
        (**self).score_batch(texts)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Reject non-finite or out-of-range scores.
pub fn check_range(score: f64) -> Result<f64, ScorerError> {
    if score.is_finite() && (-1.0..=1.0).contains(&score) {
        Ok(score)
    } else {
        Err(ScorerError::OutOfRange(score))
    }
}

/// Build the scorer described by the configuration.
pub fn build_scorer(config: &ScorerConfig) -> Result<Box<dyn SentimentScorer>, ScorerError> {
    match config {
        ScorerConfig::Lexicon { extra_words } => Ok(Box::new(LexiconScorer::with_words(
            extra_words.iter().map(|(w, p)| (w.clone(), *p)),
        ))),
        ScorerConfig::Remote { endpoint, timeout_secs } => Ok(Box::new(RemoteScorer::from_env(
            endpoint.clone(),
            Duration::from_secs(*timeout_secs),
        )?)),
    }
}

/// Caches results per exact text for the lifetime of the wrapper.
///
/// Failures are cached too, so a description that failed once is treated
/// as missing everywhere it appears.
pub struct MemoScorer<S> {
    inner: S,
    cache: RefCell<HashMap<String, Result<f64, ScorerError>>>,
}

impl<S: SentimentScorer> MemoScorer<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Number of distinct texts seen.
    pub fn cached(&self) -> usize {
        self.cache.borrow().len()
    }
}

impl<S: SentimentScorer> SentimentScorer for MemoScorer<S> {
    fn score(&self, text: &str) -> Result<f64, ScorerError> {
        if let Some(hit) = self.cache.borrow().get(text) {
            return hit.clone();
        }
        let result = self.inner.score(text);
        self.cache.borrow_mut().insert(text.to_string(), result.clone());
        result
    }

    fn score_batch(&self, texts: &[&str]) -> Vec<Result<f64, ScorerError>> {
        let mut missing: Vec<&str> = Vec::new();
        {
            let cache = self.cache.borrow();
            for text in texts {
                if !cache.contains_key(*text) && !missing.contains(text) {
                    missing.push(*text);
                }
            }
        }

        if !missing.is_empty() {
            let fresh = self.inner.score_batch(&missing);
            let mut cache = self.cache.borrow_mut();
            for (text, result) in missing.iter().zip(fresh) {
                cache.insert(text.to_string(), result);
            }
        }

        let cache = self.cache.borrow();
        texts
            .iter()
            .map(|t| {
                cache.get(*t).cloned().unwrap_or_else(|| {
                    Err(ScorerError::InvalidResponse("missing batch result".into()))
                })
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
