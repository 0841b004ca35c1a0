//! Word-polarity lexicon scorer.
//!
//! Each lexicon word found in the text contributes its polarity. A preceding
//! negation (`not`, `never`, `no`, `...n't`) flips and halves it; a preceding
//! intensifier multiplies it by 1.3. The score is the mean contribution,
//! clamped to [-1, 1], or 0.0 when no word matched.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use super::{check_range, SentimentScorer};
use crate::error::ScorerError;

static DEFAULT_LEXICON: Lazy<HashMap<String, f64>> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../data/sentiment-lexicon.json"))
        .expect("Invalid embedded sentiment lexicon")
});

const NEGATIONS: [&str; 5] = ["not", "no", "never", "without", "nothing"];

const INTENSIFIERS: [&str; 5] = ["very", "really", "extremely", "incredibly", "truly"];

const INTENSIFIER_WEIGHT: f64 = 1.3;

const NEGATION_WEIGHT: f64 = -0.5;

/// Local lexicon-based scorer.
#[derive(Debug, Clone)]
pub struct LexiconScorer {
    words: HashMap<String, f64>,
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self {
            words: DEFAULT_LEXICON.clone(),
        }
    }
}

impl LexiconScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default lexicon plus extra entries; extras override defaults.
    pub fn with_words(extra: impl IntoIterator<Item = (String, f64)>) -> Self {
        let mut scorer = Self::default();
        for (word, polarity) in extra {
            scorer.words.insert(word.trim().to_lowercase(), polarity);
        }
        scorer
    }

    fn polarity(&self, text: &str) -> f64 {
        let lowered = text.to_lowercase().replace('\u{2019}', "'");
        let mut contributions: Vec<f64> = Vec::new();
        let mut negated = false;
        let mut intensity = 1.0;

        for token in lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|t| !t.is_empty())
        {
            if NEGATIONS.contains(&token) || token.ends_with("n't") {
                negated = true;
                continue;
            }
            if INTENSIFIERS.contains(&token) {
                intensity = INTENSIFIER_WEIGHT;
                continue;
            }
            if let Some(polarity) = self.words.get(token) {
                let mut value = polarity * intensity;
                if negated {
                    value *= NEGATION_WEIGHT;
                }
                contributions.push(value);
                negated = false;
                intensity = 1.0;
            }
        }

        if contributions.is_empty() {
            return 0.0;
        }
        let mean = contributions.iter().sum::<f64>() / contributions.len() as f64;
        mean.clamp(-1.0, 1.0)
    }
}

impl SentimentScorer for LexiconScorer {
    fn score(&self, text: &str) -> Result<f64, ScorerError> {
        check_range(self.polarity(text))
    }

    fn name(&self) -> &'static str {
        "lexicon"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_and_negative() {
        let scorer = LexiconScorer::new();
        assert!(scorer.score("A warm, funny and talented lead").unwrap() > 0.0);
        assert!(scorer.score("A cruel and sinister villain").unwrap() < 0.0);
    }

    #[test]
    fn test_neutral_text_scores_zero() {
        let scorer = LexiconScorer::new();
        assert_eq!(scorer.score("Male, 30s, any ethnicity").unwrap(), 0.0);
        assert_eq!(scorer.score("").unwrap(), 0.0);
    }

    #[test]
    fn test_negation_flips_and_halves() {
        let scorer = LexiconScorer::with_words(vec![("kind".to_string(), 0.6)]);
        assert_eq!(scorer.score("kind").unwrap(), 0.6);
        assert_eq!(scorer.score("not kind").unwrap(), -0.3);
        assert_eq!(scorer.score("isn't kind").unwrap(), -0.3);
    }

    #[test]
    fn test_intensifier_is_clamped() {
        let scorer = LexiconScorer::new();
        // 1.0 * 1.3 is clamped back into range
        assert_eq!(scorer.score("very perfect").unwrap(), 1.0);
    }

    #[test]
    fn test_extra_words_override() {
        let scorer = LexiconScorer::with_words(vec![("Gritty".to_string(), -0.2)]);
        assert_eq!(scorer.score("a gritty role").unwrap(), -0.2);
    }

    #[test]
    fn test_same_text_same_score() {
        let scorer = LexiconScorer::new();
        let text = "A hopeful but lonely android";
        assert_eq!(scorer.score(text).unwrap(), scorer.score(text).unwrap());
    }
}
