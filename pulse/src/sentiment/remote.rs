//! HTTP sentiment scoring service client.
//!
//! Protocol: `POST <endpoint>` with `{"texts": ["...", ...]}`, answered by
//! `{"scores": [0.1, ...]}` holding one score per text in request order.
//! A bearer token is sent when `PULSE_SCORER_TOKEN` is set.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use super::{check_range, SentimentScorer};
use crate::error::ScorerError;

/// Environment variable holding the service token.
pub const TOKEN_ENV: &str = "PULSE_SCORER_TOKEN";

/// Number of attempts per batch.
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Delay between retries in milliseconds.
const RETRY_DELAY_MS: u64 = 500;

#[derive(Debug, Serialize)]
struct ScoreRequest<'a> {
    texts: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct ScoreResponse {
    scores: Vec<f64>,
}

/// Blocking client for a remote scoring service.
#[derive(Debug, Clone)]
pub struct RemoteScorer {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl RemoteScorer {
    /// Create a client with an explicit endpoint and request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ScorerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ScorerError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token: None,
        })
    }

    /// Create a client, picking the token up from `PULSE_SCORER_TOKEN`.
    pub fn from_env(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ScorerError> {
        let scorer = Self::new(endpoint, timeout)?;
        Ok(match env::var(TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => scorer.with_token(token),
            _ => scorer,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Score a batch, retrying transport failures.
    fn request_with_retries(&self, texts: &[&str]) -> Result<Vec<f64>, ScorerError> {
        let mut last_error = None;

        for attempt in 1..=DEFAULT_MAX_RETRIES {
            match self.request(texts) {
                Ok(scores) => return Ok(scores),
                Err(e @ ScorerError::InvalidResponse(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        max = DEFAULT_MAX_RETRIES,
                        error = %e,
                        "scorer request failed"
                    );
                    last_error = Some(e);
                    if attempt < DEFAULT_MAX_RETRIES {
                        std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS));
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ScorerError::RequestFailed("no attempt made".into())))
    }

    /// Single request.
    fn request(&self, texts: &[&str]) -> Result<Vec<f64>, ScorerError> {
        let mut request = self.client.post(&self.endpoint).json(&ScoreRequest { texts });
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .map_err(|e| ScorerError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ScorerError::RequestFailed(e.to_string()))?;

        if !status.is_success() {
            return Err(ScorerError::RequestFailed(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        parse_scores(&body, texts.len())
    }
}

/// Decode a response body and check it carries one score per text.
fn parse_scores(body: &str, expected: usize) -> Result<Vec<f64>, ScorerError> {
    let response: ScoreResponse =
        serde_json::from_str(body).map_err(|e| ScorerError::InvalidResponse(e.to_string()))?;

    if response.scores.len() != expected {
        return Err(ScorerError::InvalidResponse(format!(
            "expected {} scores, got {}",
            expected,
            response.scores.len()
        )));
    }

    Ok(response.scores)
}

impl SentimentScorer for RemoteScorer {
    fn score(&self, text: &str) -> Result<f64, ScorerError> {
        let scores = self.request_with_retries(&[text])?;
        check_range(scores[0])
    }

    fn score_batch(&self, texts: &[&str]) -> Vec<Result<f64, ScorerError>> {
        if texts.is_empty() {
            return Vec::new();
        }

        match self.request_with_retries(texts) {
            Ok(scores) => scores.into_iter().map(check_range).collect(),
            Err(e) => texts.iter().map(|_| Err(e.clone())).collect(),
        }
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}
