//! Summarization client — one logical model call per ticket.
//!
//! Self-throttled to a requests-per-minute budget, measured from the previous
//! call's completion. Transient failures (rate limit, deadline, unavailable)
//! are retried with capped exponential backoff and jitter; anything else fails
//! immediately.
//!
//! States: Idle → RateLimitWait → Calling → {Success | BackoffWait → Calling | Failed}.

use std::time::{Duration, Instant};

use rand::Rng;
use serde::Deserialize;

use super::prompt::{self, SummaryRequest};
use crate::config::SummarizerConfig;
use crate::constants::{BASE_BACKOFF_SECS, JITTER_MAX, JITTER_MIN, MAX_BACKOFF_SECS};
use crate::time_utils;
use crate::{DigestError, DigestResult};

// ============================================================================
// FAILURE CLASSIFICATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Quota or rate limit exceeded (HTTP 429).
    RateLimited,
    /// Request deadline exceeded (timeouts, HTTP 408/504).
    DeadlineExceeded,
    /// Service temporarily unavailable (HTTP 503).
    Unavailable,
    Fatal,
}

impl FailureKind {
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Fatal)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::Unavailable => "unavailable",
            Self::Fatal => "fatal",
        }
    }

    pub fn from_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimited,
            408 | 504 => Self::DeadlineExceeded,
            503 => Self::Unavailable,
            _ => Self::Fatal,
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed model call, already classified.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct CallFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl CallFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Fatal, message)
    }
}

// ============================================================================
// MODEL SEAM
// ============================================================================

/// A text-in, text-out generative model.
pub trait GenerativeModel {
    fn name(&self) -> &str;
    fn generate(&self, prompt: &str) -> Result<String, CallFailure>;
}

/// Gemini `generateContent` over HTTPS.
pub struct GeminiModel {
    model: String,
    endpoint: String,
    api_key: String,
    agent: ureq::Agent,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiModel {
    pub fn from_config(cfg: &SummarizerConfig) -> DigestResult<Self> {
        let api_key = cfg.resolve_api_key().ok_or_else(|| {
            DigestError::Config(format!(
                "No API key: set summarizer.api_key or {}",
                crate::constants::API_KEY_ENV
            ))
        })?;
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(cfg.request_timeout_secs)))
            .build();
        tracing::info!(model = %cfg.model, "Gemini model configured");
        Ok(Self {
            model: cfg.model.clone(),
            endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
            api_key,
            agent: config.into(),
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

impl GenerativeModel for GeminiModel {
    fn name(&self) -> &str {
        &self.model
    }

    fn generate(&self, prompt: &str) -> Result<String, CallFailure> {
        let body = serde_json::json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}]
        });

        let mut response = self
            .agent
            .post(&self.url())
            .header("x-goog-api-key", &self.api_key)
            .send_json(&body)
            .map_err(classify_transport)?;

        let parsed: GenerateResponse = response
            .body_mut()
            .read_json()
            .map_err(|e| CallFailure::fatal(format!("Unreadable response: {}", e)))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect();

        if text.trim().is_empty() {
            return Err(CallFailure::fatal("Model returned empty response"));
        }
        Ok(text)
    }
}

fn classify_transport(err: ureq::Error) -> CallFailure {
    let kind = match &err {
        ureq::Error::StatusCode(status) => FailureKind::from_status(*status),
        ureq::Error::Timeout(_) => FailureKind::DeadlineExceeded,
        _ => FailureKind::Fatal,
    };
    CallFailure::new(kind, err.to_string())
}

// ============================================================================
// BACKOFF
// ============================================================================

#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub max: Duration,
    pub max_attempts: u32,
}

impl BackoffPolicy {
    /// Out-of-range durations fall back to the built-in defaults.
    pub fn from_config(cfg: &SummarizerConfig) -> Self {
        Self {
            base: secs_or_default("base_backoff_secs", cfg.base_backoff_secs, BASE_BACKOFF_SECS),
            max: secs_or_default("max_backoff_secs", cfg.max_backoff_secs, MAX_BACKOFF_SECS),
            max_attempts: cfg.max_attempts.max(1),
        }
    }

    /// `min(base * 2^attempt * jitter, max)`; `attempt` is zero-based.
    pub fn delay(&self, attempt: u32, jitter: f64) -> Duration {
        let exp = 2f64.powi(attempt.min(62) as i32);
        let secs = self.base.as_secs_f64() * exp * jitter.max(0.0);
        Duration::from_secs_f64(secs.min(self.max.as_secs_f64()))
    }
}

fn secs_or_default(key: &str, secs: f64, default: f64) -> Duration {
    match Duration::try_from_secs_f64(secs) {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!(key, value = secs, error = %e, "Invalid backoff duration, using default");
            Duration::from_secs_f64(default)
        }
    }
}

/// Uniform jitter factor in [0.8, 1.2].
pub fn sample_jitter() -> f64 {
    rand::rng().random_range(JITTER_MIN..=JITTER_MAX)
}

// ============================================================================
// CLIENT
// ============================================================================

/// Model output for one ticket.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub ticket_id: String,
    pub text: String,
    pub attempts: u32,
}

enum CallState {
    Idle,
    RateLimitWait(Duration),
    Calling { attempt: u32 },
    BackoffWait { attempt: u32, wait: Duration },
    Success { attempt: u32, text: String },
    Failed(DigestError),
}

pub struct SummarizationClient<M> {
    model: M,
    min_interval: Duration,
    backoff: BackoffPolicy,
    /// Completion time of the previous call. Per instance, never shared.
    last_call: Option<Instant>,
    sleeper: Box<dyn FnMut(Duration)>,
    jitter: Box<dyn FnMut() -> f64>,
}

impl<M: GenerativeModel> SummarizationClient<M> {
    pub fn new(model: M, cfg: &SummarizerConfig) -> Self {
        Self {
            model,
            min_interval: cfg.min_interval(),
            backoff: BackoffPolicy::from_config(cfg),
            last_call: None,
            sleeper: Box::new(std::thread::sleep),
            jitter: Box::new(sample_jitter),
        }
    }

    pub fn with_sleeper(mut self, sleeper: impl FnMut(Duration) + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn with_jitter(mut self, jitter: impl FnMut() -> f64 + 'static) -> Self {
        self.jitter = Box::new(jitter);
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Build the prompt for `request` and run it through the model.
    pub fn summarize(&mut self, request: &SummaryRequest) -> DigestResult<RawResponse> {
        let prompt = prompt::build_prompt(request, self.model.name(), time_utils::now());
        self.call(&request.ticket_id, &prompt)
    }

    /// Remaining wait before the next call may start.
    fn rate_limit_wait(&self) -> Duration {
        match self.last_call {
            Some(at) => self.min_interval.saturating_sub(at.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Run one logical call through the retry state machine.
    pub fn call(&mut self, ticket_id: &str, prompt: &str) -> DigestResult<RawResponse> {
        let max_attempts = self.backoff.max_attempts;
        let mut state = CallState::Idle;

        loop {
            state = match state {
                CallState::Idle => CallState::RateLimitWait(self.rate_limit_wait()),

                CallState::RateLimitWait(wait) => {
                    if !wait.is_zero() {
                        tracing::debug!(wait_secs = wait.as_secs_f64(), "Rate limit: waiting");
                        (self.sleeper)(wait);
                    }
                    CallState::Calling { attempt: 0 }
                }

                CallState::Calling { attempt } => {
                    tracing::info!(
                        ticket = %ticket_id,
                        attempt = attempt + 1,
                        max_attempts,
                        model = %self.model.name(),
                        "Calling summarization model"
                    );
                    let result = self.model.generate(prompt);
                    self.last_call = Some(Instant::now());

                    match result {
                        Ok(text) => CallState::Success { attempt, text },
                        Err(failure) if !failure.kind.is_transient() => {
                            tracing::error!(ticket = %ticket_id, error = %failure, "Model call failed");
                            CallState::Failed(DigestError::ExternalServiceFatal(failure))
                        }
                        Err(failure) if attempt + 1 >= max_attempts => {
                            tracing::error!(
                                ticket = %ticket_id,
                                attempts = attempt + 1,
                                error = %failure,
                                "Model call: all retries exhausted"
                            );
                            CallState::Failed(DigestError::ExternalService {
                                attempts: attempt + 1,
                                last: failure,
                            })
                        }
                        Err(failure) => {
                            let wait = self.backoff.delay(attempt, (self.jitter)());
                            tracing::warn!(
                                ticket = %ticket_id,
                                kind = %failure.kind,
                                attempt = attempt + 1,
                                max_attempts,
                                wait_secs = wait.as_secs_f64(),
                                "Transient model failure, backing off"
                            );
                            CallState::BackoffWait { attempt, wait }
                        }
                    }
                }

                CallState::BackoffWait { attempt, wait } => {
                    (self.sleeper)(wait);
                    CallState::Calling { attempt: attempt + 1 }
                }

                CallState::Success { attempt, text } => {
                    tracing::info!(ticket = %ticket_id, attempts = attempt + 1, "Summary generated");
                    return Ok(RawResponse {
                        ticket_id: ticket_id.to_string(),
                        text,
                        attempts: attempt + 1,
                    });
                }

                CallState::Failed(err) => return Err(err),
            };
        }
    }
}
