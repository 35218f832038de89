//! Backtest engine client.
//!
//! The engine is an external service: it takes a compiled payload and
//! answers with a status plus, on success, a performance summary. The
//! `BacktestEngine` trait abstracts over the transport so the submit path
//! can be exercised with a mock.

use std::time::Duration;

use cbtest_core::{CompileError, CompiledPayload};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::env::ApiConfig;
use crate::session::Credential;

/// Everything that can go wrong between "compile" and "result".
///
/// Only `Unauthorized` affects the session; every other failure leaves the
/// caller's state and credential untouched and resubmittable.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("invalid configuration: {0}")]
    Compile(#[from] CompileError),

    #[error("not signed in: session holds no credential")]
    NotAuthenticated,

    #[error("credential rejected by the server (401); sign in again")]
    Unauthorized,

    #[error("backtest failed ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("network error - please check your connection or try again later ({0})")]
    Transport(String),

    #[error("could not decode engine response: {0}")]
    Decode(String),

    #[error("a submission is already in flight")]
    AlreadyInFlight,
}

/// Successful engine answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineResult {
    pub message: Option<String>,
    /// Raw performance value as the engine sent it.
    pub performance: Value,
}

impl EngineResult {
    /// Typed view of a single-strategy summary, if the engine sent one.
    pub fn summary(&self) -> Option<PerformanceSummary> {
        PerformanceSummary::from_value(&self.performance)
    }
}

/// Headline metrics of one backtest. Missing fields read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceSummary {
    pub annual_return: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub win_rate: f64,
    pub trade_count: u64,
    pub avg_hold_days: f64,
}

impl PerformanceSummary {
    /// `None` unless `value` is an object carrying `annual_return`.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.get("annual_return")?;
        serde_json::from_value(value.clone()).ok()
    }
}

/// Wire shape of the engine's response body.
#[derive(Debug, Deserialize)]
struct ResponseBody {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, alias = "result")]
    performance: Option<Value>,
}

/// Anything that can run a compiled payload.
pub trait BacktestEngine: Send + Sync {
    fn submit(
        &self,
        payload: &CompiledPayload,
        credential: &Credential,
    ) -> Result<EngineResult, SubmitError>;
}

/// Map an HTTP status and body to a result.
///
/// - 401 → `Unauthorized`
/// - other non-2xx → `Rejected` with the server's `detail`/`message`/`error`
/// - 2xx with `status == "success"` → `EngineResult`
/// - 2xx otherwise → `Rejected` ("Generation failed" if no message)
pub fn interpret_response(status: u16, body: &str) -> Result<EngineResult, SubmitError> {
    if status == 401 {
        return Err(SubmitError::Unauthorized);
    }
    if !(200..300).contains(&status) {
        return Err(SubmitError::Rejected {
            status,
            message: error_message(body),
        });
    }

    let parsed: ResponseBody =
        serde_json::from_str(body).map_err(|e| SubmitError::Decode(e.to_string()))?;
    if parsed.status != "success" {
        return Err(SubmitError::Rejected {
            status,
            message: parsed
                .message
                .unwrap_or_else(|| "Generation failed".to_string()),
        });
    }
    Ok(EngineResult {
        message: parsed.message,
        performance: parsed.performance.unwrap_or(Value::Null),
    })
}

/// Best human-readable message in an error body.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        let trimmed = body.trim();
        return if trimmed.is_empty() {
            "no response body".to_string()
        } else {
            trimmed.to_string()
        };
    };
    for key in ["detail", "message", "error"] {
        match value.get(key) {
            Some(Value::String(s)) => return s.clone(),
            Some(other) if !other.is_null() => return other.to_string(),
            _ => {}
        }
    }
    value.to_string()
}

/// HTTP engine: `POST {api_url}/api/backtest` with a bearer token.
pub struct HttpEngine {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpEngine {
    pub fn new(config: &ApiConfig) -> Result<Self, SubmitError> {
        Self::with_timeout(config.backtest_endpoint(), config.timeout)
    }

    pub fn with_timeout(endpoint: String, timeout: Duration) -> Result<Self, SubmitError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SubmitError::Transport(e.to_string()))?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl BacktestEngine for HttpEngine {
    fn submit(
        &self,
        payload: &CompiledPayload,
        credential: &Credential,
    ) -> Result<EngineResult, SubmitError> {
        // Cache buster, as the browser client sends it.
        let stamp = chrono::Utc::now().timestamp_millis();
        let fingerprint = payload.fingerprint();
        info!(
            endpoint = %self.endpoint,
            fingerprint = fingerprint.short(),
            "submitting backtest"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("_t", stamp)])
            .bearer_auth(credential.secret())
            .json(payload)
            .send()
            .map_err(|e| SubmitError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| SubmitError::Transport(e.to_string()))?;
        debug!(status, bytes = body.len(), "engine responded");
        interpret_response(status, &body)
    }
}
