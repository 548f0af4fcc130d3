//! Resilient request executor.
//!
//! Issues one API call with exponential backoff on rate limiting and
//! log-and-retry on transient failures. A 400 ends the call without retrying.

use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{FetchError, FetchResult, Result};
use crate::models::{Config, RetryConfig};
use crate::services::transport::{
    ApiRequest, ApiResponse, ReqwestTransport, Sleeper, TokioSleeper, Transport, TransportError,
};

/// Attempt budget and backoff base for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per call, including the first
    pub max_retries: u32,

    /// Delay after the first rate-limited attempt
    pub backoff_base: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_base: Duration) -> Self {
        Self {
            max_retries,
            backoff_base,
        }
    }

    /// Backoff after a rate-limited attempt: `backoff_base * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(500))
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, config.backoff_base())
    }
}

/// Executes API calls against a transport with retry and backoff.
pub struct RequestExecutor {
    transport: Box<dyn Transport>,
    sleeper: Box<dyn Sleeper>,
    policy: RetryPolicy,
}

impl RequestExecutor {
    /// Create an executor that sleeps on the tokio timer.
    pub fn new(transport: impl Transport + 'static, policy: RetryPolicy) -> Self {
        Self {
            transport: Box::new(transport),
            sleeper: Box::new(TokioSleeper),
            policy,
        }
    }

    /// Create an executor talking to the configured API over HTTP.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(&config.api)?;
        Ok(Self::new(transport, RetryPolicy::from(&config.retry)))
    }

    /// Replace the sleeper used for backoff.
    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    /// Execute a call with the executor's default retry policy.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> FetchResult<T> {
        self.execute_with(method, endpoint, body, &self.policy).await
    }

    /// Execute a call with an explicit retry policy.
    pub async fn execute_with<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        policy: &RetryPolicy,
    ) -> FetchResult<T> {
        let request = ApiRequest {
            method,
            endpoint,
            body,
        };
        let mut last = None;

        for attempt in 0..policy.max_retries {
            log::debug!(
                "{} {} (attempt {}/{})",
                request.method,
                endpoint,
                attempt + 1,
                policy.max_retries
            );

            let failure = match self.transport.send(&request).await {
                Ok(response) if response.is_success() => match decode::<T>(&response.body) {
                    Ok(value) => return Ok(value),
                    Err(e) => FetchError::Decode(format!("{e}; body: {}", response.body)),
                },
                Ok(response) => classify(response),
                Err(TransportError::Timeout) => FetchError::Timeout,
                Err(TransportError::Other(message)) => FetchError::Transport(message),
            };

            log_failure(&request, &failure);

            if failure == FetchError::RateLimited {
                let wait = policy.delay_for(attempt);
                log::warn!(
                    "Rate limit reached. Waiting for {:.3} seconds and retrying...",
                    wait.as_secs_f64()
                );
                self.sleeper.sleep(wait).await;
            } else if !failure.is_retryable() {
                return Err(failure);
            }

            last = Some(Box::new(failure));
        }

        Err(FetchError::Exhausted {
            attempts: policy.max_retries,
            last,
        })
    }
}

/// Decode a success body; an empty body reads as JSON `null`.
fn decode<T: DeserializeOwned>(body: &str) -> serde_json::Result<T> {
    if body.trim().is_empty() {
        serde_json::from_value(Value::Null)
    } else {
        serde_json::from_str(body)
    }
}

/// Classify a non-success response.
fn classify(response: ApiResponse) -> FetchError {
    match response.status {
        429 => FetchError::RateLimited,
        400 => FetchError::BadRequest {
            body: response.body,
        },
        status @ 500..=599 => FetchError::ServerError {
            status,
            body: response.body,
        },
        status => FetchError::Status {
            status,
            body: response.body,
        },
    }
}

fn log_failure(request: &ApiRequest<'_>, failure: &FetchError) {
    let target = format!("{} {}", request.method, request.endpoint);
    match failure {
        // Logged with the wait time by the caller
        FetchError::RateLimited => {}
        FetchError::BadRequest { body } => {
            log::error!("Bad Request on {}. Server Response: {}", target, body)
        }
        FetchError::ServerError { status: 500, .. } => log::error!(
            "Internal Server Error on {}. Please check with the API server maintainers.",
            target
        ),
        FetchError::ServerError { status, body } | FetchError::Status { status, body } => {
            log::error!("HTTP error {} occurred on {}: {}", status, target, body)
        }
        FetchError::Timeout => log::error!("Request to {} timed out.", target),
        FetchError::Transport(message) => log::error!("Request error on {}: {}", target, message),
        FetchError::Decode(message) => {
            log::error!("Invalid JSON in response to {}: {}", target, message)
        }
        FetchError::Encode(_) | FetchError::Exhausted { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingSleeper, ScriptedTransport};
    use serde_json::json;

    fn executor(transport: &ScriptedTransport, sleeper: &RecordingSleeper) -> RequestExecutor {
        RequestExecutor::new(transport.clone(), RetryPolicy::default()).with_sleeper(sleeper.clone())
    }

    #[test]
    fn test_delay_doubles_per_attempt() {
        let policy = RetryPolicy::default();
        let delays: Vec<_> = (0..5).map(|i| policy.delay_for(i)).collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(500),
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8),
            ]
        );
    }

    #[test]
    fn test_delay_saturates() {
        let policy = RetryPolicy::new(100, Duration::from_secs(1));
        assert_eq!(policy.delay_for(90), Duration::from_secs(u64::from(u32::MAX)));
    }

    #[tokio::test]
    async fn test_rate_limited_then_success() {
        let transport = ScriptedTransport::new()
            .respond(429, "")
            .respond(429, "")
            .respond(429, "")
            .respond(200, r#"{"ok": true}"#);
        let sleeper = RecordingSleeper::default();

        let value: Value = executor(&transport, &sleeper)
            .execute(Method::GET, "/outages", None)
            .await
            .unwrap();

        assert_eq!(value, json!({ "ok": true }));
        assert_eq!(transport.request_count(), 4);
        assert_eq!(
            sleeper.sleeps(),
            vec![
                Duration::from_millis(500),
                Duration::from_secs(1),
                Duration::from_secs(2),
            ]
        );
    }

    #[tokio::test]
    async fn test_bad_request_is_not_retried() {
        let transport = ScriptedTransport::new()
            .respond(400, "missing field")
            .respond(200, "[]");
        let sleeper = RecordingSleeper::default();

        let result: FetchResult<Value> = executor(&transport, &sleeper)
            .execute(Method::GET, "/outages", None)
            .await;

        assert_eq!(
            result,
            Err(FetchError::BadRequest {
                body: "missing field".to_string()
            })
        );
        assert_eq!(transport.request_count(), 1);
        assert!(sleeper.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_timeouts_exhaust_retries() {
        let transport = ScriptedTransport::new().fallback_timeout();
        let sleeper = RecordingSleeper::default();

        let result: FetchResult<Value> = executor(&transport, &sleeper)
            .execute(Method::GET, "/outages", None)
            .await;

        assert_eq!(
            result,
            Err(FetchError::Exhausted {
                attempts: 5,
                last: Some(Box::new(FetchError::Timeout)),
            })
        );
        assert_eq!(transport.request_count(), 5);
        assert!(sleeper.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_server_errors_retry_without_sleep() {
        let transport = ScriptedTransport::new()
            .respond(500, "boom")
            .respond(503, "busy")
            .respond(404, "gone")
            .transport_error("connection reset")
            .respond(200, "[1]");
        let sleeper = RecordingSleeper::default();

        let value: Vec<u32> = executor(&transport, &sleeper)
            .execute(Method::GET, "/outages", None)
            .await
            .unwrap();

        assert_eq!(value, vec![1]);
        assert_eq!(transport.request_count(), 5);
        assert!(sleeper.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_exhausted_keeps_last_failure() {
        let transport = ScriptedTransport::new()
            .respond(500, "a")
            .respond(502, "b");
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy::new(2, Duration::from_millis(1));

        let result: FetchResult<Value> = executor(&transport, &sleeper)
            .execute_with(Method::GET, "/outages", None, &policy)
            .await;

        assert_eq!(
            result,
            Err(FetchError::Exhausted {
                attempts: 2,
                last: Some(Box::new(FetchError::ServerError {
                    status: 502,
                    body: "b".to_string()
                })),
            })
        );
    }

    #[tokio::test]
    async fn test_invalid_json_is_retried() {
        let transport = ScriptedTransport::new()
            .respond(200, "<html>")
            .respond(200, r#"{"devices": []}"#);
        let sleeper = RecordingSleeper::default();

        let value: Value = executor(&transport, &sleeper)
            .execute(Method::GET, "/site-info/x", None)
            .await
            .unwrap();

        assert_eq!(value, json!({ "devices": [] }));
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_success_body_is_null() {
        let transport = ScriptedTransport::new().respond(200, "");
        let sleeper = RecordingSleeper::default();

        let value: Value = executor(&transport, &sleeper)
            .execute(Method::POST, "/site-outages/x", Some(&json!([])))
            .await
            .unwrap();

        assert_eq!(value, Value::Null);
    }

    #[tokio::test]
    async fn test_zero_attempts_sends_nothing() {
        let transport = ScriptedTransport::new().respond(200, "{}");
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy::new(0, Duration::from_millis(1));

        let result: FetchResult<Value> = executor(&transport, &sleeper)
            .execute_with(Method::GET, "/outages", None, &policy)
            .await;

        assert_eq!(
            result,
            Err(FetchError::Exhausted {
                attempts: 0,
                last: None
            })
        );
        assert_eq!(transport.request_count(), 0);
    }
}
