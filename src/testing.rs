//! Test doubles for the transport and sleeper seams.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::services::transport::{ApiRequest, ApiResponse, Sleeper, Transport, TransportError};

type Reply = Result<ApiResponse, TransportError>;

/// A request as seen by [`ScriptedTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub endpoint: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct Script {
    replies: VecDeque<Reply>,
    fallback: Option<Reply>,
    requests: Vec<RecordedRequest>,
}

/// Replays queued replies in order and records every request.
///
/// Once the queue is empty the fallback reply is repeated; without one the
/// transport reports a connection error.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: impl Into<String>) -> Self {
        self.push(Ok(ApiResponse::new(status, body)))
    }

    pub fn respond_json(self, status: u16, body: &Value) -> Self {
        self.respond(status, body.to_string())
    }

    pub fn timeout(self) -> Self {
        self.push(Err(TransportError::Timeout))
    }

    pub fn transport_error(self, message: &str) -> Self {
        self.push(Err(TransportError::Other(message.to_string())))
    }

    pub fn fallback_timeout(self) -> Self {
        self.script.lock().unwrap().fallback = Some(Err(TransportError::Timeout));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.script.lock().unwrap().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.script.lock().unwrap().requests.len()
    }

    fn push(self, reply: Reply) -> Self {
        self.script.lock().unwrap().replies.push_back(reply);
        self
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest<'_>) -> Result<ApiResponse, TransportError> {
        let mut script = self.script.lock().unwrap();
        script.requests.push(RecordedRequest {
            method: request.method.clone(),
            endpoint: request.endpoint.to_string(),
            body: request.carries_body().then(|| request.body.cloned()).flatten(),
        });

        match script.replies.pop_front() {
            Some(reply) => reply,
            None => script
                .fallback
                .clone()
                .unwrap_or_else(|| Err(TransportError::Other("no scripted reply".to_string()))),
        }
    }
}

/// Records requested sleeps without waiting.
#[derive(Clone, Default)]
pub struct RecordingSleeper {
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}
