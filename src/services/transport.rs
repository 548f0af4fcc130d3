//! Transport abstraction between the request executor and the network.
//!
//! `ReqwestTransport` is the production implementation; tests substitute a
//! scripted one so retry behavior can be checked without a server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;

use crate::error::Result;
use crate::models::ApiConfig;
use crate::utils::endpoint_url;
use crate::utils::http::create_async_client;

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "x-api-key";

/// One outgoing API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest<'a> {
    pub method: Method,
    pub endpoint: &'a str,
    pub body: Option<&'a Value>,
}

impl ApiRequest<'_> {
    /// Whether the body should be sent for this method.
    pub fn carries_body(&self) -> bool {
        self.body.is_some() && !matches!(self.method, Method::GET | Method::HEAD)
    }
}

/// Raw status and body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure before an HTTP status was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    Timeout,
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

/// Sends a single request; no retries happen at this level.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest<'_>) -> std::result::Result<ApiResponse, TransportError>;
}

/// Suspends between retry attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// HTTP transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ReqwestTransport {
    /// Build a transport with its own client from the API settings.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = create_async_client(config)?;
        Ok(Self::with_client(client, config))
    }

    /// Build a transport around an existing client.
    pub fn with_client(client: Client, config: &ApiConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest<'_>) -> std::result::Result<ApiResponse, TransportError> {
        let url = endpoint_url(&self.base_url, request.endpoint);
        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .header(API_KEY_HEADER, &self.api_key);

        if request.carries_body() {
            if let Some(body) = request.body {
                builder = builder.json(body);
            }
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(ApiResponse { status, body })
    }
}
