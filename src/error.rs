// src/error.rs

//! Unified error handling for the outage sync application.

use std::fmt;

use thiserror::Error;

/// Result type alias for application operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for a single API call.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Classified failure of one API call.
///
/// Every attempt made by the request executor ends in one of these; only
/// `BadRequest` and `Exhausted` are returned to callers, the others are
/// recorded as the last failure of an exhausted retry loop. `Encode` is
/// raised before any request is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Server answered 429
    #[error("rate limited")]
    RateLimited,

    /// Server answered 400, never retried
    #[error("bad request: {body}")]
    BadRequest { body: String },

    /// Server answered 5xx
    #[error("server error {status}: {body}")]
    ServerError { status: u16, body: String },

    /// Any other non-success status
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// Request did not complete within the configured timeout
    #[error("request timed out")]
    Timeout,

    /// Connection or protocol failure below HTTP
    #[error("transport error: {0}")]
    Transport(String),

    /// Success status with a body that is not the expected JSON
    #[error("invalid response body: {0}")]
    Decode(String),

    /// Request body could not be encoded, never sent
    #[error("could not encode request body: {0}")]
    Encode(String),

    /// All attempts used without success
    #[error("gave up after {attempts} attempt(s){}", last_suffix(.last))]
    Exhausted {
        attempts: u32,
        last: Option<Box<FetchError>>,
    },
}

fn last_suffix(last: &Option<Box<FetchError>>) -> String {
    match last {
        Some(err) => format!(", last error: {err}"),
        None => String::new(),
    }
}

impl FetchError {
    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::BadRequest { .. } | Self::Encode(_) | Self::Exhausted { .. }
        )
    }
}

/// Pipeline stage a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FetchOutages,
    FetchSiteInfo,
    PostOutages,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::FetchOutages => "fetching outages",
            Stage::FetchSiteInfo => "fetching site info",
            Stage::PostOutages => "posting site outages",
        };
        f.write_str(name)
    }
}

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization failed
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A pipeline stage failed
    #[error("Failed while {stage}: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: FetchError,
    },
}

impl AppError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Wrap a fetch failure with the stage it happened in.
    pub fn stage(stage: Stage, source: FetchError) -> Self {
        Self::Stage { stage, source }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Toml(_) => 2,
            Self::Stage { stage, .. } => match stage {
                Stage::FetchOutages => 3,
                Stage::FetchSiteInfo => 4,
                Stage::PostOutages => 5,
            },
            _ => 1,
        }
    }
}
