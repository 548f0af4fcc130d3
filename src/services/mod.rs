//! Service layer for the outage sync application.
//!
//! - `Transport` / `ReqwestTransport`: single HTTP exchanges
//! - `RequestExecutor`: retry and backoff around a transport
//! - `OutageApi`: named outage and site operations

pub mod api;
pub mod executor;
pub mod transport;

pub use api::OutageApi;
pub use executor::{RequestExecutor, RetryPolicy};
pub use transport::{ReqwestTransport, Sleeper, TokioSleeper, Transport};
