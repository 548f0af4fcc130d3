//! Utility functions and helpers.

pub mod http;
pub mod log;

/// Join an endpoint path onto the API base URL.
///
/// The base may carry a path prefix (`.../v1`), so this concatenates instead
/// of using URL resolution, which would drop the last segment.
pub fn endpoint_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}
