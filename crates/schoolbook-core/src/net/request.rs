//! Request descriptors and per-call options.

use std::time::Duration;

use serde_json::{Map, Value};

/// Default per-request timeout.
/// Requests with `timeout: None` wait indefinitely instead.
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How a response body should be interpreted once received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseKind {
    /// Plain text, returned as-is
    Text,
    /// JSON payload, parsed and list-unwrapped
    #[default]
    Json,
    /// Raw bytes, cached as base64 text
    Binary,
}

/// Parameters describing a single backend request. Immutable per call.
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    pub url: String,
    /// Equality conditions or plain query values, keyed by field name
    pub query_params: Option<Map<String, Value>>,
    /// Collapse the whole mapping into one JSON-serialized `where` parameter
    /// instead of individual percent-encoded pairs
    pub where_query: bool,
    /// Comma-separated relation names for the backend to inline
    pub include: Option<String>,
    /// JSON body for write requests
    pub body: Option<Value>,
}

impl RequestParams {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// Per-call transport configuration.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Ask intermediaries not to serve a stale copy (`Cache-Control: no-cache`)
    pub ignore_cache: bool,
    /// Extra headers merged over the standard auth headers
    pub headers: Vec<(String, String)>,
    /// `None` waits indefinitely
    pub timeout: Option<Duration>,
    pub kind: ResponseKind,
    /// Attach the cached session token. Off only for login, where no
    /// session exists yet.
    pub attach_session: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            ignore_cache: false,
            headers: Vec::new(),
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            kind: ResponseKind::Json,
            attach_session: true,
        }
    }
}

impl RequestOptions {
    /// Map the backend convention of "non-positive waits forever" onto the
    /// `Option` representation used here.
    pub fn timeout_from_millis(millis: i64) -> Option<Duration> {
        (millis > 0).then(|| Duration::from_millis(millis as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_from_millis() {
        assert_eq!(
            RequestOptions::timeout_from_millis(1500),
            Some(Duration::from_millis(1500))
        );
        assert_eq!(RequestOptions::timeout_from_millis(0), None);
        assert_eq!(RequestOptions::timeout_from_millis(-1), None);
    }
}
