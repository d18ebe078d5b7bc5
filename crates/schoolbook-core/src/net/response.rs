//! Response envelopes.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use super::error::NetError;
use super::request::ResponseKind;

/// Payload carried by a response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    Text(String),
    Binary(Vec<u8>),
}

impl ResponseBody {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Binary(bytes) => bytes.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }
}

/// Outcome of a single transport call.
///
/// Always fully populated: failures produce a well-formed envelope with a
/// synthetic status instead of an error, so callers always have a value to
/// branch on.
#[derive(Debug, Clone)]
pub struct Response {
    /// Status in the 200-299 range
    pub ok: bool,
    pub status: u16,
    pub status_text: String,
    /// Raw response header lines, one `name: value` per line
    pub headers: String,
    pub body: Option<ResponseBody>,
    /// Echo of the kind the caller declared
    pub kind: ResponseKind,
}

impl Response {
    /// Envelope for a request that never produced a response. Carries no
    /// body so the decode path falls through to the cache.
    pub(crate) fn failure(error: &NetError, kind: ResponseKind) -> Self {
        Self {
            ok: false,
            status: 0,
            status_text: error.to_string(),
            headers: String::new(),
            body: None,
            kind,
        }
    }

    /// View the text payload as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let text = self
            .body
            .as_ref()
            .and_then(ResponseBody::as_text)
            .context("response has no text payload")?;
        serde_json::from_str(text).context("failed to parse response payload")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_accessor() {
        let response = Response {
            ok: true,
            status: 200,
            status_text: "OK".to_string(),
            headers: String::new(),
            body: Some(ResponseBody::Text(r#"{"objectId":"A1"}"#.to_string())),
            kind: ResponseKind::Json,
        };
        let value: serde_json::Value = response.json().expect("Failed to parse");
        assert_eq!(value["objectId"], "A1");
    }

    #[test]
    fn test_failure_envelope_is_fully_populated() {
        let response = Response::failure(&NetError::Timeout, ResponseKind::Json);
        assert!(!response.ok);
        assert_eq!(response.status, 0);
        assert_eq!(response.status_text, "request took longer than expected");
        assert!(response.body.is_none());
    }
}
