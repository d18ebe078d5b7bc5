//! Transport client for the Parse REST backend.
//!
//! This module provides the `NetClient` struct for executing backend
//! requests and applying the decode-and-cache policy. It is the single
//! point of contact with both the network and the persistent cache.

use anyhow::Result;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::{header, Client, Method};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::cache::{keys, CacheStore};
use crate::config::Config;

use super::error::NetError;
use super::request::{RequestOptions, RequestParams, ResponseKind};
use super::response::{Response, ResponseBody};

// ============================================================================
// Constants
// ============================================================================

/// Application identity header
const APP_ID_HEADER: &str = "x-parse-application-id";

/// REST API key header
const REST_KEY_HEADER: &str = "x-parse-rest-api-key";

/// Session token header, attached once a user is cached
const SESSION_HEADER: &str = "x-parse-session-token";

/// Query parameter carrying a JSON-collapsed filter
const WHERE_PARAM: &str = "where";

/// Query parameter naming relations the backend should inline
const INCLUDE_PARAM: &str = "include";

/// Field wrapping list-query results in the backend's response envelope
const RESULTS_FIELD: &str = "results";

/// Transport client for the backend.
///
/// Executes requests and owns the cache store that failure paths fall back
/// to. The underlying `reqwest::Client` is built once without a default
/// timeout so that a per-request timeout of `None` genuinely waits forever.
pub struct NetClient {
    http: Client,
    config: Config,
    cache: CacheStore,
}

impl NetClient {
    pub fn new(config: Config, cache: CacheStore) -> Result<Self> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            config,
            cache,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The persistent store behind the offline fallback and the
    /// synchronous `cached_*` accessors.
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    // ===== URL construction =====

    /// Append the query parameters and eager-load hint to `base`.
    ///
    /// With `where_query` set, the whole mapping is JSON-serialized into a
    /// single `where` parameter; otherwise each entry becomes an
    /// individually percent-encoded `key=value` pair. Returns `base`
    /// unchanged when there is nothing to append.
    pub fn build_request_url(
        base: &str,
        params: Option<&Map<String, Value>>,
        where_query: bool,
        include: Option<&str>,
    ) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        let mut has_pairs = false;

        if let Some(params) = params {
            if where_query {
                let filter = Value::Object(params.clone()).to_string();
                query.append_pair(WHERE_PARAM, &filter);
                has_pairs = true;
            } else {
                for (key, value) in params {
                    query.append_pair(key, &scalar_text(value));
                    has_pairs = true;
                }
            }
        }

        if let Some(include) = include {
            query.append_pair(INCLUDE_PARAM, include);
            has_pairs = true;
        }

        if !has_pairs {
            return base.to_string();
        }

        let sep = if base.contains('?') { '&' } else { '?' };
        format!("{}{}{}", base, sep, query.finish())
    }

    // ===== Auth headers =====

    /// Standard headers for an outgoing call: application identity, REST
    /// API key, and - unless this is the login call - the cached user's
    /// session token.
    fn auth_headers(&self, attach_session: bool) -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let identity = [
            (APP_ID_HEADER, &self.config.application_id),
            (REST_KEY_HEADER, &self.config.rest_api_key),
        ];
        for (name, value) in identity {
            if value.is_empty() {
                continue;
            }
            match header::HeaderValue::from_str(value) {
                Ok(value) => {
                    headers.insert(name, value);
                }
                Err(err) => warn!(header = name, error = %err, "skipping invalid header value"),
            }
        }

        if attach_session {
            if let Some(token) = self.session_token() {
                match header::HeaderValue::from_str(&token) {
                    Ok(value) => {
                        headers.insert(SESSION_HEADER, value);
                    }
                    Err(err) => warn!(error = %err, "skipping invalid session token"),
                }
            }
        }

        headers
    }

    fn session_token(&self) -> Option<String> {
        let user = self.cache.get(keys::LOGGED_IN_USER)?;
        user.get("sessionToken")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    // ===== Execution =====

    /// Issue the HTTP call and fold every outcome into one envelope.
    ///
    /// Exactly one of three terminal events produces it: a loaded
    /// response, a network error, or a timeout. The latter two yield a
    /// failure envelope with no body, so the decode path falls back to the
    /// cache. There are no retries and no cancellation: an issued request
    /// runs to completion, error, or timeout.
    pub async fn execute(
        &self,
        method: Method,
        params: &RequestParams,
        options: &RequestOptions,
    ) -> Response {
        let url = Self::build_request_url(
            &params.url,
            params.query_params.as_ref(),
            params.where_query,
            params.include.as_deref(),
        );

        let is_write = method == Method::POST;
        let mut request = self
            .http
            .request(method, &url)
            .headers(self.auth_headers(options.attach_session));

        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if options.ignore_cache {
            request = request.header(header::CACHE_CONTROL, "no-cache");
        }
        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }
        if is_write {
            if let Some(body) = &params.body {
                request = request.json(body);
            }
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                let err = NetError::classify(err);
                warn!(url = %url, error = %err, "request failed");
                return Response::failure(&err, options.kind);
            }
        };

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let headers = header_blob(response.headers());

        let body = if options.kind == ResponseKind::Binary {
            match response.bytes().await {
                Ok(bytes) if !bytes.is_empty() => Some(ResponseBody::Binary(bytes.to_vec())),
                Ok(_) => None,
                Err(err) => {
                    let err = NetError::classify(err);
                    warn!(url = %url, error = %err, "failed to read response body");
                    return Response::failure(&err, options.kind);
                }
            }
        } else {
            match response.text().await {
                Ok(text) if !text.is_empty() => Some(ResponseBody::Text(text)),
                Ok(_) => None,
                Err(err) => {
                    let err = NetError::classify(err);
                    warn!(url = %url, error = %err, "failed to read response body");
                    return Response::failure(&err, options.kind);
                }
            }
        };

        Response {
            ok: status.is_success(),
            status: status.as_u16(),
            status_text,
            headers,
            body,
            kind: options.kind,
        }
    }

    // ===== Decoding and caching =====

    /// Turn an envelope into a plain decoded value, applying the cache
    /// policy. Value-returning, never a thrown failure:
    ///
    /// 1. No payload: return the previously stored value for the cache
    ///    key, if any (the offline fallback path).
    /// 2. JSON payload: parse, unwrap the backend's `{"results": [...]}`
    ///    list envelope, store under the key, return.
    /// 3. Binary payload: base64-encode, store, return.
    /// 4. Any decode error becomes "no result".
    pub fn decode_and_cache(&self, response: &Response, cache_key: Option<&str>) -> Option<Value> {
        let body = match &response.body {
            Some(body) if !body.is_empty() => body,
            _ => {
                if let Some(key) = cache_key {
                    debug!(key, "no payload; falling back to cache");
                }
                return cache_key.and_then(|key| self.cache.get(key));
            }
        };

        match (response.kind, body) {
            (ResponseKind::Json, ResponseBody::Text(text)) => {
                let decoded: Value = match serde_json::from_str(text) {
                    Ok(value) => value,
                    Err(err) => {
                        debug!(error = %err, "discarding payload that failed to parse");
                        return None;
                    }
                };
                let decoded = unwrap_results(decoded);
                self.store(cache_key, &decoded);
                Some(decoded)
            }
            (ResponseKind::Binary, ResponseBody::Binary(bytes)) => {
                let encoded = Value::String(BASE64.encode(bytes));
                self.store(cache_key, &encoded);
                Some(encoded)
            }
            (ResponseKind::Text, ResponseBody::Text(text)) => {
                let value = Value::String(text.clone());
                self.store(cache_key, &value);
                Some(value)
            }
            (kind, _) => {
                debug!(?kind, "payload does not match the declared kind");
                None
            }
        }
    }

    /// GET composed with the decode-and-cache policy.
    pub async fn get(
        &self,
        params: &RequestParams,
        cache_key: Option<&str>,
        options: &RequestOptions,
    ) -> Option<Value> {
        let response = self.execute(Method::GET, params, options).await;
        self.decode_and_cache(&response, cache_key)
    }

    fn store(&self, cache_key: Option<&str>, value: &Value) {
        if let Some(key) = cache_key {
            if let Err(err) = self.cache.put(key, value) {
                warn!(key, error = %err, "failed to write cache entry");
            }
        }
    }
}

/// Scalar text for a plain (non-filter) query value. Strings are used
/// verbatim; everything else is JSON-rendered.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Unwrap the backend's list-query envelope convention.
fn unwrap_results(value: Value) -> Value {
    match value {
        Value::Object(mut map) if matches!(map.get(RESULTS_FIELD), Some(Value::Array(_))) => {
            map.remove(RESULTS_FIELD).unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn header_blob(headers: &header::HeaderMap) -> String {
    let mut blob = String::new();
    for (name, value) in headers {
        blob.push_str(name.as_str());
        blob.push_str(": ");
        blob.push_str(value.to_str().unwrap_or_default());
        blob.push('\n');
    }
    blob
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;

    fn test_client() -> (NetClient, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let cache = CacheStore::open(dir.path().to_path_buf()).expect("Failed to open store");
        let config = Config {
            server_url: "http://127.0.0.1:9".to_string(),
            application_id: "test-app".to_string(),
            rest_api_key: "test-key".to_string(),
            ..Config::default()
        };
        let client = NetClient::new(config, cache).expect("Failed to build client");
        (client, dir)
    }

    fn json_envelope(text: &str) -> Response {
        Response {
            ok: true,
            status: 200,
            status_text: "OK".to_string(),
            headers: String::new(),
            body: Some(ResponseBody::Text(text.to_string())),
            kind: ResponseKind::Json,
        }
    }

    fn query_of(url: &str) -> &str {
        url.split_once('?').map(|(_, q)| q).unwrap_or("")
    }

    #[test]
    fn test_where_mode_round_trips_the_mapping() {
        let mut params = Map::new();
        params.insert(
            "user".to_string(),
            json!({"__type": "Pointer", "className": "_User", "objectId": "U1"}),
        );
        params.insert("active".to_string(), json!(true));

        let url = NetClient::build_request_url(
            "http://x/classes/Connection",
            Some(&params),
            true,
            None,
        );

        let pairs: Vec<(String, String)> = form_urlencoded::parse(query_of(&url).as_bytes())
            .into_owned()
            .collect();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0, "where");

        let filter: Value = serde_json::from_str(&pairs[0].1).expect("Failed to parse filter");
        assert_eq!(filter, Value::Object(params));
    }

    #[test]
    fn test_plain_mode_encodes_each_pair_exactly_once() {
        let mut params = Map::new();
        params.insert("username".to_string(), json!("amy jones"));
        params.insert("password".to_string(), json!("p@ss w&rd=1"));

        let url = NetClient::build_request_url("http://x/login", Some(&params), false, None);

        let pairs: BTreeMap<String, String> = form_urlencoded::parse(query_of(&url).as_bytes())
            .into_owned()
            .collect();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs["username"], "amy jones");
        assert_eq!(pairs["password"], "p@ss w&rd=1");
        // Raw reserved characters never appear unescaped in the query.
        assert!(!query_of(&url).contains('@'));
        assert!(!query_of(&url).contains(' '));
    }

    #[test]
    fn test_separator_depends_on_existing_query() {
        let mut params = Map::new();
        params.insert("a".to_string(), json!("1"));

        let plain = NetClient::build_request_url("http://x/r", Some(&params), false, None);
        assert!(plain.starts_with("http://x/r?"));

        let extended = NetClient::build_request_url("http://x/r?limit=5", Some(&params), false, None);
        assert!(extended.starts_with("http://x/r?limit=5&"));
    }

    #[test]
    fn test_absent_params_leave_base_unchanged() {
        assert_eq!(
            NetClient::build_request_url("http://x/r", None, false, None),
            "http://x/r"
        );
        let empty = Map::new();
        assert_eq!(
            NetClient::build_request_url("http://x/r", Some(&empty), false, None),
            "http://x/r"
        );
    }

    #[test]
    fn test_include_hint_is_its_own_parameter() {
        let url = NetClient::build_request_url("http://x/r", None, false, Some("school,school.user"));
        let pairs: Vec<(String, String)> = form_urlencoded::parse(query_of(&url).as_bytes())
            .into_owned()
            .collect();
        assert_eq!(pairs, vec![("include".to_string(), "school,school.user".to_string())]);
    }

    #[test]
    fn test_decode_unwraps_the_results_envelope() {
        let (client, _dir) = test_client();
        let envelope = json_envelope(r#"{"results":[{"objectId":"A"},{"objectId":"B"}]}"#);

        let decoded = client.decode_and_cache(&envelope, None).expect("No result");
        assert_eq!(decoded, json!([{"objectId": "A"}, {"objectId": "B"}]));
    }

    #[test]
    fn test_decode_unwraps_an_empty_results_list() {
        let (client, _dir) = test_client();
        let envelope = json_envelope(r#"{"results":[]}"#);
        assert_eq!(client.decode_and_cache(&envelope, None), Some(json!([])));
    }

    #[test]
    fn test_decode_keeps_non_list_payloads_intact() {
        let (client, _dir) = test_client();
        let envelope = json_envelope(r#"{"objectId":"U1","sessionToken":"tok"}"#);
        assert_eq!(
            client.decode_and_cache(&envelope, None),
            Some(json!({"objectId": "U1", "sessionToken": "tok"}))
        );
    }

    #[test]
    fn test_decode_is_idempotent() {
        let (client, _dir) = test_client();
        let envelope = json_envelope(r#"{"results":[{"objectId":"A"}]}"#);

        let first = client.decode_and_cache(&envelope, Some("list"));
        let second = client.decode_and_cache(&envelope, Some("list"));
        assert_eq!(first, second);
        assert_eq!(first, Some(json!([{"objectId": "A"}])));
    }

    #[test]
    fn test_decode_stores_under_the_cache_key() {
        let (client, _dir) = test_client();
        let envelope = json_envelope(r#"{"results":[{"objectId":"S1","name":"Math"}]}"#);

        client
            .decode_and_cache(&envelope, Some(keys::SECTIONS))
            .expect("No result");
        assert_eq!(
            client.cache().get(keys::SECTIONS),
            Some(json!([{"objectId": "S1", "name": "Math"}]))
        );
    }

    #[test]
    fn test_empty_payload_falls_back_to_cached_value() {
        let (client, _dir) = test_client();
        let stored = json!([{"objectId": "S1", "name": "Math"}]);
        client
            .cache()
            .put(keys::SECTIONS, &stored)
            .expect("Failed to store");

        let failure = Response::failure(&NetError::Timeout, ResponseKind::Json);
        assert_eq!(
            client.decode_and_cache(&failure, Some(keys::SECTIONS)),
            Some(stored)
        );
    }

    #[test]
    fn test_empty_payload_without_cache_entry_is_absent() {
        let (client, _dir) = test_client();
        let failure = Response::failure(&NetError::Timeout, ResponseKind::Json);
        assert_eq!(client.decode_and_cache(&failure, Some("never_written")), None);
        assert_eq!(client.decode_and_cache(&failure, None), None);
    }

    #[test]
    fn test_malformed_payload_decodes_to_no_result() {
        let (client, _dir) = test_client();
        let envelope = json_envelope("Failed to make request.");
        assert_eq!(client.decode_and_cache(&envelope, Some("k")), None);
        // The bad payload must not have clobbered the cache.
        assert_eq!(client.cache().get("k"), None);
    }

    #[test]
    fn test_binary_payload_is_cached_as_base64() {
        let (client, _dir) = test_client();
        let envelope = Response {
            ok: true,
            status: 200,
            status_text: "OK".to_string(),
            headers: String::new(),
            body: Some(ResponseBody::Binary(vec![1, 2, 3])),
            kind: ResponseKind::Binary,
        };

        let decoded = client
            .decode_and_cache(&envelope, Some("School A"))
            .expect("No result");
        assert_eq!(decoded, json!("AQID"));
        assert_eq!(client.cache().get("School A"), Some(json!("AQID")));
    }
}
