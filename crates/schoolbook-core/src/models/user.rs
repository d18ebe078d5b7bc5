use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The authenticated user, as returned by the login endpoint and cached
/// under the current-user key. `session_token` is what subsequent calls
/// attach as the session header.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedInUser {
    pub object_id: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub session_token: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Fields the backend sends that this client does not model (ACLs etc.)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
