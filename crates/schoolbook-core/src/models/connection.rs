use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::pointer::Pointer;
use super::school::School;

/// Link between a user and a school. Queried with an eager-load hint, so
/// `school` hydrates as the full inlined record rather than a pointer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub object_id: String,
    pub user: Option<Pointer>,
    pub school: Option<School>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
