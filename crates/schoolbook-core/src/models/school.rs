use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::pointer::FilePointer;

/// A school record. The image reference names the cache key its fetched
/// bytes are stored under (the school's name).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct School {
    pub object_id: String,
    pub name: Option<String>,
    pub code: Option<String>,
    pub image: Option<FilePointer>,
    /// Owning user: the inlined `_User` object when eager-loaded, otherwise
    /// a bare pointer value
    pub user: Option<Value>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
