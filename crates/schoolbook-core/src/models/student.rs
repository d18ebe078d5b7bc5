use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::pointer::{FilePointer, Pointer};

/// A student enrolled in a section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub object_id: String,
    pub name: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i64>,
    pub school: Option<Pointer>,
    pub section: Option<Pointer>,
    pub image: Option<FilePointer>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
