use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Kind marker on relation references
const POINTER_KIND: &str = "Pointer";

/// Kind marker on binary-asset references
const FILE_KIND: &str = "File";

/// Reference to another stored object: a (kind, class, id) triple, never an
/// embedded copy. Dereferencing is always the caller's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pointer {
    #[serde(rename = "__type")]
    pub kind: String,
    #[serde(rename = "className")]
    pub class_name: String,
    #[serde(rename = "objectId")]
    pub object_id: String,
}

impl Pointer {
    pub fn new(class_name: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            kind: POINTER_KIND.to_string(),
            class_name: class_name.into(),
            object_id: object_id.into(),
        }
    }

    /// Wire shape used inside `where` filters.
    pub fn to_value(&self) -> Value {
        json!({
            "__type": self.kind,
            "className": self.class_name,
            "objectId": self.object_id,
        })
    }
}

/// Reference to an uploaded binary asset, resolved separately from the
/// structured query path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePointer {
    #[serde(rename = "__type")]
    pub kind: String,
    pub name: String,
    pub url: String,
}

impl FilePointer {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            kind: FILE_KIND.to_string(),
            name: name.into(),
            url: url.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_wire_shape() {
        let pointer = Pointer::new("School", "SCH1");
        assert_eq!(
            pointer.to_value(),
            json!({"__type": "Pointer", "className": "School", "objectId": "SCH1"})
        );
    }

    #[test]
    fn test_pointer_round_trips_through_serde() {
        let pointer = Pointer::new("_User", "U1");
        let value = serde_json::to_value(&pointer).expect("Failed to serialize");
        assert_eq!(value, pointer.to_value());
        let back: Pointer = serde_json::from_value(value).expect("Failed to deserialize");
        assert_eq!(back, pointer);
    }

    #[test]
    fn test_file_pointer_wire_shape() {
        let file = FilePointer::new("photo.png", "http://x/files/photo.png");
        let value = serde_json::to_value(&file).expect("Failed to serialize");
        assert_eq!(
            value,
            json!({"__type": "File", "name": "photo.png", "url": "http://x/files/photo.png"})
        );
    }
}
