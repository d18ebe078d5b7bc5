//! Hydration: decoded payloads into typed records.
//!
//! Construction is schema-driven rather than a blind field copy: a payload
//! missing its `objectId` fails to deserialize and is dropped with a
//! warning, while unknown extra fields pass through onto the record.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// Hydrate a single record from a payload mapping.
pub fn hydrate_one<T: DeserializeOwned>(payload: &Value) -> Option<T> {
    match serde_json::from_value(payload.clone()) {
        Ok(record) => Some(record),
        Err(err) => {
            warn!(error = %err, "discarding record that failed to hydrate");
            None
        }
    }
}

/// Hydrate one or many records from a payload that is either a single
/// mapping or a sequence of mappings. Invalid items are skipped, never
/// aborting the batch.
pub fn hydrate_many<T: DeserializeOwned>(payload: &Value) -> Vec<T> {
    match payload {
        Value::Array(items) => items.iter().filter_map(|item| hydrate_one(item)).collect(),
        Value::Object(_) => hydrate_one(payload).into_iter().collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::models::{Section, Student};

    use super::*;

    #[test]
    fn test_hydrates_a_sequence() {
        let payload = json!([
            {"objectId": "S1", "name": "Math"},
            {"objectId": "S2", "name": "Art"}
        ]);
        let sections: Vec<Section> = hydrate_many(&payload);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].object_id, "S1");
        assert_eq!(sections[1].name.as_deref(), Some("Art"));
    }

    #[test]
    fn test_hydrates_a_single_mapping_as_one_record() {
        let payload = json!({"objectId": "S1", "name": "Math"});
        let sections: Vec<Section> = hydrate_many(&payload);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].object_id, "S1");
    }

    #[test]
    fn test_rejects_payloads_missing_the_identifier() {
        let payload = json!([
            {"name": "no id here"},
            {"objectId": "S2", "name": "Art"}
        ]);
        let sections: Vec<Section> = hydrate_many(&payload);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].object_id, "S2");
    }

    #[test]
    fn test_unknown_fields_pass_through() {
        let payload = json!({
            "objectId": "ST1",
            "name": "Riley",
            "age": 9,
            "nickname": "Ri",
            "school": {"__type": "Pointer", "className": "School", "objectId": "SCH1"}
        });
        let student: Student = hydrate_one(&payload).expect("Failed to hydrate");
        assert_eq!(student.age, Some(9));
        assert_eq!(student.extra["nickname"], json!("Ri"));
        assert_eq!(
            student.school.as_ref().map(|p| p.object_id.as_str()),
            Some("SCH1")
        );
    }

    #[test]
    fn test_scalar_payloads_hydrate_to_nothing() {
        let sections: Vec<Section> = hydrate_many(&json!("oops"));
        assert!(sections.is_empty());
        let none: Option<Section> = hydrate_one(&json!(42));
        assert!(none.is_none());
    }
}
