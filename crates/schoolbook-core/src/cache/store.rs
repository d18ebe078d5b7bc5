use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// A cached value together with the time it was written.
///
/// The write time is informational only: nothing is ever evicted or
/// invalidated based on age.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: Value,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    fn new(value: Value) -> Self {
        Self {
            value,
            stored_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.stored_at).num_minutes()
    }
}

/// Flat string-keyed persistent store, one JSON file per key.
///
/// Last write wins; concurrent writers to the same key are not
/// coordinated. Each well-known key is owned by one resource kind, so that
/// never happens within a single operation.
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn open(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache directory: {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }

    pub fn put(&self, key: &str, value: &Value) -> Result<()> {
        let entry = CacheEntry::new(value.clone());
        let contents = serde_json::to_string(&entry)?;
        std::fs::write(self.entry_path(key), contents)
            .with_context(|| format!("Failed to write cache entry: {}", key))?;
        Ok(())
    }

    /// Read a cached value. Missing keys and unreadable files both read as
    /// a miss, never as an error. Entries not in the wrapper format are
    /// parsed as a plain JSON value, falling back to the raw stored text.
    pub fn get(&self, key: &str) -> Option<Value> {
        let contents = self.read(key)?;
        match serde_json::from_str::<CacheEntry>(&contents) {
            Ok(entry) => Some(entry.value),
            Err(_) => match serde_json::from_str::<Value>(&contents) {
                Ok(value) => Some(value),
                Err(_) => {
                    debug!(key, "cache entry is not JSON; returning raw text");
                    Some(Value::String(contents))
                }
            },
        }
    }

    /// Read a cached value with its write-time metadata. Only entries
    /// written through `put` carry one.
    pub fn entry(&self, key: &str) -> Option<CacheEntry> {
        let contents = self.read(key)?;
        serde_json::from_str(&contents).ok()
    }

    fn read(&self, key: &str) -> Option<String> {
        let path = self.entry_path(key);
        if !path.exists() {
            return None;
        }
        match std::fs::read_to_string(&path) {
            Ok(contents) => Some(contents),
            Err(err) => {
                warn!(key, error = %err, "failed to read cache entry");
                None
            }
        }
    }
}

/// Keys become file names; anything outside `[A-Za-z0-9._-]` maps to `_`.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn open_store() -> (CacheStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = CacheStore::open(dir.path().to_path_buf()).expect("Failed to open store");
        (store, dir)
    }

    #[test]
    fn test_round_trip_is_deep_equal() {
        let (store, _dir) = open_store();
        let value = json!({
            "objectId": "S1",
            "name": "Math",
            "nested": { "tags": ["a", "b"], "count": 3 }
        });
        store.put("sections", &value).expect("Failed to store");
        assert_eq!(store.get("sections"), Some(value));
    }

    #[test]
    fn test_missing_key_reads_as_miss() {
        let (store, _dir) = open_store();
        assert_eq!(store.get("never_written"), None);
    }

    #[test]
    fn test_last_write_wins() {
        let (store, _dir) = open_store();
        store.put("k", &json!({"v": 1})).expect("Failed to store");
        store.put("k", &json!({"v": 2})).expect("Failed to store");
        assert_eq!(store.get("k"), Some(json!({"v": 2})));
    }

    #[test]
    fn test_raw_json_file_reads_as_value() {
        let (store, dir) = open_store();
        // Entry written outside the store, without the stored_at wrapper.
        std::fs::write(dir.path().join("user.json"), r#"{"objectId":"U1"}"#)
            .expect("Failed to write file");
        assert_eq!(store.get("user"), Some(json!({"objectId": "U1"})));
    }

    #[test]
    fn test_non_json_file_reads_as_raw_text() {
        let (store, dir) = open_store();
        std::fs::write(dir.path().join("blob.json"), "not json at all")
            .expect("Failed to write file");
        assert_eq!(
            store.get("blob"),
            Some(Value::String("not json at all".to_string()))
        );
    }

    #[test]
    fn test_entry_exposes_write_time() {
        let (store, _dir) = open_store();
        store.put("k", &json!("v")).expect("Failed to store");
        let entry = store.entry("k").expect("Missing entry");
        assert_eq!(entry.value, json!("v"));
        assert!(entry.age_minutes() <= 1);
    }

    #[test]
    fn test_keys_with_path_characters_are_sanitized() {
        let (store, _dir) = open_store();
        store
            .put("School A/Photo 1", &json!("data"))
            .expect("Failed to store");
        assert_eq!(store.get("School A/Photo 1"), Some(json!("data")));
        assert_eq!(sanitize_key("School A/Photo 1"), "School_A_Photo_1");
    }
}
