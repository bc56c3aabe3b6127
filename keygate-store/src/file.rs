//! File-backed option store.
//!
//! Options live in memory and every write rewrites a JSON file. On open the
//! file is loaded back, so the API key and the bound user survive restarts.
//!
//! The file is written atomically: first to a `.tmp` sibling, then renamed
//! over the final path, so a crash mid-write never corrupts stored options.
//! A write becomes visible in memory only once the file holds it.

use crate::options::{ConfigStore, MemoryStore, is_unset};
use keygate_core::KeygateError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
    /// Serializes write + save so the file always matches the latest write.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (or start) the store at `path`.
    ///
    /// * If the file does not exist          → starts empty (first run).
    /// * If the file exists but is malformed → logs a warning and starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let inner = MemoryStore::new();

        match load_options(&path) {
            Ok(Some(options)) => {
                let count = options.len();
                for (k, v) in options {
                    // Loading into a fresh store never fails.
                    let _ = inner.set(&k, v);
                }
                tracing::info!(options = count, path = %path.display(), "store: options restored from file");
            }
            Ok(None) => {
                tracing::debug!(path = %path.display(), "store: no options file found, starting fresh");
            }
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "store: options file unreadable, ignoring");
            }
        }

        Self {
            path,
            inner,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the current options with `name` set to `value`.
    fn save_with(&self, name: &str, value: &Value) -> Result<(), KeygateError> {
        let mut options = self.inner.snapshot();
        options.insert(name.to_string(), value.clone());
        let json = serde_json::to_string_pretty(&options)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, &self.path)?;

        tracing::debug!(path = %self.path.display(), "store: options saved");
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>, KeygateError> {
        self.write_lock
            .lock()
            .map_err(|_| KeygateError::StoreError("option store lock poisoned".into()))
    }
}

fn load_options(path: &Path) -> Result<Option<BTreeMap<String, Value>>, KeygateError> {
    if !path.exists() {
        return Ok(None);
    }
    let data = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&data)?))
}

impl ConfigStore for FileStore {
    fn get(&self, name: &str) -> Option<Value> {
        self.inner.get(name)
    }

    fn set(&self, name: &str, value: Value) -> Result<(), KeygateError> {
        let _guard = self.lock()?;
        self.save_with(name, &value)?;
        self.inner.set(name, value)
    }

    fn add(&self, name: &str, value: Value) -> Result<bool, KeygateError> {
        // Every write goes through `write_lock`, so the check below cannot go stale.
        let _guard = self.lock()?;
        if self.inner.get(name).is_some_and(|v| !is_unset(&v)) {
            return Ok(false);
        }
        self.save_with(name, &value)?;
        self.inner.set(name, value)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn round_trip_options() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("options.json");

        let store = FileStore::open(&path);
        store.set("rest_api_key_auth_api_key", json!("k1")).unwrap();
        store.set("rest_api_key_auth_user", json!(7)).unwrap();
        assert!(path.exists());

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get("rest_api_key_auth_api_key"), Some(json!("k1")));
        assert_eq!(reopened.get("rest_api_key_auth_user"), Some(json!(7)));
    }

    #[test]
    fn add_does_not_rewrite_existing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("options.json");
        let store = FileStore::open(&path);
        assert!(store.add("k", json!("first")).unwrap());
        assert!(!store.add("k", json!("second")).unwrap());
        assert_eq!(FileStore::open(&path).get("k"), Some(json!("first")));
    }

    #[test]
    fn creates_missing_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/options.json");
        let store = FileStore::open(&path);
        store.set("k", json!(1)).unwrap();
        assert!(path.exists());
        assert_eq!(store.path(), path.as_path());
    }

    #[test]
    fn failed_write_leaves_previous_value() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        let store = FileStore::open(blocker.join("options.json"));
        store.inner.set("k", json!("old")).unwrap();
        // A regular file where the parent directory should be makes every save fail.
        std::fs::write(&blocker, "").unwrap();

        assert!(store.set("k", json!("new")).is_err());
        assert_eq!(store.get("k"), Some(json!("old")));

        assert!(store.add("fresh", json!("v")).is_err());
        assert!(store.get("fresh").is_none());
    }

    #[test]
    fn add_over_unset_value_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("options.json");
        let store = FileStore::open(&path);
        store.set("k", json!("")).unwrap();
        assert!(store.add("k", json!("v")).unwrap());
        assert_eq!(FileStore::open(&path).get("k"), Some(json!("v")));
    }

    #[test]
    fn open_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path().join("nonexistent.json"));
        assert!(store.get("anything").is_none());
    }

    #[test]
    fn open_malformed_file_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "not valid json {{{{").unwrap();
        let store = FileStore::open(&path);
        assert!(store.get("k").is_none());
    }
}
