use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use keygate_core::KeygateError;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Named option storage shared by the whole process.
///
/// Readers always see the latest value; nothing above this trait caches
/// options across requests.
pub trait ConfigStore: Send + Sync {
    /// Current value of `name`, if any.
    fn get(&self, name: &str) -> Option<Value>;

    /// Unconditionally store `value` under `name`.
    fn set(&self, name: &str, value: Value) -> Result<(), KeygateError>;

    /// Store `value` only if `name` is unset (see [`is_unset`]).
    ///
    /// The check and the write happen atomically: when two callers race,
    /// exactly one returns `Ok(true)` and its value is the one kept.
    fn add(&self, name: &str, value: Value) -> Result<bool, KeygateError>;
}

/// Values that count as "not set": null, empty string, zero, and `false`.
pub fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

/// In-memory option store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    options: DashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `options`.
    pub fn with_options<I, K>(options: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let store = Self::new();
        for (k, v) in options {
            store.options.insert(k.into(), v);
        }
        store
    }

    /// Remove `name`. Not part of [`ConfigStore`]: the auth core never deletes options.
    pub fn remove(&self, name: &str) -> Option<Value> {
        self.options.remove(name).map(|(_, v)| v)
    }

    /// Sorted copy of every option, for persistence.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.options
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

impl ConfigStore for MemoryStore {
    fn get(&self, name: &str) -> Option<Value> {
        self.options.get(name).map(|v| v.value().clone())
    }

    fn set(&self, name: &str, value: Value) -> Result<(), KeygateError> {
        self.options.insert(name.to_string(), value);
        debug!(option = name, "Option updated");
        Ok(())
    }

    fn add(&self, name: &str, value: Value) -> Result<bool, KeygateError> {
        // The entry guard holds the shard lock across the check and the write.
        match self.options.entry(name.to_string()) {
            Entry::Occupied(mut e) => {
                if is_unset(e.get()) {
                    e.insert(value);
                    debug!(option = name, "Option added over unset value");
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Entry::Vacant(e) => {
                e.insert(value);
                debug!(option = name, "Option added");
                Ok(true)
            }
        }
    }
}
