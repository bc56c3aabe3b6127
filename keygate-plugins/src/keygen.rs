use keygate_core::KeygateError;
use keygate_store::ConfigStore;
use keygate_store::token::random_hex;
use serde_json::Value;
use std::sync::Arc;

/// Option holding the shared secret.
pub const API_KEY_OPTION: &str = "rest_api_key_auth_api_key";

/// 128 bits of key material, 32 hex chars.
const KEY_BYTES: usize = 16;

/// Creates the shared secret on first activation.
pub struct KeyGenerator {
    store: Arc<dyn ConfigStore>,
}

impl KeyGenerator {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    /// Make sure a key is stored and return it. Never replaces an existing key.
    ///
    /// Concurrent callers race on the store's atomic `add`; every caller
    /// returns the one key that won.
    pub fn ensure_key_exists(&self) -> Result<String, KeygateError> {
        if let Some(existing) = stored_key(self.store.as_ref()) {
            return Ok(existing);
        }

        let candidate = generate_key();
        if self.store.add(API_KEY_OPTION, Value::String(candidate.clone()))? {
            tracing::info!(option = API_KEY_OPTION, "Generated API key");
            return Ok(candidate);
        }

        stored_key(self.store.as_ref())
            .ok_or_else(|| KeygateError::StoreError(format!("{API_KEY_OPTION} is set but is not a usable key")))
    }
}

/// A fresh random key.
pub fn generate_key() -> String {
    random_hex(KEY_BYTES)
}

/// The stored key, if it is a non-empty string.
pub fn stored_key(store: &dyn ConfigStore) -> Option<String> {
    match store.get(API_KEY_OPTION)? {
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    }
}
