use keygate_core::account::ROLE_ADMINISTRATOR;
use keygate_core::{Account, KeygateError, UserId};
use keygate_store::{ConfigStore, UserDirectory};
use serde_json::{Value, json};
use std::sync::Arc;

/// Option holding the id of the account valid keys authenticate as.
pub const BOUND_USER_OPTION: &str = "rest_api_key_auth_user";

/// Owns the mapping from "a valid key" to "an account".
#[derive(Clone)]
pub struct IdentityBinder {
    store: Arc<dyn ConfigStore>,
    directory: Arc<dyn UserDirectory>,
}

impl IdentityBinder {
    pub fn new(store: Arc<dyn ConfigStore>, directory: Arc<dyn UserDirectory>) -> Self {
        Self { store, directory }
    }

    /// Bind to the first administrator if nothing is bound yet.
    ///
    /// "First" is whatever order the directory lists administrators in.
    /// Returns the bound id, or `None` when no administrator exists.
    pub fn ensure_identity_bound(&self) -> Result<Option<UserId>, KeygateError> {
        if let Some(id) = self.bound_id() {
            return Ok(Some(id));
        }

        let Some(admin) = self.directory.list_by_role(ROLE_ADMINISTRATOR).into_iter().next() else {
            tracing::warn!("No administrator account found, API key is not bound to any user");
            return Ok(None);
        };

        if self.store.add(BOUND_USER_OPTION, json!(admin.id))? {
            tracing::info!(user_id = admin.id, login = %admin.login, "Bound API key to administrator");
            return Ok(Some(admin.id));
        }
        Ok(self.bound_id())
    }

    /// Stored binding. Accepts integers and numeric strings; zero means unbound.
    pub fn bound_id(&self) -> Option<UserId> {
        let id = match self.store.get(BOUND_USER_OPTION)? {
            Value::Number(n) => n.as_u64()?,
            Value::String(s) => s.trim().parse().ok()?,
            _ => return None,
        };
        (id != 0).then_some(id)
    }

    /// Look up an account. A missing id is `None`, never an error.
    pub fn resolve(&self, id: UserId) -> Option<Account> {
        self.directory.get(id)
    }

    /// The bound account, if bound and still present in the directory.
    pub fn bound_account(&self) -> Option<Account> {
        self.bound_id().and_then(|id| self.resolve(id))
    }

    /// Rebind to `id`. Existence is not checked here; a dangling binding
    /// denies every key at request time.
    pub fn bind(&self, id: UserId) -> Result<(), KeygateError> {
        self.store.set(BOUND_USER_OPTION, json!(id))
    }
}
