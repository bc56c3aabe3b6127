pub mod auth;
pub mod binder;
pub mod keygen;

use auth::api_key::ApiKeyAuth;
use auth::session::SessionAuth;
use binder::IdentityBinder;
use keygate_core::config::KeygateConfig;
use keygate_core::{KeygateError, UserId};
use keygate_plugin::AuthenticatorRegistry;
use keygate_store::{ConfigStore, SessionStore, UserDirectory};
use keygen::KeyGenerator;
use std::sync::Arc;

/// Register the built-in authenticators.
pub fn register_all(
    registry: &mut AuthenticatorRegistry,
    store: Arc<dyn ConfigStore>,
    directory: Arc<dyn UserDirectory>,
    sessions: Arc<SessionStore>,
    config: &KeygateConfig,
) {
    registry.register(Arc::new(SessionAuth::new(
        sessions,
        Arc::clone(&directory),
        &config.session,
    )));
    registry.register(Arc::new(ApiKeyAuth::new(store, directory, &config.auth)));
}

/// What activation left in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub bound_user: Option<UserId>,
}

/// One-time bootstrap: make sure a key exists and a user is bound.
///
/// Safe to run on every start and from concurrent callers: both steps only
/// write through the store's atomic set-if-absent.
pub fn activate(
    store: Arc<dyn ConfigStore>,
    directory: Arc<dyn UserDirectory>,
) -> Result<Activation, KeygateError> {
    KeyGenerator::new(Arc::clone(&store)).ensure_key_exists()?;
    let bound_user = IdentityBinder::new(store, directory).ensure_identity_bound()?;
    Ok(Activation { bound_user })
}
