use crate::handlers;
use crate::middleware::require_admin;
use axum::{
    Router as AxumRouter,
    middleware,
    routing::get,
};
use keygate_store::{ConfigStore, UserDirectory};
use std::sync::Arc;

/// Shared state for the settings API.
pub struct AdminState {
    pub store: Arc<dyn ConfigStore>,
    pub directory: Arc<dyn UserDirectory>,
}

/// Build the settings router. Every route but `/health` requires an administrator.
///
/// The router expects the acting `Account` in request extensions, so it must
/// sit behind the authentication gate.
pub fn build_admin_router(state: Arc<AdminState>) -> AxumRouter {
    AxumRouter::new()
        .route(
            "/keygate/v1/settings",
            get(handlers::settings::get_settings).put(handlers::settings::update_settings),
        )
        .route("/keygate/v1/users", get(handlers::settings::list_users))
        .route_layer(middleware::from_fn(require_admin))
        .route("/health", get(handlers::health::health_check))
        .with_state(state)
}
