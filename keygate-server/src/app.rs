use crate::forward::{self, ForwardState, Upstream};
use crate::gate::{self, GateState};
use axum::{
    Json, Router,
    extract::Request,
    middleware,
    routing::get,
};
use keygate_admin::error::ApiError;
use keygate_admin::server::{AdminState, build_admin_router};
use keygate_core::{Account, KeygateConfig, KeygateError};
use keygate_plugin::AuthenticatorRegistry;
use keygate_store::{ConfigStore, SessionStore, UserDirectory};
use std::sync::Arc;

/// The assembled HTTP surface plus the handles the binary needs to keep.
pub struct Gateway {
    pub router: Router,
    pub sessions: Arc<SessionStore>,
}

/// Wire the authenticator chain, settings API, and upstream forwarding into
/// one router. Every route, including the fallback, runs behind the gate.
pub fn build_gateway(
    config: &KeygateConfig,
    store: Arc<dyn ConfigStore>,
    directory: Arc<dyn UserDirectory>,
) -> anyhow::Result<Gateway> {
    let sessions = Arc::new(
        SessionStore::new(config.session.ttl_secs).with_max_per_user(config.session.max_per_user),
    );

    let mut registry = AuthenticatorRegistry::new();
    keygate_plugins::register_all(
        &mut registry,
        Arc::clone(&store),
        Arc::clone(&directory),
        Arc::clone(&sessions),
        config,
    );
    let chain = registry.build_chain(config.auth.chain.as_slice())?;
    tracing::info!(chain = ?chain.names(), "Authentication chain built");

    let upstream = match config.server.upstream.as_deref() {
        Some(base) if !base.trim().is_empty() => Some(Upstream::new(
            base,
            config.server.upstream_timeout_ms,
            &config.auth.header,
        )?),
        _ => None,
    };
    match &upstream {
        Some(u) => tracing::info!(upstream = %u.base(), "Forwarding unmatched requests"),
        None => tracing::info!("No upstream configured, unmatched requests get 404"),
    }

    let gate_state = Arc::new(GateState {
        chain,
        sessions: Arc::clone(&sessions),
        session: config.session.clone(),
    });
    let admin_state = Arc::new(AdminState { store, directory });

    let router = Router::new()
        .route("/keygate/v1/me", get(me))
        .fallback(forward::forward)
        .with_state(Arc::new(ForwardState { upstream }))
        .merge(build_admin_router(admin_state))
        .layer(middleware::from_fn_with_state(gate_state, gate::authenticate));

    Ok(Gateway { router, sessions })
}

/// The identity the current request acts as.
async fn me(request: Request) -> Result<Json<Account>, ApiError> {
    request
        .extensions()
        .get::<Account>()
        .cloned()
        .map(Json)
        .ok_or(ApiError(KeygateError::NotLoggedIn))
}
