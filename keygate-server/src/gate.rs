use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use http::{HeaderMap, HeaderValue, header};
use keygate_admin::error::denial_response;
use keygate_core::AuthOutcome;
use keygate_core::config::SessionConfig;
use keygate_plugin::{AuthChain, RequestContext};
use keygate_store::SessionStore;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

/// State shared by every request passing the gate.
pub struct GateState {
    pub chain: AuthChain,
    pub sessions: Arc<SessionStore>,
    pub session: SessionConfig,
}

/// Run the authentication chain ahead of routing and enforce its outcome.
///
/// * `Denied`       → JSON error, the request goes no further.
/// * `Granted`      → the `Account` is inserted into request extensions and,
///   when an authenticator asked for it, a session cookie is set.
/// * `Undetermined` → the request continues anonymously.
pub async fn authenticate(
    State(gate): State<Arc<GateState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_default();

    let mut ctx = RequestContext::new(
        request.method().to_string(),
        request.uri().to_string(),
        header_map(request.headers()),
        client_ip,
    );

    match gate.chain.run(&mut ctx) {
        AuthOutcome::Denied(denial) => {
            tracing::debug!(uri = %ctx.uri, client_ip = %ctx.client_ip, reason = denial.reason, "Request denied");
            return denial_response(&denial);
        }
        AuthOutcome::Granted(account) => {
            request.extensions_mut().insert(account);
        }
        AuthOutcome::Undetermined => {}
    }

    let cookie = ctx.session_request.map(|user_id| {
        let (token, _) = gate.sessions.issue(user_id);
        session_cookie(&gate.session, &token)
    });

    let mut response = next.run(request).await;
    if let Some(cookie) = cookie {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::warn!(error = %e, "Session cookie is not a valid header value"),
        }
    }
    response
}

/// Flatten a `HeaderMap` for the chain. Repeated headers are joined the way
/// HTTP allows (`; ` for cookies, `, ` otherwise).
///
/// Values are decoded as UTF-8, so a non-ASCII key still reaches the
/// authenticators. Invalid sequences become U+FFFD instead of dropping the header.
pub fn header_map(headers: &HeaderMap) -> HashMap<String, String> {
    let mut out: HashMap<String, String> = HashMap::with_capacity(headers.keys_len());
    for (name, value) in headers {
        let decoded = String::from_utf8_lossy(value.as_bytes());
        let value: &str = &decoded;
        let sep = if *name == header::COOKIE { "; " } else { ", " };
        out.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(sep);
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    out
}

/// `Set-Cookie` value for a freshly minted session.
pub fn session_cookie(config: &SessionConfig, token: &str) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        config.cookie_name, token, config.ttl_secs
    );
    if config.secure {
        cookie.push_str("; Secure");
    }
    cookie
}
