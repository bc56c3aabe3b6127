//! Forwarding to the protected REST API.
//!
//! Requests no local route claimed are replayed against the configured
//! upstream. The shared secret never leaves the gate, and the upstream learns
//! the acting identity from `x-keygate-user-*` headers that clients cannot set.

use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    response::Response,
};
use http::{HeaderMap, HeaderName, HeaderValue, header};
use keygate_admin::error::ApiError;
use keygate_core::{Account, KeygateError};
use std::sync::Arc;
use std::time::Duration;

const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

pub const USER_ID_HEADER: &str = "x-keygate-user-id";
pub const USER_LOGIN_HEADER: &str = "x-keygate-user-login";

/// Headers that describe a single hop and must not be forwarded.
const HOP_BY_HOP: &[HeaderName] = &[
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

pub struct Upstream {
    base: String,
    api_key_header: String,
    client: reqwest::Client,
}

impl Upstream {
    pub fn new(base: &str, timeout_ms: u64, api_key_header: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::none())
            .no_gzip()
            .build()?;
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            api_key_header: api_key_header.to_ascii_lowercase(),
            client,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Headers to send upstream: the client's, minus hop-by-hop headers,
    /// the API key and any identity headers, plus the acting identity.
    fn outbound_headers(&self, incoming: &HeaderMap, account: Option<&Account>) -> HeaderMap {
        let mut out = HeaderMap::with_capacity(incoming.len() + 2);
        for (name, value) in incoming {
            let n = name.as_str();
            if is_hop_by_hop(name)
                || *name == header::HOST
                || *name == header::CONTENT_LENGTH
                || n == "keep-alive"
                || n == self.api_key_header
                || n.starts_with("x-keygate-")
            {
                continue;
            }
            out.append(name.clone(), value.clone());
        }

        if let Some(account) = account {
            out.insert(USER_ID_HEADER, HeaderValue::from(account.id));
            if let Ok(login) = HeaderValue::from_str(&account.login) {
                out.insert(USER_LOGIN_HEADER, login);
            }
        }
        out
    }
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(name)
}

/// State for the forwarding fallback.
pub struct ForwardState {
    pub upstream: Option<Upstream>,
}

/// Fallback handler: forward to the upstream, or 404 when none is configured.
pub async fn forward(
    State(state): State<Arc<ForwardState>>,
    request: Request,
) -> Result<Response, ApiError> {
    let Some(upstream) = state.upstream.as_ref() else {
        return Err(KeygateError::NoRoute.into());
    };

    let (parts, body) = request.into_parts();
    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = format!("{}{}", upstream.base, path);
    let headers = upstream.outbound_headers(&parts.headers, parts.extensions.get::<Account>());

    let body = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| KeygateError::BadRequest(format!("unreadable request body: {e}")))?;

    let upstream_resp = upstream
        .client
        .request(parts.method.clone(), &url)
        .headers(headers)
        .body(body)
        .send()
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, url = %url, "Upstream request failed");
            KeygateError::Upstream(e.to_string())
        })?;

    let status = upstream_resp.status();
    let mut resp_headers = upstream_resp.headers().clone();
    let resp_body = upstream_resp
        .bytes()
        .await
        .map_err(|e| KeygateError::Upstream(e.to_string()))?;

    for name in HOP_BY_HOP {
        resp_headers.remove(name);
    }
    resp_headers.remove("keep-alive");
    resp_headers.remove(header::CONTENT_LENGTH);

    tracing::debug!(method = %parts.method, url = %url, status = status.as_u16(), "Forwarded");

    let mut response = Response::new(Body::from(resp_body));
    *response.status_mut() = status;
    *response.headers_mut() = resp_headers;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream() -> Upstream {
        Upstream::new("http://127.0.0.1:8080/", 1000, "X-Api-Key").unwrap()
    }

    #[test]
    fn test_base_trailing_slash_trimmed() {
        assert_eq!(upstream().base(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_outbound_headers_strip_secret_and_spoofing() {
        let mut incoming = HeaderMap::new();
        incoming.insert("x-api-key", HeaderValue::from_static("k1"));
        incoming.insert(USER_ID_HEADER, HeaderValue::from_static("1"));
        incoming.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        incoming.insert(header::HOST, HeaderValue::from_static("gate.local"));
        incoming.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let out = upstream().outbound_headers(&incoming, None);
        assert!(out.get("x-api-key").is_none());
        assert!(out.get(USER_ID_HEADER).is_none());
        assert!(out.get(header::CONNECTION).is_none());
        assert!(out.get(header::HOST).is_none());
        assert_eq!(out.get(header::ACCEPT).unwrap(), "application/json");
    }

    #[test]
    fn test_outbound_headers_carry_identity() {
        let account = Account::new(7, "bot");
        let out = upstream().outbound_headers(&HeaderMap::new(), Some(&account));
        assert_eq!(out.get(USER_ID_HEADER).unwrap(), "7");
        assert_eq!(out.get(USER_LOGIN_HEADER).unwrap(), "bot");
    }
}
