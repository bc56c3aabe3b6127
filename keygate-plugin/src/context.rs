use keygate_core::{Account, UserId};
use std::collections::HashMap;

/// Per-request state handed to every authenticator in the chain.
///
/// Authenticators read the request from here and leave instructions for the
/// host: who the request acts as, and whether a login session should be minted.
pub struct RequestContext {
    pub method: String,
    pub uri: String,
    pub client_ip: String,
    pub request_headers: HashMap<String, String>,

    /// Acting identity, set when an authenticator grants access.
    pub current_user: Option<Account>,

    /// Account the host should open a login session for after the chain runs.
    pub session_request: Option<UserId>,
}

impl RequestContext {
    pub fn new(
        method: String,
        uri: String,
        headers: HashMap<String, String>,
        client_ip: String,
    ) -> Self {
        Self {
            method,
            uri,
            client_ip,
            request_headers: headers,
            current_user: None,
            session_request: None,
        }
    }

    /// Get a request header (case-insensitive).
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.request_headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get a cookie value from the `Cookie` header.
    pub fn get_cookie(&self, name: &str) -> Option<&str> {
        self.get_header("cookie")?
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
    }

    /// Make `account` the acting identity for the rest of this request.
    pub fn set_current_user(&mut self, account: Account) {
        self.current_user = Some(account);
    }

    /// Ask the host to establish a login session for `user_id`.
    pub fn request_session(&mut self, user_id: UserId) {
        self.session_request = Some(user_id);
    }

    pub fn current_user_id(&self) -> Option<UserId> {
        self.current_user.as_ref().map(|a| a.id)
    }
}
