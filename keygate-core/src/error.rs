use serde_json::json;
use thiserror::Error;

/// Unified error type for Keygate.
#[derive(Error, Debug)]
pub enum KeygateError {
    #[error("Sorry, you are not allowed to do that.")]
    NotLoggedIn,

    #[error("Sorry, you are not allowed to do that.")]
    Forbidden,

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("No route was found matching the URL and request method.")]
    NoRoute,

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Internal: {0}")]
    Internal(String),
}

impl KeygateError {
    /// Map to HTTP status code.
    pub fn status_code(&self) -> u16 {
        match self {
            KeygateError::NotLoggedIn => 401,
            KeygateError::Forbidden => 403,
            KeygateError::InvalidSetting(_) => 400,
            KeygateError::BadRequest(_) => 400,
            KeygateError::NoRoute => 404,
            KeygateError::Upstream(_) => 502,
            _ => 500,
        }
    }

    /// Machine code sent in the error body.
    pub fn code(&self) -> &'static str {
        match self {
            KeygateError::NotLoggedIn => "rest_not_logged_in",
            KeygateError::Forbidden => "rest_forbidden",
            KeygateError::InvalidSetting(_) => "rest_invalid_param",
            KeygateError::BadRequest(_) => "rest_bad_request",
            KeygateError::NoRoute => "rest_no_route",
            KeygateError::Upstream(_) => "rest_upstream_error",
            _ => "rest_internal_error",
        }
    }

    /// JSON error body: `{"code", "message", "data": {"status"}}`.
    pub fn to_json_body(&self) -> Vec<u8> {
        json!({
            "code": self.code(),
            "message": self.to_string(),
            "data": { "status": self.status_code() },
        })
        .to_string()
        .into_bytes()
    }
}
