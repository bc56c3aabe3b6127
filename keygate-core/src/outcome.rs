use crate::account::Account;
use serde_json::json;

/// Why a request was refused. Rendered as a REST error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Denial {
    /// Short machine reason, e.g. `invalid_api_key`.
    pub reason: &'static str,
    pub message: &'static str,
    pub status: u16,
}

impl Denial {
    /// The single denial the API-key authenticator ever emits. A wrong key and
    /// a key bound to a missing account both map here.
    pub const fn invalid_api_key() -> Self {
        Self {
            reason: "invalid_api_key",
            message: "Invalid API Key provided.",
            status: 403,
        }
    }

    /// Machine code as sent to clients (`rest_` prefixed).
    pub fn code(&self) -> String {
        format!("rest_{}", self.reason)
    }

    pub fn to_json_body(&self) -> Vec<u8> {
        json!({
            "code": self.code(),
            "message": self.message,
            "data": { "status": self.status },
        })
        .to_string()
        .into_bytes()
    }
}

/// Result of an authentication attempt for a single request.
///
/// `Undetermined` is the initial state. `Denied` and `Granted` are terminal:
/// once an authenticator produces one, nothing later in the chain may replace it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthOutcome {
    #[default]
    Undetermined,
    Denied(Denial),
    Granted(Account),
}

impl AuthOutcome {
    pub fn is_undetermined(&self) -> bool {
        matches!(self, AuthOutcome::Undetermined)
    }

    /// True for `Denied` and `Granted`.
    pub fn is_definitive(&self) -> bool {
        !self.is_undetermined()
    }

    pub fn granted(&self) -> Option<&Account> {
        match self {
            AuthOutcome::Granted(account) => Some(account),
            _ => None,
        }
    }

    pub fn denial(&self) -> Option<&Denial> {
        match self {
            AuthOutcome::Denied(denial) => Some(denial),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthOutcome::Undetermined => "undetermined",
            AuthOutcome::Denied(_) => "denied",
            AuthOutcome::Granted(_) => "granted",
        }
    }
}

impl std::fmt::Display for AuthOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
