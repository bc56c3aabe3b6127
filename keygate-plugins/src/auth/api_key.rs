use crate::binder::IdentityBinder;
use crate::keygen::stored_key;
use keygate_core::config::AuthConfig;
use keygate_core::{AuthOutcome, Denial};
use keygate_plugin::{Authenticator, RequestContext};
use keygate_store::{ConfigStore, UserDirectory};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// API-key authenticator. Grants the bound identity to requests carrying
/// the shared secret.
///
/// Purely additive: a request without the header is left `Undetermined` so the
/// host treats it as anonymous. A present but wrong key is denied with 403.
/// The stored key and the binding are re-read on every request, so settings
/// changes apply immediately.
pub struct ApiKeyAuth {
    header: String,
    issue_session: bool,
    store: Arc<dyn ConfigStore>,
    binder: IdentityBinder,
}

impl ApiKeyAuth {
    pub const NAME: &'static str = "api-key";
    pub const PRIORITY: i32 = 100;

    pub fn new(
        store: Arc<dyn ConfigStore>,
        directory: Arc<dyn UserDirectory>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            header: config.header.clone(),
            issue_session: config.issue_session,
            binder: IdentityBinder::new(Arc::clone(&store), directory),
            store,
        }
    }

    fn key_matches(&self, presented: &str) -> bool {
        match stored_key(self.store.as_ref()) {
            Some(stored) => secrets_equal(presented, &stored),
            None => false,
        }
    }
}

/// Constant-time secret comparison.
///
/// Both sides are hashed first so the comparison always runs over two
/// 32-byte digests and the stored key's length is not observable either.
fn secrets_equal(presented: &str, stored: &str) -> bool {
    let a = Sha256::digest(presented.as_bytes());
    let b = Sha256::digest(stored.as_bytes());
    a.as_slice().ct_eq(b.as_slice()).into()
}

impl Authenticator for ApiKeyAuth {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn authenticate(&self, prior: AuthOutcome, ctx: &mut RequestContext) -> AuthOutcome {
        if prior.is_definitive() {
            return prior;
        }

        let valid = match ctx.get_header(&self.header) {
            Some(presented) if !presented.is_empty() => self.key_matches(presented),
            _ => return prior,
        };

        if !valid {
            tracing::debug!(client_ip = %ctx.client_ip, uri = %ctx.uri, "Invalid API key presented");
            return AuthOutcome::Denied(Denial::invalid_api_key());
        }

        let Some(account) = self.binder.bound_account() else {
            tracing::warn!(
                bound_user = ?self.binder.bound_id(),
                "Valid API key but the bound user does not exist"
            );
            return AuthOutcome::Denied(Denial::invalid_api_key());
        };

        tracing::debug!(user_id = account.id, client_ip = %ctx.client_ip, "API key accepted");
        ctx.set_current_user(account.clone());
        if self.issue_session {
            ctx.request_session(account.id);
        }
        AuthOutcome::Granted(account)
    }
}
