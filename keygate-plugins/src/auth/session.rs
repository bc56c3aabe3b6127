use keygate_core::AuthOutcome;
use keygate_core::config::SessionConfig;
use keygate_plugin::{Authenticator, RequestContext};
use keygate_store::{SessionStore, UserDirectory};
use std::sync::Arc;

/// Session-cookie authenticator.
///
/// Runs ahead of the API-key check and accepts sessions minted by an earlier
/// grant. Unknown or expired tokens and sessions of deleted accounts fall
/// through as `Undetermined`.
pub struct SessionAuth {
    cookie_name: String,
    sessions: Arc<SessionStore>,
    directory: Arc<dyn UserDirectory>,
}

impl SessionAuth {
    pub const NAME: &'static str = "session";
    pub const PRIORITY: i32 = 200;

    pub fn new(
        sessions: Arc<SessionStore>,
        directory: Arc<dyn UserDirectory>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            cookie_name: config.cookie_name.clone(),
            sessions,
            directory,
        }
    }
}

impl Authenticator for SessionAuth {
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

        let Some(token) = ctx.get_cookie(&self.cookie_name).map(str::to_owned) else {
            return prior;
        };
        let Some(session) = self.sessions.lookup(&token) else {
            return prior;
        };
        let Some(account) = self.directory.get(session.user_id) else {
            self.sessions.revoke(&token);
            tracing::debug!(user_id = session.user_id, "Session for deleted user revoked");
            return prior;
        };

        ctx.set_current_user(account.clone());
        AuthOutcome::Granted(account)
    }
}
