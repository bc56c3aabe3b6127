use crate::token::random_hex;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use keygate_core::UserId;

/// Bytes of randomness in a session token (hex encoded to twice as many chars).
const TOKEN_BYTES: usize = 32;

/// A login session minted for an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Live sessions keyed by opaque token.
///
/// Every API-key grant mints a session, so a client that never returns the
/// cookie leaves one entry per request. `max_per_user` bounds that: past the
/// cap the user's oldest sessions are evicted.
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    ttl: Duration,
    /// 0 = unlimited.
    max_per_user: usize,
}

impl SessionStore {
    pub fn new(ttl_secs: u64) -> Self {
        let secs = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        Self {
            sessions: DashMap::new(),
            ttl: Duration::try_seconds(secs).unwrap_or(Duration::MAX),
            max_per_user: 0,
        }
    }

    /// Cap live sessions per user (0 = unlimited).
    pub fn with_max_per_user(mut self, max: usize) -> Self {
        self.max_per_user = max;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint a session for `user_id`. Returns the token to hand to the client.
    pub fn issue(&self, user_id: UserId) -> (String, Session) {
        let token = random_hex(TOKEN_BYTES);
        let issued_at = Utc::now();
        let session = Session {
            user_id,
            issued_at,
            expires_at: issued_at.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        self.sessions.insert(token.clone(), session.clone());
        self.evict_oldest(user_id, &token);
        tracing::debug!(user_id, "Session issued");
        (token, session)
    }

    /// Drop `user_id`'s oldest sessions beyond the cap, never `keep`.
    fn evict_oldest(&self, user_id: UserId, keep: &str) {
        if self.max_per_user == 0 {
            return;
        }
        let mut owned: Vec<(DateTime<Utc>, String)> = self
            .sessions
            .iter()
            .filter(|e| e.value().user_id == user_id && e.key() != keep)
            .map(|e| (e.value().issued_at, e.key().clone()))
            .collect();
        let allowed = self.max_per_user - 1;
        if owned.len() <= allowed {
            return;
        }
        owned.sort();
        let excess = owned.len() - allowed;
        for (_, token) in owned.into_iter().take(excess) {
            self.sessions.remove(&token);
        }
        tracing::debug!(user_id, evicted = excess, "Oldest sessions evicted");
    }

    /// Live sessions held by `user_id`.
    pub fn count_for(&self, user_id: UserId) -> usize {
        self.sessions.iter().filter(|e| e.value().user_id == user_id).count()
    }

    /// Live session for `token`. Expired entries are dropped on sight.
    pub fn lookup(&self, token: &str) -> Option<Session> {
        let session = self.sessions.get(token).map(|s| s.value().clone())?;
        if session.is_expired(Utc::now()) {
            self.sessions.remove(token);
            tracing::debug!(user_id = session.user_id, "Expired session purged");
            return None;
        }
        Some(session)
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    /// Drop every expired session. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !s.is_expired(now));
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_lookup() {
        let store = SessionStore::new(3600);
        let (token, session) = store.issue(7);
        assert_eq!(token.len(), TOKEN_BYTES * 2);
        assert_eq!(session.user_id, 7);
        assert_eq!(session.expires_at - session.issued_at, Duration::seconds(3600));
        assert_eq!(store.lookup(&token), Some(session));
    }

    #[test]
    fn test_unknown_token() {
        let store = SessionStore::new(3600);
        assert!(store.lookup("deadbeef").is_none());
    }

    #[test]
    fn test_expired_session_is_purged_on_lookup() {
        let store = SessionStore::new(0);
        let (token, _) = store.issue(7);
        assert!(store.lookup(&token).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_revoke() {
        let store = SessionStore::new(3600);
        let (token, _) = store.issue(1);
        assert!(store.revoke(&token));
        assert!(!store.revoke(&token));
        assert!(store.lookup(&token).is_none());
    }

    #[test]
    fn test_sessions_capped_per_user() {
        let store = SessionStore::new(3600).with_max_per_user(2);
        let (other, _) = store.issue(8);
        for _ in 0..5 {
            store.issue(7);
        }
        let (newest, _) = store.issue(7);
        assert_eq!(store.count_for(7), 2);
        assert!(store.lookup(&newest).is_some());
        assert!(store.lookup(&other).is_some());
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_unlimited_by_default() {
        let store = SessionStore::new(3600);
        for _ in 0..20 {
            store.issue(7);
        }
        assert_eq!(store.count_for(7), 20);
    }

    #[test]
    fn test_purge_expired() {
        let expired = SessionStore::new(0);
        expired.issue(1);
        expired.issue(2);
        assert_eq!(expired.purge_expired(), 2);

        let live = SessionStore::new(3600);
        live.issue(1);
        assert_eq!(live.purge_expired(), 0);
        assert_eq!(live.len(), 1);
    }
}
