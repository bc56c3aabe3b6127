use crate::account::Account;
use figment::{Figment, providers::{Env, Format, Yaml}};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level Keygate configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeygateConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub store: StoreConfig,
    /// Accounts served by the built-in user directory.
    #[serde(default)]
    pub users: Vec<Account>,
}

/// HTTP listener and upstream settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    /// Base URL of the protected REST API. Unmatched requests are forwarded here.
    #[serde(default)]
    pub upstream: Option<String>,
    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout_ms: u64,
}

/// Authentication chain settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Header carrying the shared secret. Matched case-insensitively.
    #[serde(default = "default_header")]
    pub header: String,
    /// Mint a session cookie when an API key grants access.
    #[serde(default = "default_true")]
    pub issue_session: bool,
    /// Authenticators to enable, by registered name.
    #[serde(default = "default_chain")]
    pub chain: Vec<String>,
}

/// Session cookie settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: u64,
    #[serde(default)]
    pub secure: bool,
    /// Live sessions kept per user; the oldest is evicted past this. 0 = unlimited.
    #[serde(default = "default_max_sessions_per_user")]
    pub max_per_user: usize,
}

/// Option store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// Keep options in memory only (nothing survives a restart).
    #[serde(default)]
    pub in_memory: bool,
}

// ── Defaults ──────────────────────────────────────────────────

fn default_addr() -> String { "0.0.0.0:9080".into() }
fn default_upstream_timeout() -> u64 { 30_000 }
fn default_header() -> String { "X-Api-Key".into() }
fn default_true() -> bool { true }
fn default_chain() -> Vec<String> { vec!["session".into(), "api-key".into()] }
fn default_cookie_name() -> String { "keygate_session".into() }
fn default_session_ttl() -> u64 { 2 * 24 * 60 * 60 }
fn default_max_sessions_per_user() -> usize { 16 }
fn default_store_path() -> PathBuf { PathBuf::from("data/keygate-options.json") }

// ── Impls ─────────────────────────────────────────────────────

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            upstream: None,
            upstream_timeout_ms: default_upstream_timeout(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            header: default_header(),
            issue_session: true,
            chain: default_chain(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            ttl_secs: default_session_ttl(),
            secure: false,
            max_per_user: default_max_sessions_per_user(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            in_memory: false,
        }
    }
}

impl KeygateConfig {
    /// Load configuration from YAML file + env overrides.
    ///
    /// Env vars use the `KEYGATE_` prefix and `__` between nesting levels,
    /// e.g. `KEYGATE_AUTH__ISSUE_SESSION=false`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config: KeygateConfig = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("KEYGATE_").split("__"))
            .extract()?;
        Ok(config)
    }
}
