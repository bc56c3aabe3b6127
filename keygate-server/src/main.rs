// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Keygate: API-key authentication gate
//
//  Gate:     axum middleware running the authenticator chain
//  Settings: administrator-only REST API on the same listener
//  Config:   YAML file + KEYGATE_* env overrides
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use clap::Parser;
use keygate_core::KeygateConfig;
use keygate_server::build_gateway;
use keygate_store::{ConfigStore, FileStore, MemoryDirectory, MemoryStore, UserDirectory};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Parser, Debug)]
#[command(name = "keygate", version, about = "Keygate: API-key authentication gate")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "/etc/keygate/keygate.yaml")]
    config: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Tracing ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_target(false)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Keygate starting");

    // ── Config ──
    let config = if cli.config.exists() {
        info!(path = %cli.config.display(), "Loading config file");
        KeygateConfig::load(&cli.config)?
    } else {
        info!("No config file found, using defaults");
        KeygateConfig::default()
    };

    // ── Option store ──
    let store: Arc<dyn ConfigStore> = if config.store.in_memory {
        info!("Options kept in memory only");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(FileStore::open(config.store.path.clone()))
    };

    // ── User directory ──
    let directory: Arc<dyn UserDirectory> =
        Arc::new(MemoryDirectory::from_accounts(config.users.clone()));
    info!(users = directory.count(), "User directory loaded");

    // ── Activation: key + bound identity ──
    let activation = keygate_plugins::activate(Arc::clone(&store), Arc::clone(&directory))?;
    match activation.bound_user {
        Some(user_id) => info!(user_id, "API key bound to user"),
        None => tracing::warn!("No administrator to bind, API key requests will be denied"),
    }

    // ── Gateway ──
    let gateway = build_gateway(&config, store, directory)?;

    // ── Expired session sweep ──
    let sessions = Arc::clone(&gateway.sessions);
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            tick.tick().await;
            let purged = sessions.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "Expired sessions purged");
            }
        }
    });

    let addr: SocketAddr = config.server.addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Keygate is ready, serving traffic");

    axum::serve(
        listener,
        gateway
            .router
            .into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Keygate stopped");
    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received, stopping...");
}
