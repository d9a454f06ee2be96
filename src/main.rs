//! sputnikd - Sputnik chat daemon.

use anyhow::Context;
use std::sync::Arc;
use sputnikd::config::{Config, DatabaseBackend};
use sputnikd::db::Database;
use sputnikd::identity::{HmacTokenVerifier, is_default_secret};
use sputnikd::service::ChatService;
use sputnikd::state::{ActorSettings, RoomRegistry};
use sputnikd::store::{MemoryStore, RoomStore};
use sputnikd::{http, metrics};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(server = %config.server.name, "Starting sputnikd");

    // Tokens signed with a guessable key can be forged for any user.
    if is_default_secret(&config.auth.token_secret) {
        if std::env::var("SPUTNIKD_ALLOW_INSECURE_SECRET").is_ok() {
            warn!("INSECURE: Running with weak token_secret (allowed via SPUTNIKD_ALLOW_INSECURE_SECRET)");
        } else {
            error!("FATAL: Insecure token_secret detected!");
            error!("  The token_secret verifies caller identity tokens.");
            error!("  To fix, set a strong secret in the config file:");
            error!("    [auth]");
            error!("    token_secret = \"<random-32-char-string>\"");
            error!("  For testing only, set SPUTNIKD_ALLOW_INSECURE_SECRET=1 to bypass this check.");
            return Err(anyhow::anyhow!(
                "Refusing to start with insecure token_secret. See error messages above."
            ));
        }
    }

    let store: Arc<dyn RoomStore> = match config.database.backend {
        DatabaseBackend::Sqlite => {
            info!(path = %config.database.path, "Opening SQLite store");
            Arc::new(Database::new(&config.database.path).await?)
        }
        DatabaseBackend::Memory => {
            warn!("Using the in-memory store; nothing survives a restart");
            Arc::new(MemoryStore::new())
        }
    };

    // metrics_port = 0 disables the HTTP endpoint.
    let metrics_port = config.server.metrics_port;
    if metrics_port == 0 {
        info!("Metrics disabled");
    } else {
        metrics::init();
        tokio::spawn(async move {
            http::run_http_server(metrics_port).await;
        });
        info!(port = metrics_port, "Prometheus HTTP server started");
    }

    let settings = ActorSettings::from(&config.limits);
    let registry = Arc::new(RoomRegistry::new(store, settings));
    let report = registry
        .start()
        .await
        .context("failed to list persisted rooms")?;
    if report.failed > 0 {
        warn!(failed = report.failed, "Some rooms did not start");
    }

    let verifier = HmacTokenVerifier::new(&config.auth.token_secret)
        .map_err(|e| anyhow::anyhow!("invalid token_secret: {e}"))?;
    // Transports attach by cloning this handle; it lives until shutdown.
    let service = Arc::new(ChatService::new(
        registry.clone(),
        Arc::new(verifier),
        config.limits.fanout_timeout(),
    ));
    info!(rooms = registry.len(), "sputnikd ready");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    drop(service);
    Ok(())
}
