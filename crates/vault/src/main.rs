//! `vault`: authenticated key/value store binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] (file path from the first argument, then `VAULT_*` env).
//! 2. Initialise the telemetry pipeline (tracing + optional OTLP).
//! 3. Open the SQLite store.
//! 4. Build the bearer-token verifier over the trust anchor directory.
//! 5. Build the Axum router and serve HTTP or HTTPS until shutdown.

mod auth;
mod config;
mod crypto;
mod server;
mod store;
mod telemetry;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use tracing::{info, warn};

use auth::{TokenVerifier, VerifierConfig};
use config::Config;
use server::state::AppState;
use store::SqliteStore;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let cfg = Config::load(config_path.as_deref()).map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otel_exporter_otlp_endpoint.as_deref(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %cfg.listen,
        "vault starting"
    );

    // -----------------------------------------------------------------------
    // 3. Store
    // -----------------------------------------------------------------------
    let store = SqliteStore::open(&cfg.db_path).await?;
    info!(db_path = %cfg.db_path.display(), "store opened");

    // -----------------------------------------------------------------------
    // 4. Token verifier
    // -----------------------------------------------------------------------
    if !cfg.trust_anchor_dir.is_dir() {
        warn!(
            trust_anchor_dir = %cfg.trust_anchor_dir.display(),
            "trust anchor directory does not exist; every request will be rejected until it does"
        );
    }
    let verifier = TokenVerifier::new(VerifierConfig {
        trust_anchor_dir: cfg.trust_anchor_dir.clone(),
    });
    info!(trust_anchor_dir = %verifier.trust_anchor_dir().display(), "token verifier ready");

    // -----------------------------------------------------------------------
    // 5. HTTP server
    // -----------------------------------------------------------------------
    let state = AppState::new(verifier, Arc::new(store), cfg.secret_header()?);
    let router = server::router::build(state, cfg.request_timeout());

    let addr = cfg.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    match cfg.tls_paths()? {
        Some((cert, key)) => {
            let tls = server::tls::load_server_config(cert, key)?;
            info!(addr = %addr, "listening (https)");
            server::tls::serve(listener, router, tls, server::shutdown_signal()).await?;
        }
        None => {
            info!(addr = %addr, "listening (http)");
            axum::serve(listener, router)
                .with_graceful_shutdown(server::shutdown_signal())
                .await?;
        }
    }

    info!("vault stopped");
    telemetry::shutdown();
    Ok(())
}
