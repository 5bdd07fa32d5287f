//! Gateway HTTP server (single port).

use crate::channels::{webhook_router, ChannelRegistry};
use crate::config::{self, Config};
use crate::endpoint::EndpointClient;
use crate::engine::{MessageHandler, RestEngine};
use anyhow::{Context, Result};
use axum::{extract::State, routing::get, Json, Router};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

/// State for the top-level health route.
#[derive(Clone)]
struct GatewayState {
    port: u16,
    channels: Arc<Vec<String>>,
}

/// Build the app: `GET /` health plus the webhook routes of every registered channel.
pub fn build_router(registry: &ChannelRegistry, handler: Arc<dyn MessageHandler>, port: u16) -> Router {
    let state = GatewayState {
        port,
        channels: Arc::new(registry.ids()),
    };
    let mut app = Router::new()
        .route("/", get(health_http))
        .with_state(state);
    for channel in registry.iter() {
        app = app.merge(webhook_router(channel.clone(), handler.clone()));
        log::debug!("serving webhook for {} at /webhooks/{}/webhook", channel.name(), channel.name());
    }
    app
}

/// Run the gateway server; binds to config.gateway.bind:config.gateway.port.
/// Loads channels from the credentials file and forwards their messages to the engine at
/// `engine.url` (or EVA_BRIDGE_ENGINE_URL). Fails when no channel or no engine url is configured.
/// Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_gateway(config: Config, config_path: PathBuf) -> Result<()> {
    let credentials_path = config::resolve_credentials_path(&config, &config_path);
    let credentials = config::load_credentials(&credentials_path)?;
    let registry = ChannelRegistry::from_credentials(credentials)?;
    if registry.is_empty() {
        anyhow::bail!(
            "no channels configured; add an evachannel or webchannel entry to {}",
            credentials_path.display()
        );
    }

    let Some(engine_url) = config::resolve_engine_url(&config) else {
        anyhow::bail!("engine url not configured (set engine.url or EVA_BRIDGE_ENGINE_URL)");
    };
    let mut engine_config = config.engine.clone();
    engine_config.url = Some(engine_url.clone());
    let engine = RestEngine::new(
        EndpointClient::new(engine_config).context("building engine client")?,
    );
    log::info!("forwarding messages to engine at {}", engine_url);

    let app = build_router(&registry, Arc::new(engine), config.gateway.port);

    let bind_addr = format!("{}:{}", config.gateway.bind.trim(), config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!(
        "gateway listening on {} (channels: {})",
        bind_addr,
        registry.ids().join(", ")
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {}", e);
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
                log::error!("failed to install SIGTERM handler: {}", e);
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
    log::info!("shutdown signal received, draining connections");
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "channels": state.channels.as_slice(),
        "port": state.port,
    }))
}
