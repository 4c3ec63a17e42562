//! HTTP front end for GardenBook: server-rendered pages over the core services.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use gardenbook_core::{config, mailer::LogTransport, GardenBook};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod error;
pub mod pages;
pub mod routes;
pub mod session;
pub mod state;

#[cfg(test)]
mod test_support;

use state::AppState;

/// The full application router.
pub fn app(state: AppState) -> Router {
    routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Load config, start the core, serve until Ctrl+C or SIGTERM.
pub async fn run() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = config::get_or_init()
        .await
        .context("failed to load configuration")?;
    let bind = config.bind.clone();

    info!("Starting GardenBook...");
    let core = GardenBook::start(config, Arc::new(LogTransport))
        .await
        .context("failed to start core")?;

    let router = app(AppState::new(core.services.clone()));

    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!("Server running on {bind}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutting down...");
    core.shutdown().await.context("failed to stop core")?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(error) => {
                tracing::error!(%error, "failed to install signal handler");
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
}
