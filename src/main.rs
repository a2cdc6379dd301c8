//! OCR Desk Server
//!
//! HTTP front end for docTR / Tesseract text extraction from images and PDFs.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ocr_desk_server::{app, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ocr_desk_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    tracing::info!("Starting OCR Desk Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        backend = ?config.engine.backend,
        doctr_url = %config.engine.doctr_url,
        tesseract = %config.engine.tesseract_path,
        "OCR engine"
    );

    let state = AppState::from_config(config.clone());

    // Report a missing OCR dependency early; extraction re-checks per request
    match state.extraction().check_dependencies().await {
        Ok(()) => tracing::info!("OCR backend reachable"),
        Err(e) => tracing::warn!("{}. Extractions will fail until it is available", e),
    }

    spawn_session_purge(state.clone(), config.sessions.purge_interval_secs);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.server.host, config.server.port))?;
    tracing::info!("OCR Desk Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Periodically drop idle sessions
fn spawn_session_purge(state: AppState, interval_secs: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        loop {
            interval.tick().await;
            state.sessions().purge_expired().await;
        }
    });
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
