//! HTTP front door for candidate lookups.
//!
//! One JSON endpoint, `GET /api/leader-details?name=<query>`, plus `/health`.
//! Every failure is mapped to a status code and an `{error, kind}` body; no
//! request can take the process down.

pub mod handlers;

use std::sync::Arc;

use disclosure_config::ServerConfig;
use disclosure_web::LookupService;
use tokio::net::TcpListener;

pub use handlers::{AppState, HealthResponse, create_router};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Bind `host:port` and serve until Ctrl-C.
pub async fn start_server(cfg: &ServerConfig, service: LookupService) -> Result<(), ServerError> {
    let addr = cfg.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind { addr: addr.clone(), source })?;

    let candidates = service.resolver().known_candidates();
    let app = create_router(AppState { service: Arc::new(service) });

    tracing::info!(%addr, ?candidates, "api.listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("api.stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "api.signal_handler_failed");
        // Without a handler we can only serve until killed.
        std::future::pending::<()>().await;
    }
    tracing::info!("api.shutdown_requested");
}
