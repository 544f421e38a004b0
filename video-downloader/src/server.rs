use std::sync::Arc;

use axum::{Extension, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    downloader::VideoDownloader, media_storage::MediaStorage, routes, types::ServiceConfig,
};

/// Builds the application router with its shared dependencies
///
/// There is no request-wide timeout; the downloader enforces its own limit.
#[must_use]
pub fn router(
    config: Arc<ServiceConfig>,
    downloader: Arc<dyn VideoDownloader>,
    media_storage: Arc<dyn MediaStorage>,
) -> Router {
    routes::handler()
        .layer(Extension(config))
        .layer(Extension(downloader))
        .layer(Extension(media_storage))
        .layer(TraceLayer::new_for_http())
}

/// Starts the server with the given configuration and dependencies
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the port
pub async fn start(
    config: Arc<ServiceConfig>,
    downloader: Arc<dyn VideoDownloader>,
    media_storage: Arc<dyn MediaStorage>,
) -> anyhow::Result<()> {
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let router = router(config, downloader, media_storage);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🔄 Video downloader started on http://{addr}");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(anyhow::Error::from)
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining requests");
}
