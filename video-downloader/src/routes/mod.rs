pub mod download;
mod health;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::middleware::api_secret_middleware;

/// Creates the router with all handler routes
///
/// The download routes sit behind the bearer secret check; `/health` is open.
#[must_use]
pub fn handler() -> Router {
    let download_routes = Router::new()
        .route("/download", post(download::download_video))
        .route("/api/download", post(download::download_video))
        .route_layer(middleware::from_fn(api_secret_middleware));

    Router::new()
        .route("/health", get(health::handler))
        .merge(download_routes)
}
