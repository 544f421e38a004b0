use std::sync::Arc;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};
use video_downloader::{
    config_service,
    downloader::{VideoDownloader, YtDlp},
    media_storage::{MediaStorage, S3MediaStorage},
    server,
    types::{Environment, ServiceConfig},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let environment = Environment::from_env()?;

    // Configure logging format based on environment
    // Use JSON format for staging/production, regular format for development
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(environment.default_tracing_level()).into())
        .from_env_lossy();
    if environment.json_logs() {
        fmt().json().with_env_filter(filter).init();
    } else {
        fmt().with_env_filter(filter).init();
    }

    let mut config = ServiceConfig::from_env();
    let applied = config_service::load_overrides(&mut config).await;
    if applied > 0 {
        tracing::info!("Applied {applied} setting(s) from the config service");
    }

    let endpoint = config.storage.endpoint_base();
    tracing::info!(
        "Storage endpoint: {}",
        if endpoint.is_empty() { "(not set)" } else { endpoint }
    );
    if config.api_secret.is_none() {
        tracing::warn!("API_SECRET is not set, /download accepts unauthenticated requests");
    }

    let downloader: Arc<dyn VideoDownloader> = Arc::new(YtDlp::from_settings(&config.downloader));
    let media_storage: Arc<dyn MediaStorage> =
        Arc::new(S3MediaStorage::from_settings(&config.storage));

    server::start(Arc::new(config), downloader, media_storage).await
}
