//! Remote config service overlay
//!
//! At startup the service may pull a handful of settings from a key/value
//! config service (`GET {base}/api/v1/config/{key}` → `{"value": "..."}`).
//! Every failure is logged and skipped; the environment values stay in place.
mod error;

use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

pub use error::ConfigServiceError;

use crate::types::ServiceConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Keys the service knows how to overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    /// Storage endpoint URL
    MinioEndpoint,
    /// Storage access key
    MinioAccessKey,
    /// Storage secret key
    MinioSecretKey,
    /// Bearer secret for `/download`
    ApiSecret,
}

impl ConfigKey {
    /// Every overlay key
    pub const ALL: [Self; 4] = [
        Self::MinioEndpoint,
        Self::MinioAccessKey,
        Self::MinioSecretKey,
        Self::ApiSecret,
    ];

    /// Name of the key on the config service
    #[must_use]
    pub const fn remote_name(self) -> &'static str {
        match self {
            Self::MinioEndpoint => "MINIO_ENDPOINT",
            Self::MinioAccessKey => "MINIO_ACCESS_KEY",
            Self::MinioSecretKey => "MINIO_SECRET_KEY",
            Self::ApiSecret => "YT_DLP_API_SECRET",
        }
    }

    /// Writes `value` into the matching setting
    pub fn apply(self, config: &mut ServiceConfig, value: String) {
        match self {
            Self::MinioEndpoint => config.storage.endpoint = value,
            Self::MinioAccessKey => config.storage.access_key = value,
            Self::MinioSecretKey => config.storage.secret_key = value,
            Self::ApiSecret => config.api_secret = Some(value),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigValue {
    #[serde(default)]
    value: Option<String>,
}

/// HTTP client for the config service
#[derive(Debug, Clone)]
pub struct ConfigServiceClient {
    http: reqwest::Client,
    base_url: String,
}

impl ConfigServiceClient {
    /// Creates a client for `base_url`; a trailing slash is ignored
    ///
    /// # Errors
    ///
    /// Returns `ConfigServiceError::Request` if the HTTP client cannot be built
    pub fn new(base_url: &str) -> Result<Self, ConfigServiceError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL queried for `key`
    #[must_use]
    pub fn key_url(&self, key: &str) -> String {
        format!("{}/api/v1/config/{key}", self.base_url)
    }

    /// Fetches `key`, returning `None` when the service has no usable value
    ///
    /// # Errors
    ///
    /// Returns a `ConfigServiceError` on network failures, timeouts, non-2xx
    /// statuses and malformed bodies
    pub async fn fetch(&self, key: &str) -> Result<Option<String>, ConfigServiceError> {
        let response = self.http.get(self.key_url(key)).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConfigServiceError::Status(status));
        }

        let body: ConfigValue = response
            .json()
            .await
            .map_err(|e| ConfigServiceError::Body(e.to_string()))?;

        Ok(body.value.filter(|value| !value.trim().is_empty()))
    }
}

/// Fetches every [`ConfigKey`] concurrently and applies the ones that resolve
///
/// Returns the number of settings overridden.
pub async fn apply_overrides(client: &ConfigServiceClient, config: &mut ServiceConfig) -> usize {
    let fetches = ConfigKey::ALL.map(|key| async move { (key, client.fetch(key.remote_name()).await) });
    let results = futures::future::join_all(fetches).await;

    let mut applied = 0;
    for (key, result) in results {
        let name = key.remote_name();
        match result {
            Ok(Some(value)) => {
                key.apply(config, value);
                info!("Loaded {name} from config service");
                applied += 1;
            }
            Ok(None) => warn!("Config service returned no value for {name}"),
            Err(e) => warn!("Failed to load {name} from config service: {e}"),
        }
    }
    applied
}

/// Overlays `config` from its config service, if one is configured
pub async fn load_overrides(config: &mut ServiceConfig) -> usize {
    let Some(base_url) = config.config_service_url.clone() else {
        return 0;
    };

    match ConfigServiceClient::new(&base_url) {
        Ok(client) => apply_overrides(&client, config).await,
        Err(e) => {
            warn!("Could not create config service client: {e}");
            0
        }
    }
}
