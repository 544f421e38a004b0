//! Process-wide service configuration
//!
//! Built once at startup from the environment, optionally overlaid by the
//! remote config service, then shared read-only with every request.

use std::{env, fmt, path::PathBuf, time::Duration};

use thiserror::Error;

/// Default listening port
pub const DEFAULT_PORT: u16 = 8000;
/// Default bucket for uploaded videos
pub const DEFAULT_BUCKET: &str = "source";
/// Default downloader executable, resolved on `PATH`
pub const DEFAULT_YT_DLP_PROGRAM: &str = "yt-dlp";
/// Default wall-clock limit for a single download
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 600;

/// Configuration errors raised at startup
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `APP_ENV` holds an unknown value
    #[error("Invalid environment: {0}")]
    InvalidEnvironment(String),
}

/// S3-compatible storage settings
#[derive(Clone, Default, PartialEq, Eq)]
pub struct StorageSettings {
    /// Endpoint URL, e.g. `http://minio:9000`
    pub endpoint: String,
    /// Static access key
    pub access_key: String,
    /// Static secret key
    pub secret_key: String,
    /// Bucket receiving the uploads
    pub bucket: String,
}

impl StorageSettings {
    /// Endpoint with any trailing slash removed
    #[must_use]
    pub fn endpoint_base(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }
}

impl fmt::Debug for StorageSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageSettings")
            .field("endpoint", &self.endpoint)
            .field("access_key", &redact(&self.access_key))
            .field("secret_key", &redact(&self.secret_key))
            .field("bucket", &self.bucket)
            .finish()
    }
}

/// `yt-dlp` invocation settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloaderSettings {
    /// Executable name or path
    pub program: PathBuf,
    /// Hard wall-clock limit for one download
    pub timeout: Duration,
}

impl Default for DownloaderSettings {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_YT_DLP_PROGRAM),
            timeout: Duration::from_secs(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
        }
    }
}

/// Service configuration shared by all requests
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Object store settings
    pub storage: StorageSettings,
    /// Bearer secret; `None` disables authentication
    pub api_secret: Option<String>,
    /// Base URL of the remote config service
    pub config_service_url: Option<String>,
    /// Listening port
    pub port: u16,
    /// Downloader settings
    pub downloader: DownloaderSettings,
    /// Parent directory for per-request temp dirs; the OS temp dir when `None`
    pub work_dir: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            storage: StorageSettings {
                bucket: DEFAULT_BUCKET.to_string(),
                ..StorageSettings::default()
            },
            api_secret: None,
            config_service_url: None,
            port: DEFAULT_PORT,
            downloader: DownloaderSettings::default(),
            work_dir: None,
        }
    }
}

impl ServiceConfig {
    /// Reads the configuration from the process environment
    ///
    /// The binary loads `.env` before calling this.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(env_var)
    }

    /// Builds the configuration from an arbitrary key lookup
    ///
    /// Blank values are treated as unset and unparseable numbers fall back to
    /// their defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let timeout_secs = get("DOWNLOAD_TIMEOUT_SECS")
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_DOWNLOAD_TIMEOUT_SECS);

        Self {
            storage: StorageSettings {
                endpoint: get("MINIO_ENDPOINT").unwrap_or_default(),
                access_key: get("MINIO_ACCESS_KEY").unwrap_or_default(),
                secret_key: get("MINIO_SECRET_KEY").unwrap_or_default(),
                bucket: get("MINIO_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            },
            api_secret: get("API_SECRET"),
            config_service_url: get("APP_CONFIG_URL"),
            port: get("PORT")
                .and_then(|value| value.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            downloader: DownloaderSettings {
                program: get("YT_DLP_PATH")
                    .map_or_else(|| PathBuf::from(DEFAULT_YT_DLP_PROGRAM), PathBuf::from),
                timeout: Duration::from_secs(timeout_secs),
            },
            work_dir: get("DOWNLOAD_WORK_DIR").map(PathBuf::from),
        }
    }

}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("storage", &self.storage)
            .field("api_secret", &self.api_secret.as_deref().map(redact))
            .field("config_service_url", &self.config_service_url)
            .field("port", &self.port)
            .field("downloader", &self.downloader)
            .field("work_dir", &self.work_dir)
            .finish()
    }
}

fn env_var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() {
        "(not set)"
    } else {
        "***"
    }
}
