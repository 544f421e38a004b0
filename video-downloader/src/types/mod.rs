mod config;
mod environment;
mod error;
mod extractors;

pub use config::{ConfigError, DownloaderSettings, ServiceConfig, StorageSettings};
pub use environment::Environment;
pub use error::AppError;
pub use extractors::ValidatedJson;
