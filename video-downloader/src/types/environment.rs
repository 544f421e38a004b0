//! Environment configuration for different deployment stages

use std::env;

use tracing::Level;

use super::ConfigError;

/// Application environment configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (local `MinIO`, human-readable logs)
    Development,
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// Defaults to development when `APP_ENV` is not set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvironment` if `APP_ENV` contains an invalid value
    pub fn from_env() -> Result<Self, ConfigError> {
        env::var("APP_ENV").map_or(Ok(Self::Development), |value| Self::parse(&value))
    }

    /// Parses an environment name, case-insensitively
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvironment` for unknown names
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" | "" => Ok(Self::Development),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }

    /// Whether logs should be emitted as JSON lines
    #[must_use]
    pub const fn json_logs(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }

    /// Default tracing level when `RUST_LOG` is not set
    #[must_use]
    pub const fn default_tracing_level(&self) -> Level {
        match self {
            Self::Production | Self::Staging => Level::INFO,
            Self::Development => Level::DEBUG,
        }
    }
}
