use reqwest::StatusCode;
use thiserror::Error;

/// Failures fetching a single key from the config service
#[derive(Error, Debug)]
pub enum ConfigServiceError {
    /// The request could not be sent or timed out
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("unexpected status {0}")]
    Status(StatusCode),

    /// The body was not the expected `{"value": ...}` document
    #[error("malformed response body: {0}")]
    Body(String),
}
