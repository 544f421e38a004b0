//! Error types for bucket operations

use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use thiserror::Error;

/// Result type for bucket operations
pub type BucketResult<T> = Result<T, BucketError>;

/// Errors that can occur during bucket operations
#[derive(Error, Debug)]
pub enum BucketError {
    /// S3 service or transport error
    #[error("S3 service error: {0}")]
    S3Error(String),

    /// Storage is not configured well enough to upload
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The local file could not be read
    #[error("Failed to read local file: {0}")]
    ReadError(String),
}

impl<E, R> From<SdkError<E, R>> for BucketError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    fn from(error: SdkError<E, R>) -> Self {
        Self::S3Error(DisplayErrorContext(&error).to_string())
    }
}
