//! Universal error handling for the API

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{downloader::DownloadError, media_storage::BucketError, staging::StagingError};

/// Maximum number of downloader diagnostic characters echoed to the client
pub const MAX_DIAGNOSTIC_CHARS: usize = 500;

/// Error body returned to clients
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    /// Human-readable error message
    pub error: String,
    /// Machine-readable error code
    pub code: &'static str,
}

/// Application error carrying the HTTP status and the client-facing message
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    inner: ApiErrorResponse,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            inner: ApiErrorResponse {
                error: message.into(),
                code,
            },
        }
    }

    /// 400 for a request that fails validation
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", message)
    }

    /// 401 for a missing or mismatched bearer token
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", "Unauthorized")
    }

    /// 500 when the downloader reported success but left no video behind
    #[must_use]
    pub fn no_video_file() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "no_video_file",
            "No video file found after download",
        )
    }

    /// HTTP status of this error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Client-facing message
    #[must_use]
    pub fn message(&self) -> &str {
        &self.inner.error
    }

    /// Machine-readable code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.inner.code
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error based on status code
        match self.status.as_u16() {
            400..=499 => tracing::warn!(
                "Client error: {} - {}",
                self.inner.code,
                self.inner.error
            ),
            500..=599 => tracing::error!(
                "Server error: {} - {}",
                self.inner.code,
                self.inner.error
            ),
            _ => {}
        }

        (self.status, Json(self.inner)).into_response()
    }
}

/// Convert downloader errors to application errors
impl From<DownloadError> for AppError {
    fn from(err: DownloadError) -> Self {
        match &err {
            DownloadError::Timeout(limit) => {
                tracing::error!("yt-dlp exceeded {}s limit", limit.as_secs());
                Self::new(
                    StatusCode::GATEWAY_TIMEOUT,
                    "download_timeout",
                    format!("Download timed out ({} limit)", describe_limit(*limit)),
                )
            }
            DownloadError::Failed { stderr, .. } => {
                tracing::error!("{err}, stderr: {stderr}");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "download_failed",
                    format!("Download failed: {}", truncate_chars(stderr, MAX_DIAGNOSTIC_CHARS)),
                )
            }
            DownloadError::Spawn { .. } | DownloadError::Io(_) => {
                tracing::error!("yt-dlp could not be run: {err}");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "download_failed",
                    format!(
                        "Download failed: {}",
                        truncate_chars(&err.to_string(), MAX_DIAGNOSTIC_CHARS)
                    ),
                )
            }
        }
    }
}

/// Convert bucket errors to application errors
impl From<BucketError> for AppError {
    fn from(err: BucketError) -> Self {
        tracing::error!("Storage upload failed: {err}");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "upload_failed",
            format!("Upload to storage failed: {err}"),
        )
    }
}

/// Convert staging errors to application errors
impl From<StagingError> for AppError {
    fn from(err: StagingError) -> Self {
        tracing::error!("Staging error: {err}");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Internal server error",
        )
    }
}

/// Human-readable timeout: whole minutes when possible, seconds otherwise
fn describe_limit(limit: Duration) -> String {
    let secs = limit.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        format!("{} min", secs / 60)
    } else {
        format!("{secs}s")
    }
}

/// Returns at most `max` characters of `text`, never splitting a character
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> &str {
    text.char_indices()
        .nth(max)
        .map_or(text, |(byte_index, _)| &text[..byte_index])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate_chars("short", 500), "short");
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        let text = "é".repeat(600);
        let truncated = truncate_chars(&text, 500);
        assert_eq!(truncated.chars().count(), 500);
        assert_eq!(truncated.len(), 1000);
    }

    #[test]
    fn timeout_maps_to_gateway_timeout() {
        let err = AppError::from(DownloadError::Timeout(Duration::from_secs(600)));
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(err.message(), "Download timed out (10 min limit)");
    }

    #[test]
    fn short_timeouts_are_reported_in_seconds() {
        let err = AppError::from(DownloadError::Timeout(Duration::from_secs(30)));
        assert_eq!(err.message(), "Download timed out (30s limit)");

        let err = AppError::from(DownloadError::Timeout(Duration::from_secs(90)));
        assert_eq!(err.message(), "Download timed out (90s limit)");
    }

    #[test]
    fn failed_download_echoes_bounded_stderr() {
        let stderr = format!("ERROR: {}", "x".repeat(2_000));
        let err = AppError::from(DownloadError::Failed {
            code: Some(1),
            stderr,
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "download_failed");
        let excerpt = err.message().strip_prefix("Download failed: ").unwrap();
        assert_eq!(excerpt.chars().count(), MAX_DIAGNOSTIC_CHARS);
        assert!(excerpt.starts_with("ERROR: "));
    }

    #[test]
    fn bucket_error_maps_to_upload_failure() {
        let err = AppError::from(BucketError::S3Error("NoSuchBucket".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "upload_failed");
        assert!(err.message().contains("NoSuchBucket"));
    }
}
