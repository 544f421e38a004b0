//! `POST /download`: fetch a video with `yt-dlp` and store it in the bucket

use std::{borrow::Cow, sync::Arc};

use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::{field, info, instrument, Span};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    downloader::VideoDownloader,
    media_storage::{object_key, MediaStorage},
    staging::{StagingDir, StagingError},
    types::{AppError, ServiceConfig, ValidatedJson},
};

/// Length of the identifier generated when the client sends none
const GENERATED_ID_LEN: usize = 8;

/// Download request body
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    /// Video page URL handed to `yt-dlp`
    #[serde(default)]
    #[validate(custom(function = "validate_url"))]
    pub url: String,
    /// Identifier used for the object key; generated when absent or blank
    #[serde(default)]
    #[validate(custom(function = "validate_video_id"))]
    pub video_id: Option<String>,
}

impl DownloadRequest {
    /// Client identifier, or a fresh random one
    #[must_use]
    pub fn resolved_video_id(&self) -> String {
        self.video_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map_or_else(random_video_id, ToString::to_string)
    }
}

/// Download response body
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    /// Public URL of the stored object
    pub source_url: String,
    /// Video duration in whole seconds, 0 when unknown
    pub duration: u64,
    /// Size of the uploaded file in bytes
    pub file_size: u64,
}

fn validate_url(url: &str) -> Result<(), ValidationError> {
    if url.trim().is_empty() {
        return Err(ValidationError::new("required").with_message(Cow::Borrowed("url is required")));
    }
    Ok(())
}

/// Rejects identifiers that could escape the staging directory or the
/// `youtube/` prefix; anything else is accepted as-is
fn validate_video_id(video_id: &str) -> Result<(), ValidationError> {
    let video_id = video_id.trim();
    let escapes = video_id.starts_with('.')
        || video_id.contains(['/', '\\', '\0']);
    if escapes {
        return Err(ValidationError::new("video_id").with_message(Cow::Borrowed(
            "videoId must not contain path separators or start with '.'",
        )));
    }
    Ok(())
}

fn random_video_id() -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(GENERATED_ID_LEN)
        .collect()
}

/// Downloads the requested video and uploads it to object storage
///
/// 1. Resolves the working identifier (client `videoId` or a random token)
/// 2. Runs the downloader into a fresh per-request directory
/// 3. Picks the produced video file and uploads it under `youtube/{id}.mp4`
///
/// The staging directory is removed when this function returns, whatever the
/// outcome.
///
/// # Errors
///
/// - `DownloadError::Timeout` - 504, nothing is uploaded
/// - `DownloadError::Failed` / `Spawn` - 500 with a bounded stderr excerpt
/// - no video file after a successful run - 500
/// - `BucketError` - 500 when the upload fails
#[instrument(skip_all, fields(video_id = field::Empty))]
pub async fn download_video(
    Extension(config): Extension<Arc<ServiceConfig>>,
    Extension(downloader): Extension<Arc<dyn VideoDownloader>>,
    Extension(storage): Extension<Arc<dyn MediaStorage>>,
    ValidatedJson(payload): ValidatedJson<DownloadRequest>,
) -> Result<Json<DownloadResponse>, AppError> {
    let url = payload.url.trim();
    let video_id = payload.resolved_video_id();
    Span::current().record("video_id", video_id.as_str());
    info!("Downloading {url}");

    let staging = StagingDir::create(config.work_dir.as_deref())?;
    let outcome = downloader
        .download(url, &staging.output_template(&video_id))
        .await?;

    let video = staging
        .find_video()
        .await?
        .ok_or_else(AppError::no_video_file)?;
    let file_size = tokio::fs::metadata(&video.path)
        .await
        .map_err(StagingError::Scan)?
        .len();
    info!("Downloaded {} ({file_size} bytes)", video.file_name());

    let key = object_key(&video_id);
    storage
        .put_file(&video.path, &key, video.container.content_type())
        .await?;
    let source_url = storage.object_url(&key);
    info!("Stored {key} at {source_url}");

    Ok(Json(DownloadResponse {
        source_url,
        duration: outcome.duration_secs,
        file_size,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str, video_id: Option<&str>) -> DownloadRequest {
        DownloadRequest {
            url: url.to_string(),
            video_id: video_id.map(ToString::to_string),
        }
    }

    #[test]
    fn blank_url_is_rejected() {
        assert!(request("", None).validate().is_err());
        assert!(request("   ", None).validate().is_err());
        assert!(request("https://youtu.be/abc", None).validate().is_ok());
    }

    #[test]
    fn ordinary_video_ids_are_accepted() {
        let long = "x".repeat(200);
        for video_id in ["dQw4w9WgXcQ", "a_b-C9", "ep.1", "my video", "a..b", "", long.as_str()] {
            assert!(
                request("u", Some(video_id)).validate().is_ok(),
                "{video_id:?} should be accepted"
            );
        }
    }

    #[test]
    fn path_escaping_video_ids_are_rejected() {
        for video_id in ["../etc", "..", ".hidden", "a/b", "a\\b", "a\0b", "/abs"] {
            assert!(
                request("u", Some(video_id)).validate().is_err(),
                "{video_id:?} should be rejected"
            );
        }
    }

    #[test]
    fn client_video_id_is_kept() {
        assert_eq!(
            request("u", Some(" dQw4w9WgXcQ ")).resolved_video_id(),
            "dQw4w9WgXcQ"
        );
    }

    #[test]
    fn missing_or_blank_video_id_is_generated() {
        for video_id in [None, Some(""), Some("  ")] {
            let id = request("u", video_id).resolved_video_id();
            assert_eq!(id.len(), GENERATED_ID_LEN);
            assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn request_uses_camel_case() {
        let parsed: DownloadRequest =
            serde_json::from_str(r#"{"url":"https://youtu.be/abc","videoId":"abc"}"#).unwrap();
        assert_eq!(parsed.video_id.as_deref(), Some("abc"));

        let body = serde_json::to_value(DownloadResponse {
            source_url: "http://minio:9000/source/youtube/abc.mp4".to_string(),
            duration: 212,
            file_size: 1024,
        })
        .unwrap();
        assert_eq!(body["sourceUrl"], "http://minio:9000/source/youtube/abc.mp4");
        assert_eq!(body["duration"], 212);
        assert_eq!(body["fileSize"], 1024);
    }
}
