//! `yt-dlp` download step
//!
//! The handler only sees the [`VideoDownloader`] trait so tests can swap the
//! subprocess for [`mock::MockVideoDownloader`].
mod error;
mod ytdlp;

use std::path::Path;

use serde::Deserialize;

pub use error::DownloadError;
pub use ytdlp::{ytdlp_args, YtDlp};

/// Placeholder `yt-dlp` replaces with the container extension
pub const EXT_PLACEHOLDER: &str = "%(ext)s";

/// What a successful download reports back
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// Video duration in whole seconds, 0 when unknown
    pub duration_secs: u64,
}

/// Runs a download for `url`, writing to `output_template`
#[async_trait::async_trait]
pub trait VideoDownloader: Send + Sync {
    /// Downloads `url` to `output_template`, where [`EXT_PLACEHOLDER`] stands
    /// for the container extension chosen by the downloader.
    async fn download(
        &self,
        url: &str,
        output_template: &Path,
    ) -> Result<DownloadOutcome, DownloadError>;
}

#[derive(Debug, Deserialize)]
struct PrintedInfo {
    #[serde(default)]
    duration: Option<serde_json::Number>,
}

/// Extracts the duration from `--print-json` output
///
/// Only the last non-empty line is read. Anything unparseable yields 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_duration(stdout: &str) -> u64 {
    let Some(last_line) = stdout.trim().lines().last() else {
        return 0;
    };

    match serde_json::from_str::<PrintedInfo>(last_line) {
        Ok(PrintedInfo {
            duration: Some(duration),
        }) => duration
            .as_u64()
            .or_else(|| {
                duration
                    .as_f64()
                    .filter(|secs| secs.is_finite() && *secs >= 0.0)
                    .map(|secs| secs.trunc() as u64)
            })
            .unwrap_or(0),
        Ok(_) => 0,
        Err(e) => {
            tracing::debug!("Could not parse yt-dlp metadata line: {e}");
            0
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    //! In-process stand-in for `yt-dlp`

    use std::{
        path::{Path, PathBuf},
        sync::Mutex,
        time::Duration,
    };

    use super::{DownloadError, DownloadOutcome, VideoDownloader, EXT_PLACEHOLDER};

    /// Scripted result of a mock download
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Writes `content` to the template with extension `ext`
        Succeed {
            /// Container extension written, e.g. `mp4`
            ext: String,
            /// File content
            content: Vec<u8>,
            /// Reported duration
            duration_secs: u64,
        },
        /// Succeeds without producing a video file
        SucceedWithoutFile,
        /// Exits non-zero with the given stderr
        Fail {
            /// Diagnostic output
            stderr: String,
        },
        /// Hits the wall-clock limit
        Timeout,
    }

    /// A single recorded call
    #[derive(Debug, Clone)]
    pub struct RecordedDownload {
        /// Requested URL
        pub url: String,
        /// Output template passed in
        pub output_template: PathBuf,
    }

    /// Mock downloader that follows a [`MockBehavior`]
    pub struct MockVideoDownloader {
        behavior: MockBehavior,
        calls: Mutex<Vec<RecordedDownload>>,
    }

    impl MockVideoDownloader {
        /// Creates a mock following `behavior`
        #[must_use]
        pub const fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior,
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Succeeds with an mp4 of `content`
        #[must_use]
        pub fn succeeding(content: &[u8], duration_secs: u64) -> Self {
            Self::new(MockBehavior::Succeed {
                ext: "mp4".to_string(),
                content: content.to_vec(),
                duration_secs,
            })
        }

        /// Calls received so far
        ///
        /// # Panics
        ///
        /// If the internal lock is poisoned
        #[must_use]
        pub fn calls(&self) -> Vec<RecordedDownload> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl VideoDownloader for MockVideoDownloader {
        async fn download(
            &self,
            url: &str,
            output_template: &Path,
        ) -> Result<DownloadOutcome, DownloadError> {
            self.calls.lock().unwrap().push(RecordedDownload {
                url: url.to_string(),
                output_template: output_template.to_path_buf(),
            });

            match &self.behavior {
                MockBehavior::Succeed {
                    ext,
                    content,
                    duration_secs,
                } => {
                    let target = output_template
                        .to_string_lossy()
                        .replace(EXT_PLACEHOLDER, ext);
                    tokio::fs::write(&target, content).await?;
                    Ok(DownloadOutcome {
                        duration_secs: *duration_secs,
                    })
                }
                MockBehavior::SucceedWithoutFile => Ok(DownloadOutcome::default()),
                MockBehavior::Fail { stderr } => Err(DownloadError::Failed {
                    code: Some(1),
                    stderr: stderr.clone(),
                }),
                MockBehavior::Timeout => Err(DownloadError::Timeout(Duration::from_secs(600))),
            }
        }
    }
}
