//! Per-request staging directory
//!
//! Every request downloads into its own temporary directory. The directory is
//! removed when [`StagingDir`] is dropped, which covers success, error
//! responses, panics and cancelled requests alike.

use std::{
    io,
    path::{Path, PathBuf},
};

use tempfile::TempDir;
use thiserror::Error;

use crate::downloader::EXT_PLACEHOLDER;

const STAGING_PREFIX: &str = "video-dl-";

/// Errors raised while preparing or scanning the staging directory
#[derive(Error, Debug)]
pub enum StagingError {
    /// The temporary directory could not be created
    #[error("failed to create staging directory: {0}")]
    Create(#[source] io::Error),

    /// The staging directory could not be read
    #[error("failed to scan staging directory: {0}")]
    Scan(#[source] io::Error),
}

/// Video containers the downloader is expected to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VideoContainer {
    /// MPEG-4
    Mp4,
    /// Matroska
    Mkv,
    /// `WebM`
    Webm,
}

impl VideoContainer {
    /// Detects the container from a file name's extension
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "mp4" => Some(Self::Mp4),
            "mkv" => Some(Self::Mkv),
            "webm" => Some(Self::Webm),
            _ => None,
        }
    }

    /// MIME type stored with the uploaded object
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Mp4 => "video/mp4",
            Self::Mkv => "video/x-matroska",
            Self::Webm => "video/webm",
        }
    }
}

/// A downloaded video found in the staging directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedVideo {
    /// Location on disk
    pub path: PathBuf,
    /// Container detected from the extension
    pub container: VideoContainer,
}

impl StagedVideo {
    /// File name for logging
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Temporary directory owned by a single request
#[derive(Debug)]
pub struct StagingDir {
    dir: TempDir,
}

impl StagingDir {
    /// Creates a fresh directory under `root`, or under the OS temp dir
    ///
    /// # Errors
    ///
    /// Returns `StagingError::Create` if the directory cannot be created
    pub fn create(root: Option<&Path>) -> Result<Self, StagingError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGING_PREFIX);
        let dir = match root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(StagingError::Create)?;

        Ok(Self { dir })
    }

    /// Directory path
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Output template handed to the downloader, `{dir}/{id}.%(ext)s`
    ///
    /// `%` in the identifier is doubled so `yt-dlp` writes it literally.
    #[must_use]
    pub fn output_template(&self, video_id: &str) -> PathBuf {
        let escaped = video_id.replace('%', "%%");
        self.path().join(format!("{escaped}.{EXT_PLACEHOLDER}"))
    }

    /// Finds the downloaded video
    ///
    /// mp4 is preferred over mkv over webm; ties are broken by file name so
    /// the choice is deterministic.
    ///
    /// # Errors
    ///
    /// Returns `StagingError::Scan` if the directory cannot be read
    pub async fn find_video(&self) -> Result<Option<StagedVideo>, StagingError> {
        let mut entries = tokio::fs::read_dir(self.path())
            .await
            .map_err(StagingError::Scan)?;

        let mut best: Option<StagedVideo> = None;
        while let Some(entry) = entries.next_entry().await.map_err(StagingError::Scan)? {
            let path = entry.path();
            let Some(container) = VideoContainer::from_path(&path) else {
                continue;
            };
            if !entry.file_type().await.map_err(StagingError::Scan)?.is_file() {
                continue;
            }

            let candidate = StagedVideo { path, container };
            let better = best.as_ref().is_none_or(|current| {
                (candidate.container, &candidate.path) < (current.container, &current.path)
            });
            if better {
                best = Some(candidate);
            }
        }

        Ok(best)
    }
}
