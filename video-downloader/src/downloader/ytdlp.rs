//! `yt-dlp` subprocess implementation

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use tokio::process::Command;
use tracing::{debug, info};

use super::{parse_duration, DownloadError, DownloadOutcome, VideoDownloader};
use crate::types::DownloaderSettings;

/// Browser user agent presented to the video site
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";
/// Best mp4 video + m4a audio, falling back to the best single file
const FORMAT_SELECTOR: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";
const EXTRACTOR_ARGS: &str = "youtube:player_client=web_music,web";

/// Builds the fixed `yt-dlp` argument list
#[must_use]
pub fn ytdlp_args(url: &str, output_template: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "--no-playlist",
        "--js-runtimes",
        "node",
        "--force-ipv4",
        "--extractor-args",
        EXTRACTOR_ARGS,
        "--user-agent",
        USER_AGENT,
        "-f",
        FORMAT_SELECTOR,
        "--merge-output-format",
        "mp4",
        "-o",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();

    args.push(output_template.as_os_str().to_os_string());
    args.extend(["--no-progress", "--print-json"].map(OsString::from));
    args.push(OsString::from(url));
    args
}

/// Downloader backed by the `yt-dlp` executable
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
    timeout: Duration,
}

impl YtDlp {
    /// Creates a downloader running `program` with a hard `timeout`
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Creates a downloader from the service settings
    #[must_use]
    pub fn from_settings(settings: &DownloaderSettings) -> Self {
        Self::new(settings.program.clone(), settings.timeout)
    }
}

#[async_trait::async_trait]
impl VideoDownloader for YtDlp {
    async fn download(
        &self,
        url: &str,
        output_template: &Path,
    ) -> Result<DownloadOutcome, DownloadError> {
        let args = ytdlp_args(url, output_template);
        debug!(
            "Running: {} {}",
            self.program.display(),
            args.iter()
                .map(|arg| arg.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the wait future on timeout or cancellation kills yt-dlp
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| DownloadError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| DownloadError::Timeout(self.timeout))??;

        if !output.status.success() {
            return Err(DownloadError::Failed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let duration_secs = parse_duration(&stdout);
        info!("yt-dlp finished for {url} (duration: {duration_secs}s)");

        Ok(DownloadOutcome { duration_secs })
    }
}
