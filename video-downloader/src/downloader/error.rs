//! Error types for the download step

use std::{io, path::PathBuf, time::Duration};

use thiserror::Error;

/// Errors that can occur while running the downloader
#[derive(Error, Debug)]
pub enum DownloadError {
    /// The wall-clock limit elapsed; the child was killed
    #[error("yt-dlp timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The downloader exited unsuccessfully
    #[error("yt-dlp {}", describe_exit(.code.as_ref()))]
    Failed {
        /// Exit code, `None` when killed by a signal
        code: Option<i32>,
        /// Captured diagnostic output
        stderr: String,
    },

    /// The executable could not be started
    #[error("failed to start {}: {source}", .program.display())]
    Spawn {
        /// Program that was attempted
        program: PathBuf,
        /// Underlying OS error
        source: io::Error,
    },

    /// I/O failure while collecting output
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn describe_exit(code: Option<&i32>) -> String {
    code.map_or_else(
        || "was terminated by a signal".to_string(),
        |code| format!("exited with code {code}"),
    )
}
