//! Video downloader service
//!
//! Downloads a video with `yt-dlp` and uploads the result to an S3-compatible
//! object store.

#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(missing_docs, dead_code)]

/// Remote config service overlay
pub mod config_service;

/// `yt-dlp` subprocess wrapper
pub mod downloader;

/// S3-compatible object storage
pub mod media_storage;

/// HTTP middleware
pub mod middleware;

/// HTTP routes
pub mod routes;

/// HTTP server bootstrap
pub mod server;

/// Per-request temporary directories
pub mod staging;

/// Shared types: configuration, environment, errors, extractors
pub mod types;
