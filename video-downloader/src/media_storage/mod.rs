//! S3-compatible storage for downloaded videos
mod error;
mod s3;

use std::path::Path;

pub use error::{BucketError, BucketResult};
pub use s3::{s3_client_config, S3MediaStorage, MULTIPART_PART_SIZE, STORAGE_REGION};

/// Prefix under which downloaded videos are stored
pub const OBJECT_KEY_PREFIX: &str = "youtube";

/// Object key for a working identifier, `youtube/{id}.mp4`
#[must_use]
pub fn object_key(video_id: &str) -> String {
    format!("{OBJECT_KEY_PREFIX}/{video_id}.mp4")
}

/// Object storage the handler uploads into
#[async_trait::async_trait]
pub trait MediaStorage: Send + Sync {
    /// Uploads the file at `path` under `key`
    ///
    /// # Errors
    ///
    /// Returns a `BucketError` if the file cannot be read or the upload fails
    async fn put_file(&self, path: &Path, key: &str, content_type: &str) -> BucketResult<()>;

    /// Public URL of the object stored under `key`
    fn object_url(&self, key: &str) -> String;
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    //! In-memory storage recording every upload

    use std::{
        path::Path,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
        time::Duration,
    };

    use super::{BucketError, BucketResult, MediaStorage};

    /// An object captured by [`MockMediaStorage`]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct StoredObject {
        /// Object key
        pub key: String,
        /// Declared content type
        pub content_type: String,
        /// Bytes read from the local file at upload time
        pub body: Vec<u8>,
    }

    /// Storage double that keeps uploads in memory
    pub struct MockMediaStorage {
        endpoint: String,
        bucket: String,
        fail_with: Option<String>,
        upload_delay: Option<Duration>,
        attempts: AtomicUsize,
        objects: Mutex<Vec<StoredObject>>,
    }

    impl MockMediaStorage {
        /// Creates a mock that accepts every upload
        #[must_use]
        pub fn new(endpoint: &str, bucket: &str) -> Self {
            Self {
                endpoint: endpoint.trim_end_matches('/').to_string(),
                bucket: bucket.to_string(),
                fail_with: None,
                upload_delay: None,
                attempts: AtomicUsize::new(0),
                objects: Mutex::new(Vec::new()),
            }
        }

        /// Creates a mock that rejects every upload with `message`
        #[must_use]
        pub fn failing(endpoint: &str, bucket: &str, message: &str) -> Self {
            Self {
                fail_with: Some(message.to_string()),
                ..Self::new(endpoint, bucket)
            }
        }

        /// Makes every upload take `delay` before completing
        #[must_use]
        pub const fn with_upload_delay(mut self, delay: Duration) -> Self {
            self.upload_delay = Some(delay);
            self
        }

        /// Uploaded objects, oldest first
        ///
        /// # Panics
        ///
        /// If the internal lock is poisoned
        #[must_use]
        pub fn objects(&self) -> Vec<StoredObject> {
            self.objects.lock().unwrap().clone()
        }

        /// Number of upload attempts, failed ones included
        #[must_use]
        pub fn upload_count(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl MediaStorage for MockMediaStorage {
        async fn put_file(&self, path: &Path, key: &str, content_type: &str) -> BucketResult<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.upload_delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(message) = &self.fail_with {
                return Err(BucketError::S3Error(message.clone()));
            }

            let body = tokio::fs::read(path)
                .await
                .map_err(|e| BucketError::ReadError(e.to_string()))?;

            self.objects.lock().unwrap().push(StoredObject {
                key: key.to_string(),
                content_type: content_type.to_string(),
                body,
            });
            Ok(())
        }

        fn object_url(&self, key: &str) -> String {
            format!("{}/{}/{key}", self.endpoint, self.bucket)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_key_is_derived_from_video_id() {
        assert_eq!(object_key("dQw4w9WgXcQ"), "youtube/dQw4w9WgXcQ.mp4");
    }
}
