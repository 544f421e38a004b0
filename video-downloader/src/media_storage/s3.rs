//! `aws-sdk-s3` implementation of [`MediaStorage`]

use std::{path::Path, time::Duration};

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion, Region};
use aws_sdk_s3::{
    config::{Credentials, RequestChecksumCalculation},
    primitives::{ByteStream, Length},
    types::{CompletedMultipartUpload, CompletedPart},
    Client,
};
use tracing::{debug, info, warn};

use super::{BucketError, BucketResult, MediaStorage};
use crate::types::StorageSettings;

/// Region sent with every request; S3-compatible stores ignore it
pub const STORAGE_REGION: &str = "us-east-1";
/// Files above this size go through multipart upload, in parts of this size
pub const MULTIPART_PART_SIZE: u64 = 16 * 1024 * 1024;
const MAX_ATTEMPTS: u32 = 3;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const CREDENTIALS_PROVIDER: &str = "service-config";

/// Builds the S3 client configuration for an S3-compatible endpoint
///
/// Static credentials, SigV4, a fixed region and path-style addressing. The
/// endpoint's trailing slash is stripped; an empty endpoint leaves the SDK
/// default in place.
#[must_use]
pub fn s3_client_config(settings: &StorageSettings) -> aws_sdk_s3::Config {
    let credentials = Credentials::new(
        settings.access_key.clone(),
        settings.secret_key.clone(),
        None,
        None,
        CREDENTIALS_PROVIDER,
    );

    let retry_config = RetryConfig::standard()
        .with_max_attempts(MAX_ATTEMPTS)
        .with_initial_backoff(Duration::from_millis(50));

    let timeout_config = TimeoutConfig::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build();

    let mut builder = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(STORAGE_REGION))
        .credentials_provider(credentials)
        .retry_config(retry_config)
        .timeout_config(timeout_config)
        // MinIO and friends do not all accept the newer default checksums
        .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
        .force_path_style(true);

    let endpoint = settings.endpoint_base();
    if !endpoint.is_empty() {
        builder = builder.endpoint_url(endpoint);
    }

    builder.build()
}

/// Video storage client for an S3-compatible bucket
pub struct S3MediaStorage {
    client: Client,
    endpoint: String,
    bucket: String,
}

impl S3MediaStorage {
    /// Creates a storage client around a pre-configured S3 client
    #[must_use]
    pub fn new(client: Client, settings: &StorageSettings) -> Self {
        Self {
            client,
            endpoint: settings.endpoint_base().to_string(),
            bucket: settings.bucket.clone(),
        }
    }

    /// Creates a storage client from the service settings
    #[must_use]
    pub fn from_settings(settings: &StorageSettings) -> Self {
        Self::new(Client::from_conf(s3_client_config(settings)), settings)
    }

    async fn put_single(&self, path: &Path, key: &str, content_type: &str) -> BucketResult<()> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| BucketError::ReadError(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(body)
            .send()
            .await?;

        Ok(())
    }

    async fn put_multipart(
        &self,
        path: &Path,
        key: &str,
        content_type: &str,
        size: u64,
    ) -> BucketResult<()> {
        let upload = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .send()
            .await?;

        let upload_id = upload
            .upload_id()
            .ok_or_else(|| BucketError::S3Error("No upload ID returned".to_string()))?
            .to_string();

        let result = self.upload_parts(path, key, &upload_id, size).await;
        if result.is_err() {
            if let Err(abort_err) = self
                .client
                .abort_multipart_upload()
                .bucket(&self.bucket)
                .key(key)
                .upload_id(&upload_id)
                .send()
                .await
            {
                warn!(
                    "Failed to abort multipart upload {upload_id} for {key}: {}",
                    BucketError::from(abort_err)
                );
            }
        }
        result
    }

    async fn upload_parts(
        &self,
        path: &Path,
        key: &str,
        upload_id: &str,
        size: u64,
    ) -> BucketResult<()> {
        let part_count = size.div_ceil(MULTIPART_PART_SIZE);
        let mut parts = Vec::new();

        for index in 0..part_count {
            let offset = index * MULTIPART_PART_SIZE;
            let length = MULTIPART_PART_SIZE.min(size - offset);
            let part_number = i32::try_from(index + 1)
                .map_err(|_| BucketError::ConfigError(format!("too many parts for {key}")))?;

            let body = ByteStream::read_from()
                .path(path)
                .offset(offset)
                .length(Length::Exact(length))
                .build()
                .await
                .map_err(|e| BucketError::ReadError(e.to_string()))?;

            let output = self
                .client
                .upload_part()
                .bucket(&self.bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(part_number)
                .body(body)
                .send()
                .await?;

            debug!("Uploaded part {part_number}/{part_count} of {key}");
            parts.push(
                CompletedPart::builder()
                    .part_number(part_number)
                    .set_e_tag(output.e_tag().map(ToString::to_string))
                    .build(),
            );
        }

        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build(),
            )
            .send()
            .await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl MediaStorage for S3MediaStorage {
    async fn put_file(&self, path: &Path, key: &str, content_type: &str) -> BucketResult<()> {
        if self.endpoint.is_empty() {
            return Err(BucketError::ConfigError(
                "storage endpoint is not configured".to_string(),
            ));
        }

        let size = tokio::fs::metadata(path)
            .await
            .map_err(|e| BucketError::ReadError(e.to_string()))?
            .len();

        if size > MULTIPART_PART_SIZE {
            self.put_multipart(path, key, content_type, size).await?;
        } else {
            self.put_single(path, key, content_type).await?;
        }

        info!(
            "Uploaded {key} ({size} bytes, {content_type}) to bucket {}",
            self.bucket
        );
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{key}", self.endpoint, self.bucket)
    }
}
