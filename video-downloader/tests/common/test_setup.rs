use std::{sync::Arc, time::Duration};

use axum::{body::Body, http::Request, response::Response, Router};
use tempfile::TempDir;
use tower::ServiceExt;
use video_downloader::{
    downloader::mock::{MockBehavior, MockVideoDownloader},
    media_storage::mock::MockMediaStorage,
    server,
    types::ServiceConfig,
};

pub const TEST_ENDPOINT: &str = "http://minio.test:9000/";
pub const TEST_BUCKET: &str = "source";

/// Setup test logging
pub fn setup_test_env() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
}

/// Router wired to in-memory doubles and a private work directory
pub struct TestSetup {
    pub router: Router,
    pub downloader: Arc<MockVideoDownloader>,
    pub media_storage: Arc<MockMediaStorage>,
    pub work_dir: TempDir,
}

pub struct TestSetupBuilder {
    behavior: MockBehavior,
    api_secret: Option<String>,
    upload_failure: Option<String>,
    upload_delay: Option<Duration>,
}

impl TestSetupBuilder {
    pub fn behavior(mut self, behavior: MockBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn api_secret(mut self, secret: &str) -> Self {
        self.api_secret = Some(secret.to_string());
        self
    }

    pub fn failing_upload(mut self, message: &str) -> Self {
        self.upload_failure = Some(message.to_string());
        self
    }

    pub fn upload_delay(mut self, delay: Duration) -> Self {
        self.upload_delay = Some(delay);
        self
    }

    pub fn build(self) -> TestSetup {
        setup_test_env();

        let work_dir = tempfile::tempdir().expect("Failed to create work dir");

        let mut config = ServiceConfig::default();
        config.storage.endpoint = TEST_ENDPOINT.to_string();
        config.storage.bucket = TEST_BUCKET.to_string();
        config.api_secret = self.api_secret;
        config.work_dir = Some(work_dir.path().to_path_buf());

        let downloader = Arc::new(MockVideoDownloader::new(self.behavior));
        let mut media_storage = match self.upload_failure {
            Some(message) => MockMediaStorage::failing(TEST_ENDPOINT, TEST_BUCKET, &message),
            None => MockMediaStorage::new(TEST_ENDPOINT, TEST_BUCKET),
        };
        if let Some(delay) = self.upload_delay {
            media_storage = media_storage.with_upload_delay(delay);
        }
        let media_storage = Arc::new(media_storage);

        let router = server::router(
            Arc::new(config),
            downloader.clone(),
            media_storage.clone(),
        );

        TestSetup {
            router,
            downloader,
            media_storage,
            work_dir,
        }
    }
}

impl TestSetup {
    pub fn builder() -> TestSetupBuilder {
        TestSetupBuilder {
            behavior: MockBehavior::Succeed {
                ext: "mp4".to_string(),
                content: DEFAULT_VIDEO.to_vec(),
                duration_secs: DEFAULT_DURATION,
            },
            api_secret: None,
            upload_failure: None,
            upload_delay: None,
        }
    }

    pub fn new() -> Self {
        Self::builder().build()
    }

    pub async fn send_post_request(
        &self,
        route: &str,
        payload: serde_json::Value,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        self.send_raw_post_request(route, payload.to_string(), None)
            .await
    }

    pub async fn send_raw_post_request(
        &self,
        route: &str,
        body: String,
        authorization: Option<&str>,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let mut builder = Request::builder()
            .uri(route)
            .method("POST")
            .header("Content-Type", "application/json");
        if let Some(value) = authorization {
            builder = builder.header("Authorization", value);
        }
        let request = builder.body(Body::from(body))?;

        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    pub async fn send_get_request(
        &self,
        route: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .body(Body::empty())?;
        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    /// Number of entries left in the work directory
    pub fn leftover_entries(&self) -> usize {
        std::fs::read_dir(self.work_dir.path())
            .expect("Failed to read work dir")
            .count()
    }
}

pub const DEFAULT_VIDEO: &[u8] = b"not really an mp4 but close enough";
pub const DEFAULT_DURATION: u64 = 212;
