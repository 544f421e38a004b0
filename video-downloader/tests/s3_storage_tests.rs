//! Round trip against a local S3-compatible store
//!
//! Run with `cargo test -- --ignored` and `S3_TEST_ENDPOINT` pointing at
//! `LocalStack` or `MinIO` (defaults to `http://localhost:4566`).

use aws_sdk_s3::Client as S3Client;
use video_downloader::{
    media_storage::{object_key, s3_client_config, MediaStorage, S3MediaStorage, MULTIPART_PART_SIZE},
    types::StorageSettings,
};

fn test_settings() -> StorageSettings {
    StorageSettings {
        endpoint: std::env::var("S3_TEST_ENDPOINT")
            .unwrap_or_else(|_| "http://localhost:4566/".to_string()),
        access_key: std::env::var("S3_TEST_ACCESS_KEY").unwrap_or_else(|_| "test".to_string()),
        secret_key: std::env::var("S3_TEST_SECRET_KEY").unwrap_or_else(|_| "test".to_string()),
        bucket: format!("video-downloader-test-{}", uuid::Uuid::new_v4().simple()),
    }
}

async fn create_bucket(client: &S3Client, bucket: &str) {
    client
        .create_bucket()
        .bucket(bucket)
        .send()
        .await
        .expect("Failed to create bucket");
}

async fn read_object(client: &S3Client, bucket: &str, key: &str) -> (Vec<u8>, Option<String>) {
    let object = client
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .expect("Failed to get object");
    let content_type = object.content_type().map(ToString::to_string);
    let body = object.body.collect().await.unwrap().into_bytes().to_vec();
    (body, content_type)
}

#[tokio::test]
#[ignore = "requires a local S3-compatible store"]
async fn test_put_file_round_trip() {
    let settings = test_settings();
    let client = S3Client::from_conf(s3_client_config(&settings));
    create_bucket(&client, &settings.bucket).await;

    let storage = S3MediaStorage::new(client.clone(), &settings);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("abc.mp4");
    std::fs::write(&path, b"small video").unwrap();

    let key = object_key("abc");
    storage.put_file(&path, &key, "video/mp4").await.unwrap();

    let (body, content_type) = read_object(&client, &settings.bucket, &key).await;
    assert_eq!(body, b"small video");
    assert_eq!(content_type.as_deref(), Some("video/mp4"));
    assert_eq!(
        storage.object_url(&key),
        format!(
            "{}/{}/youtube/abc.mp4",
            settings.endpoint.trim_end_matches('/'),
            settings.bucket
        )
    );
}

#[tokio::test]
#[ignore = "requires a local S3-compatible store"]
async fn test_put_file_multipart() {
    let settings = test_settings();
    let client = S3Client::from_conf(s3_client_config(&settings));
    create_bucket(&client, &settings.bucket).await;

    let storage = S3MediaStorage::new(client.clone(), &settings);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.mkv");
    let size = usize::try_from(MULTIPART_PART_SIZE).unwrap() * 2 + 1024;
    let data: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
    std::fs::write(&path, &data).unwrap();

    let key = object_key("big");
    storage
        .put_file(&path, &key, "video/x-matroska")
        .await
        .unwrap();

    let (body, content_type) = read_object(&client, &settings.bucket, &key).await;
    assert_eq!(body.len(), data.len());
    assert!(body == data);
    assert_eq!(content_type.as_deref(), Some("video/x-matroska"));
}

#[tokio::test]
#[ignore = "requires a local S3-compatible store"]
async fn test_put_file_missing_bucket() {
    let settings = test_settings();
    let storage = S3MediaStorage::from_settings(&settings);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("abc.mp4");
    std::fs::write(&path, b"video").unwrap();

    let result = storage.put_file(&path, &object_key("abc"), "video/mp4").await;
    assert!(result.is_err());
}
