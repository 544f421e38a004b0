use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::json;

/// Parse response body to JSON
pub async fn parse_response_body(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

pub fn create_download_request(url: &str, video_id: Option<&str>) -> serde_json::Value {
    match video_id {
        Some(video_id) => json!({ "url": url, "videoId": video_id }),
        None => json!({ "url": url }),
    }
}
