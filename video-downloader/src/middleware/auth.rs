//! Optional bearer secret check

use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
    Extension,
};

use crate::types::{AppError, ServiceConfig};

/// Bearer secret middleware
///
/// When an API secret is configured the `Authorization` header must be exactly
/// `Bearer <secret>`; anything else is rejected with 401 before the body is
/// read. Without a secret every request passes.
///
/// # Errors
///
/// - `AppError` - Missing or mismatched token with 401 status code
pub async fn api_secret_middleware(
    Extension(config): Extension<Arc<ServiceConfig>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(secret) = config.api_secret.as_deref() {
        if !is_authorized(request.headers(), secret) {
            return Err(AppError::unauthorized());
        }
    }

    Ok(next.run(request).await)
}

fn is_authorized(headers: &HeaderMap, secret: &str) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .is_some_and(|token| token == secret)
}
