//! Custom extractors for request validation

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use validator::{Validate, ValidationErrors};

use crate::types::error::AppError;

/// Custom JSON extractor that validates the payload
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: serde::de::DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        // First extract JSON
        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|err| {
                let message = match err {
                    JsonRejection::MissingJsonContentType(_) => {
                        "Missing Content-Type: application/json header"
                    }
                    _ => "Invalid JSON payload",
                };
                AppError::new(StatusCode::BAD_REQUEST, "invalid_json", message)
            })?;

        // Then validate
        payload
            .validate()
            .map_err(|errors| AppError::validation(first_message(&errors)))?;

        Ok(Self(payload))
    }
}

/// Message of the first failing field, or a generic one
fn first_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .find_map(|(field, field_errors)| {
            field_errors.first().map(|error| {
                error
                    .message
                    .as_ref()
                    .map_or_else(|| format!("{field} is invalid"), ToString::to_string)
            })
        })
        .unwrap_or_else(|| "Invalid request".to_string())
}
