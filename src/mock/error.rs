//! Backend errors and their REST rendering.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Per-field messages, rendered as `{ "field": ["message", ...] }`.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("Not found.")]
    NotFound,
    #[error("Invalid page.")]
    InvalidPage,
    #[error("{0}")]
    BadRequest(String),
    #[error("invalid fields: {}", .0.keys().cloned().collect::<Vec<_>>().join(", "))]
    Validation(FieldErrors),
    #[error("Method \"{0}\" not allowed.")]
    MethodNotAllowed(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.into(), vec![message.into()]);
        ApiError::Validation(errors)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound | ApiError::InvalidPage => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation(errors) => {
                let map: Map<String, Value> = errors
                    .iter()
                    .map(|(field, messages)| (field.clone(), json!(messages)))
                    .collect();
                Value::Object(map)
            }
            ApiError::Unauthorized(detail) => json!({ "detail": detail, "code": "token_not_valid" }),
            other => json!({ "detail": other.to_string() }),
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "mock request failed");
        }
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_are_listed_per_field() {
        let err = ApiError::field("name", "This field is required.");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let ApiError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors["name"], vec!["This field is required.".to_string()]);
    }

    #[test]
    fn invalid_page_is_not_found() {
        assert_eq!(ApiError::InvalidPage.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::InvalidPage.to_string(), "Invalid page.");
    }
}
