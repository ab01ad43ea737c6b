//! Typed errors and user-facing message normalization.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("site id is not configured (set {0})")]
    MissingSite(&'static str),
    #[error("invalid base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

/// Body of a non-2xx response, kept as close to the wire as possible.
#[derive(Clone, Debug, PartialEq)]
pub enum ErrorPayload {
    Empty,
    Text(String),
    Json(Value),
}

impl ErrorPayload {
    pub fn from_text(text: String) -> Self {
        if text.trim().is_empty() {
            return ErrorPayload::Empty;
        }
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::String(s)) => ErrorPayload::Text(s),
            Ok(v) => ErrorPayload::Json(v),
            Err(_) => ErrorPayload::Text(text),
        }
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("request failed with status code {}", status.as_u16())]
    Api { status: StatusCode, body: ErrorPayload },
    #[error("authentication required")]
    Unauthorized,
    #[error("{0} id is not set")]
    MissingContext(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized) || self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// One display string for a failed action.
    ///
    /// Prefers the server's `detail` or `message`, then per-field validation
    /// messages joined with `; `, then this error's own text. `fallback` is used
    /// only when all of those are empty.
    pub fn user_message(&self, fallback: &str) -> String {
        if let ClientError::Api { body, .. } = self {
            if let Some(message) = payload_message(body) {
                return message;
            }
        }
        let own = self.to_string();
        if own.trim().is_empty() {
            fallback.to_string()
        } else {
            own
        }
    }
}

fn payload_message(body: &ErrorPayload) -> Option<String> {
    match body {
        ErrorPayload::Empty => None,
        ErrorPayload::Text(s) => Some(s.clone()).filter(|s| !s.trim().is_empty()),
        ErrorPayload::Json(Value::Object(map)) => {
            for key in ["detail", "message"] {
                if let Some(Value::String(s)) = map.get(key) {
                    if !s.is_empty() {
                        return Some(s.clone());
                    }
                }
            }
            let joined = map
                .iter()
                .map(|(field, value)| format!("{}: {}", field, field_messages(value)))
                .collect::<Vec<_>>()
                .join("; ");
            Some(joined).filter(|s| !s.is_empty())
        }
        ErrorPayload::Json(Value::Array(items)) => {
            let joined = items.iter().map(scalar_text).collect::<Vec<_>>().join("; ");
            Some(joined).filter(|s| !s.is_empty())
        }
        ErrorPayload::Json(_) => None,
    }
}

fn field_messages(value: &Value) -> String {
    match value {
        Value::Array(items) => items.iter().map(scalar_text).collect::<Vec<_>>().join(", "),
        other => scalar_text(other),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn api(status: u16, body: ErrorPayload) -> ClientError {
        ClientError::Api {
            status: StatusCode::from_u16(status).unwrap(),
            body,
        }
    }

    #[test]
    fn detail_wins_over_field_errors() {
        let err = api(
            403,
            ErrorPayload::Json(json!({"detail": "You do not have permission.", "name": ["x"]})),
        );
        assert_eq!(err.user_message("fallback"), "You do not have permission.");
    }

    #[test]
    fn message_used_when_detail_absent() {
        let err = api(500, ErrorPayload::Json(json!({"message": "boom"})));
        assert_eq!(err.user_message("fallback"), "boom");
    }

    #[test]
    fn field_errors_are_joined() {
        let err = api(
            400,
            ErrorPayload::Json(json!({
                "name": ["This field is required."],
                "slug": ["Enter a valid slug.", "Too long."],
                "order": 3
            })),
        );
        assert_eq!(
            err.user_message("fallback"),
            "name: This field is required.; order: 3; slug: Enter a valid slug., Too long."
        );
    }

    #[test]
    fn plain_text_body_is_used_verbatim() {
        let err = api(502, ErrorPayload::from_text("Bad Gateway".into()));
        assert_eq!(err.user_message("fallback"), "Bad Gateway");
    }

    #[test]
    fn empty_body_falls_back_to_error_text() {
        let err = api(500, ErrorPayload::from_text("   ".into()));
        assert_eq!(err.user_message("fallback"), "request failed with status code 500");
    }

    #[test]
    fn non_api_errors_use_display() {
        let err = ClientError::MissingContext("size-charts");
        assert_eq!(err.user_message("fallback"), "size-charts id is not set");
        let err = ClientError::Config(ConfigError::MissingSite("CATALOG_SITE_ID"));
        assert!(err.user_message("fallback").contains("CATALOG_SITE_ID"));
    }

    #[test]
    fn unauthorized_detection() {
        assert!(ClientError::Unauthorized.is_unauthorized());
        assert!(api(401, ErrorPayload::Empty).is_unauthorized());
        assert!(!api(404, ErrorPayload::Empty).is_unauthorized());
    }
}
