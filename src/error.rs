// HTTP API error types
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use serde_json::json;

/// API error with the status code and client-facing message for each
/// failure the handlers can produce. Every variant renders as the standard
/// `{"success": false, "error": ...}` envelope.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    Validation(String),
    Duplicate(String),
    MissingId(String),
    Store(String),

    // 404 Not Found
    NotFound(String),

    // 405 Method Not Allowed (carries the Allow header value)
    MethodNotAllowed { allow: String },

    // 501 Not Implemented
    NotImplemented(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Duplicate(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingId(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Validation(msg)
            | ApiError::Duplicate(msg)
            | ApiError::MissingId(msg)
            | ApiError::Store(msg)
            | ApiError::NotFound(msg)
            | ApiError::NotImplemented(msg) => msg.clone(),
            ApiError::MethodNotAllowed { .. } => "method not allowed".to_string(),
        }
    }
}

// Static constructors, one per failure condition
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn duplicate(message: impl Into<String>) -> Self {
        ApiError::Duplicate(message.into())
    }

    pub fn missing_id(resource: &str) -> Self {
        ApiError::MissingId(format!("{} id is required for this operation", resource))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn method_not_allowed(allow: String) -> Self {
        ApiError::MethodNotAllowed { allow }
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        ApiError::NotImplemented(message.into())
    }
}

impl From<crate::registry::SchemaError> for ApiError {
    fn from(err: crate::registry::SchemaError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<crate::store::StoreError> for ApiError {
    fn from(err: crate::store::StoreError) -> Self {
        // Surfaced to the caller with the driver message; logged here because
        // the envelope has no room for the backtrace.
        tracing::error!("store error: {}", err);
        ApiError::Store(err.to_string())
    }
}

impl From<crate::storage::StorageError> for ApiError {
    fn from(err: crate::storage::StorageError) -> Self {
        tracing::error!("object storage error: {}", err);
        ApiError::Store(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = Json(json!({
            "success": false,
            "error": self.message(),
        }));

        match self {
            ApiError::MethodNotAllowed { allow } => {
                (status, [(header::ALLOW, allow)], body).into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_error_taxonomy() {
        assert_eq!(ApiError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::duplicate("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::missing_id("skill").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Store("boom".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::method_not_allowed("GET, POST".into()).status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(ApiError::not_implemented("x").status_code(), StatusCode::NOT_IMPLEMENTED);
    }

    #[test]
    fn missing_id_names_the_resource() {
        let err = ApiError::missing_id("category");
        assert!(err.message().contains("category id"));
    }
}
