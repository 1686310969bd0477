//! Multipart upload endpoint.
//!
//! Files are buffered whole, checked against the configured limits, and
//! forwarded to object storage one at a time. There is no streaming or
//! partial-failure resume; a rejected file fails the whole request.

use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Response},
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::ApiResponse;
use crate::error::ApiError;
use crate::AppState;

pub async fn upload(State(state): State<AppState>, multipart: Multipart) -> Response {
    match accept(&state, multipart).await {
        Ok(response) => response.into_response(),
        Err(err) => err.into_response(),
    }
}

async fn accept(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<ApiResponse<Value>, ApiError> {
    let limits = &state.config.upload;
    let mut uploaded = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {}", e)))?
    {
        // non-file form fields are ignored
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        if !is_allowed_type(&content_type) {
            return Err(ApiError::bad_request(format!(
                "unsupported type '{}' for '{}'; images and PDF only",
                content_type, file_name
            )));
        }

        if uploaded.len() >= limits.max_files {
            return Err(ApiError::bad_request(format!(
                "too many files; at most {} per request",
                limits.max_files
            )));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("failed to read '{}': {}", file_name, e)))?;
        if bytes.len() > limits.max_file_bytes {
            return Err(ApiError::bad_request(format!(
                "'{}' exceeds the {} byte limit",
                file_name, limits.max_file_bytes
            )));
        }

        let key = format!("{}/{}", Uuid::new_v4(), file_name);
        let size = bytes.len();
        let object = state.storage.put(&key, bytes, &content_type).await?;

        uploaded.push(json!({
            "fileName": file_name,
            "url": object.url,
            "size": size,
            "contentType": content_type,
        }));
    }

    if uploaded.is_empty() {
        return Err(ApiError::bad_request("no files provided"));
    }

    Ok(ApiResponse::success(Value::Array(uploaded)))
}

fn is_allowed_type(content_type: &str) -> bool {
    content_type.starts_with("image/") || content_type == "application/pdf"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn images_and_pdf_are_allowed() {
        assert!(is_allowed_type("image/png"));
        assert!(is_allowed_type("image/webp"));
        assert!(is_allowed_type("application/pdf"));
    }

    #[test]
    fn everything_else_is_rejected() {
        assert!(!is_allowed_type("text/html"));
        assert!(!is_allowed_type("application/octet-stream"));
        assert!(!is_allowed_type("video/mp4"));
    }
}
