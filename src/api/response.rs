use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;

/// Wrapper for successful API responses that adds the success envelope.
///
/// Every endpoint replies either with this (`{"success": true, "data": ...}`)
/// or with an `ApiError` (`{"success": false, "error": ...}`); the two shapes
/// are never mixed.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: Option<StatusCode>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful response with the default 200 status
    pub fn success(data: T) -> Self {
        Self { data, status_code: None }
    }

    /// Response with a custom status code
    pub fn with_status(data: T, status_code: StatusCode) -> Self {
        Self { data, status_code: Some(status_code) }
    }

    /// 201 Created response
    pub fn created(data: T) -> Self {
        Self::with_status(data, StatusCode::CREATED)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        let data_value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("failed to serialize response data: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "success": false,
                        "error": "failed to serialize response data"
                    })),
                )
                    .into_response();
            }
        };

        let envelope = json!({
            "success": true,
            "data": data_value
        });

        (status, Json(envelope)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_defaults_to_200() {
        let resp = ApiResponse::success(json!({"ok": true})).into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn created_sets_201() {
        let resp = ApiResponse::created(json!({})).into_response();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }
}
