// --- File: crates/bodywork_common/src/http.rs ---
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::error::{BodyworkError, HttpStatusCode};

// Include the client module
pub mod client;

/// Extension trait for BodyworkError to convert it to an Axum HTTP response.
pub trait IntoHttpResponse {
    /// Converts the error into an Axum HTTP response.
    fn into_http_response(self) -> Response;
}

impl IntoHttpResponse for BodyworkError {
    fn into_http_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status_code.is_server_error() {
            error!(code = self.code(), "request failed: {}", self);
        } else {
            warn!(code = self.code(), "request rejected: {}", self);
        }

        let mut body = json!({
            "success": false,
            "message": self.public_message(),
            "code": self.code(),
        });
        let fields = self.field_errors();
        if !fields.is_empty() {
            body["errors"] = json!(fields);
        }

        (status_code, Json(body)).into_response()
    }
}

/// Implement IntoResponse for BodyworkError to make it easier to use in Axum handlers.
impl IntoResponse for BodyworkError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}
