use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// JSON error envelope returned by every endpoint on failure.
///
/// `success` is always `false`; `kind` is a stable machine-readable code and
/// `message` is human-readable text.
pub fn error_body(kind: &str, message: &str) -> serde_json::Value {
    serde_json::json!({
        "success": false,
        "kind": kind,
        "message": message,
    })
}

/// Build a full error response with the given status.
pub fn error_response(status: StatusCode, kind: &str, message: &str) -> Response {
    (status, axum::Json(error_body(kind, message))).into_response()
}
