//! HTTP-side errors.
//!
//! The game channel reports its own failures in-band as tag-5 ERROR
//! frames; this type only covers the plain HTTP endpoints and the
//! pre-upgrade checks on `/ws`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Failures surfaced as HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The `/ws` query carried unusable session parameters (400).
    #[error("invalid session parameters: {0}")]
    BadSession(String),

    /// A catalogue lookup named a power that does not exist (404).
    #[error("no such power: {0}")]
    UnknownPower(String),
}

impl HttpError {
    fn status(&self) -> StatusCode {
        match self {
            HttpError::BadSession(_) => StatusCode::BAD_REQUEST,
            HttpError::UnknownPower(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = axum::Json(json!({
            "message": self.to_string(),
            "code": status.as_u16(),
        }));
        (status, body).into_response()
    }
}

/// Result type alias for HTTP handlers.
pub type HttpResult<T> = Result<T, HttpError>;
