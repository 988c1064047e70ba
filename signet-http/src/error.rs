//! Maps `SignetError` onto the HTTP status/body pair from spec §7. One
//! `IntoResponse` impl so every handler can just bubble `?` up through
//! `ApiResult<T>`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use signet_core::errors::SignetError;

pub struct ApiError(pub SignetError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<SignetError> for ApiError {
    fn from(err: SignetError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = StatusCode::from_u16(kind.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(json!({
            "error": kind.as_str(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
