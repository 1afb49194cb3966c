//! HTTP error responses: `{"error": "..."}` with a status per failure kind

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sealdrop_transfer::TransferError;
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    /// Malformed request: missing/invalid parameter or multipart framing
    BadRequest(String),
    PayloadTooLarge,
    Transfer(TransferError),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn multipart(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::BadRequest(err.body_text())
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Transfer(err) => match err {
                TransferError::NotFound(_) => StatusCode::NOT_FOUND,
                TransferError::Verification => StatusCode::FORBIDDEN,
                TransferError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
                TransferError::RandomSource(_) | TransferError::Encryption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// Client-facing message. Backend details stay in the logs.
    fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::PayloadTooLarge => "file too large".into(),
            ApiError::Transfer(err) => match err {
                TransferError::NotFound(_) => "object not found".into(),
                TransferError::Verification => "verification failed".into(),
                TransferError::Storage(_) => "storage unavailable".into(),
                TransferError::RandomSource(_) => "random source unavailable".into(),
                TransferError::Encryption(_) => "encryption failed".into(),
            },
        }
    }
}

impl From<TransferError> for ApiError {
    fn from(err: TransferError) -> Self {
        ApiError::Transfer(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = ?self, "request failed");
        } else {
            tracing::debug!(status = %status, error = ?self, "request rejected");
        }
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}
