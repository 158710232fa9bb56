use crate::error::VoxlateError;
use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Error response rendered as `{"error": message}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// A multipart body that could not be read.
    ///
    /// Bodies over the upload limit keep their 413; anything else is treated
    /// as a request without audio.
    pub fn from_multipart(error: MultipartError) -> Self {
        let status = error.status();
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            tracing::warn!("upload rejected: {}", error.body_text());
            return Self {
                status,
                message: "File too large".to_string(),
            };
        }
        tracing::warn!("unreadable multipart body: {}", error.body_text());
        Self::bad_request(super::handlers::NO_AUDIO)
    }
}

impl From<VoxlateError> for ApiError {
    fn from(error: VoxlateError) -> Self {
        let status = if error.is_client_error() {
            tracing::warn!("request failed: {error} ({})", error.detail());
            StatusCode::BAD_REQUEST
        } else {
            tracing::error!("request failed: {error}");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WavRejection;

    #[test]
    fn test_pipeline_errors_map_to_status() {
        let cases = [
            (
                VoxlateError::InvalidFormat(WavRejection::UnsupportedSampleWidth(1)),
                StatusCode::BAD_REQUEST,
                "Invalid WAV file: must be 16-bit",
            ),
            (
                VoxlateError::recognition("timeout"),
                StatusCode::BAD_REQUEST,
                "Could not understand audio",
            ),
            (
                VoxlateError::translation("quota"),
                StatusCode::BAD_REQUEST,
                "Translation failed",
            ),
            (
                VoxlateError::synthesis("503"),
                StatusCode::INTERNAL_SERVER_ERROR,
                "Speech synthesis failed: 503",
            ),
            (
                VoxlateError::Other("disk full".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "disk full",
            ),
        ];

        for (error, status, message) in cases {
            let api = ApiError::from(error);
            assert_eq!(api.status, status);
            assert_eq!(api.message, message);
        }
    }

    #[test]
    fn test_into_response_keeps_status() {
        let response = ApiError::bad_request("No selected file").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
