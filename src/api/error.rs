use axum::{
    Json,
    extract::multipart::MultipartError,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::IntoResponse,
};
use thiserror::Error;
use tracing::error;

use super::models::ErrorResponse;
use crate::catalog::CatalogError;
use crate::platform::PlatformError;
use crate::queue::QueueError;
use crate::schedule::ScheduleError;
use crate::storage::StorageError;
use crate::worker::PublishError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("payload invalid: {0}")]
    InvalidPayload(String),
    #[error("platform not configured: {0}")]
    NotConfigured(String),
    #[error("missing or invalid bearer token")]
    Unauthorized,
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(u64),
    #[error("{0}")]
    Platform(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidPayload(_) | ApiError::NotConfigured(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Platform(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidPayload(_) => "INVALID_PAYLOAD",
            ApiError::NotConfigured(_) => "NOT_CONFIGURED",
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::Platform(_) => "PLATFORM_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(code = self.code(), error = %self, "Request failed");
        }

        let body = ErrorResponse {
            code: self.code(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> Self {
        ApiError::InvalidPayload(value.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        ApiError::InvalidPayload(value.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(value: PathRejection) -> Self {
        ApiError::InvalidPayload(value.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(value: MultipartError) -> Self {
        ApiError::InvalidPayload(value.body_text())
    }
}

impl From<CatalogError> for ApiError {
    fn from(value: CatalogError) -> Self {
        match value {
            CatalogError::NotFound { .. } => ApiError::NotFound(value.to_string()),
            CatalogError::AlreadyExists { .. } => ApiError::Conflict(value.to_string()),
            CatalogError::Invalid { .. } => ApiError::InvalidPayload(value.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<QueueError> for ApiError {
    fn from(value: QueueError) -> Self {
        match value {
            QueueError::NotFound(id) => ApiError::NotFound(format!("queue item {id}")),
            QueueError::IllegalTransition { .. } => ApiError::Conflict(value.to_string()),
            QueueError::InvalidItem(reason) => ApiError::InvalidPayload(reason),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ScheduleError> for ApiError {
    fn from(value: ScheduleError) -> Self {
        match value {
            ScheduleError::Catalog(e) => e.into(),
            ScheduleError::Queue(e) => e.into(),
            other => ApiError::InvalidPayload(other.to_string()),
        }
    }
}

impl From<PlatformError> for ApiError {
    fn from(value: PlatformError) -> Self {
        match value {
            PlatformError::NotConfigured(missing) => ApiError::NotConfigured(missing),
            PlatformError::Catalog(e) => e.into(),
            other => ApiError::Platform(other.to_string()),
        }
    }
}

impl From<PublishError> for ApiError {
    fn from(value: PublishError) -> Self {
        match value {
            PublishError::Platform(e) => e.into(),
            other => ApiError::Platform(other.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::TooLarge { size, .. } => ApiError::PayloadTooLarge(size),
            StorageError::InvalidDataUrl | StorageError::NotStored(_) => {
                ApiError::InvalidPayload(value.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}
