use crate::models::{BookId, UserId};
use axum::{http::StatusCode, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("data file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("data file {} is not valid JSON: {source}", .path.display())]
    Corrupt {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize data: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("task index {index} is out of range for {len} goals")]
    InvalidIndex { index: i64, len: usize },
    #[error("no daily progress recorded for user {0}")]
    RecordNotFound(UserId),
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error("book {0} not found")]
    BookNotFound(BookId),
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<TrackerError> for AppError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::InvalidIndex { .. } | TrackerError::Invalid(_) => {
                Self::bad_request(err.to_string())
            }
            TrackerError::RecordNotFound(_)
            | TrackerError::UserNotFound(_)
            | TrackerError::BookNotFound(_) => {
                Self::not_found(err.to_string())
            }
            TrackerError::Storage(inner) => Self::internal(inner),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(json!({
            "success": false,
            "error": self.message,
        }));
        (self.status, body).into_response()
    }
}
