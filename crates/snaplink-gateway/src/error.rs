use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use snaplink_core::{ShortenerError, StorageError};
use thiserror::Error;
use tracing::error;

use crate::model::ErrorResponse;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Shortener(#[from] ShortenerError),
    #[error(transparent)]
    Body(#[from] JsonRejection),
    #[error("stored URL is not a valid Location header: {0}")]
    Location(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Shortener(e) => match e {
                ShortenerError::InvalidUrl(_) | ShortenerError::InvalidShortCode(_) => {
                    StatusCode::BAD_REQUEST
                }
                ShortenerError::NotFound(_) => StatusCode::NOT_FOUND,
                ShortenerError::Storage(
                    StorageError::Unavailable(_) | StorageError::Timeout(_),
                ) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Body(rejection) => rejection.status(),
            AppError::Location(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self, status: StatusCode) -> String {
        match self {
            AppError::Shortener(ShortenerError::NotFound(_)) => "URL not found".to_string(),
            AppError::Body(rejection) => rejection.body_text(),
            _ if status.is_server_error() => status
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        }

        let body = ErrorResponse {
            detail: self.detail(status),
        };
        (status, Json(body)).into_response()
    }
}
