//! Mapping of application errors to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{domain::RepositoryError, infrastructure::dto::http::ErrorDto, usecase::ApplicationError};

/// Error returned by HTTP handlers, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError(pub ApplicationError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ApplicationError::ValueObject(_) | ApplicationError::Chat(_) => StatusCode::BAD_REQUEST,
            ApplicationError::ChatNotFound(_) | ApplicationError::Repository(RepositoryError::ChatNotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            ApplicationError::ChatTitleAlreadyExists(_)
            | ApplicationError::Repository(
                RepositoryError::ChatAlreadyExists(_) | RepositoryError::TitleAlreadyExists(_),
            ) => StatusCode::CONFLICT,
            ApplicationError::Broker(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApplicationError::HandlerNotRegistered { .. }
            | ApplicationError::Repository(RepositoryError::Storage(_))
            | ApplicationError::Serialization(_)
            | ApplicationError::UnsupportedEvent(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "Request failed: {}", self.0);
        } else {
            tracing::debug!(status = status.as_u16(), "Request rejected: {}", self.0);
        }
        (
            status,
            Json(ErrorDto {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}
