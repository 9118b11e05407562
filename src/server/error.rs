use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::db::StoreError;

/// Every non-2xx answer of the API. The body only ever carries the generic text for its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    BadRequest,
    NotFound,
    MethodNotAllowed,
    UnprocessableEntity,
    InternalServerError,
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: u16,
    message: &'static str,
}

impl ApiError {
    pub fn status(self) -> StatusCode {
        match self {
            ApiError::BadRequest => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ApiError::BadRequest => "bad request",
            ApiError::NotFound => "resource not found",
            ApiError::MethodNotAllowed => "method not allowed",
            ApiError::UnprocessableEntity => "unprocessable",
            ApiError::InternalServerError => "internal server error",
        }
    }

    /// Mapping for read endpoints: a missing row is a 404.
    pub fn from_read(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { resource, id } => {
                tracing::debug!(resource, id, "Lookup missed");
                ApiError::NotFound
            }
            other => Self::from_failure(other),
        }
    }

    /// Mapping for write endpoints: a missing row or a rejected row is a 422.
    pub fn from_write(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { resource, id } => {
                tracing::debug!(resource, id, "Write target missing");
                ApiError::UnprocessableEntity
            }
            StoreError::ConstraintViolation(reason) => {
                tracing::debug!(%reason, "Write rejected by storage");
                ApiError::UnprocessableEntity
            }
            other => Self::from_failure(other),
        }
    }

    fn from_failure(error: StoreError) -> Self {
        tracing::error!("Storage failure: {error}");
        ApiError::InternalServerError
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            success: false,
            error: status.as_u16(),
            message: self.message(),
        };
        (status, Json(body)).into_response()
    }
}
