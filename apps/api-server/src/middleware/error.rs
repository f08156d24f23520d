//! Application-level error handling for HTTP routes.
//!
//! Handlers return [`AppResult`]; failures render as a JSON body of the
//! shape `{"status": u16, "error": str, "detail": str?}`. Procedure
//! errors inside `/api/rpc` batches never reach this type: they travel
//! in band as call envelopes. This covers everything outside the batch,
//! request context construction and the auth routes.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use thiserror::Error;

use folio_core::error::RepoError;
use folio_rpc::{ErrorCode, RpcError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Validation failed: {0:?}")]
    Validation(Vec<String>),
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    status: u16,
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl ErrorBody {
    fn new(status: StatusCode, error: &'static str, detail: Option<String>) -> Self {
        Self {
            status: status.as_u16(),
            error,
            detail,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = match self {
            AppError::BadRequest(detail) => {
                ErrorBody::new(status, "Bad Request", Some(detail.clone()))
            }
            AppError::Unauthorized => ErrorBody::new(status, "Unauthorized", None),
            AppError::NotFound(detail) => ErrorBody::new(status, "Not Found", Some(detail.clone())),
            AppError::Conflict(detail) => ErrorBody::new(status, "Conflict", Some(detail.clone())),
            AppError::Internal(detail) => {
                // Detail stays in the server log, never in the response
                tracing::error!("Internal error: {}", detail);
                ErrorBody::new(status, "Internal Server Error", None)
            }
            AppError::Validation(errors) => {
                ErrorBody::new(status, "Validation Failed", Some(errors.join(", ")))
            }
        };

        HttpResponse::build(status).json(body)
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Constraint(msg) => AppError::Conflict(msg),
            RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

impl From<RpcError> for AppError {
    fn from(err: RpcError) -> Self {
        match err.code {
            ErrorCode::BadRequest => AppError::BadRequest(err.message),
            ErrorCode::Unauthorized => AppError::Unauthorized,
            ErrorCode::NotFound => AppError::NotFound(err.message),
            ErrorCode::InternalServerError => AppError::Internal(err.message),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut lines: Vec<String> = Vec::new();
        for (field, errs) in errors.field_errors() {
            for e in errs.iter() {
                let message = e
                    .message
                    .clone()
                    .map(|m| m.into_owned())
                    .unwrap_or_else(|| e.code.to_string());
                lines.push(format!("{}: {}", field, message));
            }
        }
        // field_errors() iterates in arbitrary order
        lines.sort();
        AppError::Validation(lines)
    }
}
