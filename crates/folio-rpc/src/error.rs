//! Procedure error envelope.
//!
//! Every failed call carries an [`RpcError`]: a machine-readable code, a
//! human-readable message, and, for schema failures, per-field detail.
//! The same shape travels over the wire and through in-process calls.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use folio_core::error::RepoError;

/// Error codes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input failed its schema, or the request was malformed.
    BadRequest,
    /// A protected procedure was invoked without a valid session.
    Unauthorized,
    /// The procedure path does not exist.
    NotFound,
    /// Store or backend failure. Detail is logged server side.
    InternalServerError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotFound => "NOT_FOUND",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
        };
        f.write_str(s)
    }
}

/// Error payload for a failed procedure call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct RpcError {
    pub code: ErrorCode,
    pub message: String,
    /// Flattened field-level validation errors, present only when the
    /// failure originates from input-schema validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<BTreeMap<String, Vec<String>>>,
}

impl RpcError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field_errors: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::Unauthorized, "Unauthorized")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalServerError, message)
    }

    /// Flatten schema validation errors into per-field messages.
    pub fn validation(errors: validator::ValidationErrors) -> Self {
        let mut field_errors: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (field, errs) in errors.field_errors() {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .clone()
                        .map(|m| m.into_owned())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            field_errors.insert(field.to_string(), messages);
        }

        Self {
            code: ErrorCode::BadRequest,
            message: "Invalid input".to_string(),
            field_errors: Some(field_errors),
        }
    }
}

impl From<RepoError> for RpcError {
    fn from(e: RepoError) -> Self {
        // Store detail stays in the server log, never in the payload
        tracing::error!("store error in procedure: {e}");
        Self::internal("Internal server error")
    }
}
