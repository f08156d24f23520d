//! Failures surfaced by the store ports.

use thiserror::Error;

/// What a repository implementation can report.
///
/// Store-specific detail rides in the message; callers map these onto
/// their own error surface (HTTP status, procedure error code) and log
/// the detail server side.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Query failed: {0}")]
    Query(String),

    /// A uniqueness rule in the store rejected the write.
    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Record not found")]
    NotFound,
}
