//! Repository Module
//!
//! Parameterized SQL over the shared pool. Free functions taking
//! `&SqlitePool` for single-statement CRUD; billing-core functions that must
//! compose into a caller's transaction take `&mut SqliteConnection` instead
//! (both a pool connection and an open transaction deref to it).

pub mod announcement;
pub mod bill;
pub mod billing_cycle;
pub mod contract;
pub mod meter_photo;
pub mod meter_reading;
pub mod room;
pub mod tenant;
pub mod utility;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// Not allowed in the entity's current state (distinct from bad input)
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Retryable infrastructure condition (pool exhaustion)
    #[error("Transient database error: {0}")]
    Transient(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl RepoError {
    pub fn is_transient(&self) -> bool {
        matches!(self, RepoError::Transient(_))
    }
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => {
                RepoError::Transient("connection pool exhausted".to_string())
            }
            other => RepoError::Database(other.to_string()),
        }
    }
}

impl From<RepoError> for crate::utils::AppError {
    fn from(err: RepoError) -> Self {
        use crate::utils::AppError;
        match err {
            RepoError::NotFound(msg) => AppError::NotFound(msg),
            RepoError::Duplicate(msg) => AppError::Conflict(msg),
            RepoError::Conflict(msg) => AppError::Conflict(msg),
            RepoError::Validation(msg) => AppError::Validation(msg),
            RepoError::Transient(msg) => AppError::Database(msg),
            RepoError::Database(msg) => AppError::Database(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
