//! Import failure taxonomy. Every error is fatal: nothing is retried or
//! downgraded to a warning, and the first failure aborts all later phases.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    /// The connection options did not resolve to a supported backend.
    /// Raised before any I/O happens.
    #[error("config error: {0}")]
    Config(String),

    /// The declarative model could not be compiled into a relational schema.
    #[error("schema error: {0}")]
    Schema(String),

    /// A caller-supplied parameter was rejected before processing started.
    #[error("validation error: {0}")]
    Validation(String),

    /// A DDL or DML statement failed against the backend.
    #[error("backend error: {0}")]
    Backend(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, ImportError>;
