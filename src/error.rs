//! # Error Types
//!
//! Structured error handling for query compilation and execution.
//!
//! The taxonomy is deliberately small: compilation can only fail on a
//! shape mismatch between a declared condition kind and the supplied
//! parameter, `first` can fail on an empty result, and everything else
//! is a database-layer error surfaced from SQLx.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    /// A declared field received a parameter whose shape is incompatible
    /// with its condition kind (e.g. a list where a scalar kind was
    /// declared). This is a client-input error, not a system fault.
    #[error("field {0} format invalid")]
    Validation(String),

    /// `first` matched zero rows. Terminal for that call.
    #[error("no matching row found")]
    NotFound,

    /// Database-layer failure from SQLx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, QueryError>;
