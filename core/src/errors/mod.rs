//! Domain-specific error types and error handling.

mod types;


pub use types::{AuthError, DatabaseError, RejectionReason, TokenError};

use thiserror::Error;
use wh_shared::ConfigError;

/// Closed set of failures the core hands to the HTTP layer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    /// Stable machine-readable code, used as `errorType` in responses
    pub fn reason(&self) -> &'static str {
        match self {
            DomainError::Configuration(err) => err.reason(),
            DomainError::Database(err) => err.reason(),
            DomainError::Token(err) => err.reason(),
            DomainError::Auth(err) => err.reason(),
            DomainError::Validation { .. } => "validation_error",
            DomainError::NotFound { .. } => "not_found",
            DomainError::Internal { .. } => "internal_error",
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
