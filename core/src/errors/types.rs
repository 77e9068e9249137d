//! Error types for authentication, tokens and database access
//!
//! Every error carries a stable `reason()` code next to its display message.
//! Callers branch on the variant or the code, never on the message text.

use thiserror::Error;
use wh_shared::DatabaseName;

use crate::domain::entities::token::TokenType;

/// Token verification failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Access token required")]
    Missing,

    #[error("Token expired")]
    Expired { token_type: TokenType },

    #[error("Invalid token")]
    Invalid { token_type: TokenType },

    #[error("Invalid token type")]
    WrongType { expected: TokenType, found: TokenType },

    #[error("Token generation failed: {message}")]
    GenerationFailed { message: String },
}

/// Why a request failed authentication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    TokenMissing,
    TokenExpired,
    TokenInvalid,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::TokenMissing => "token_missing",
            RejectionReason::TokenExpired => "token_expired",
            RejectionReason::TokenInvalid => "token_invalid",
        }
    }
}

impl TokenError {
    pub fn reason(&self) -> &'static str {
        match self {
            TokenError::Missing => "token_missing",
            TokenError::Expired { .. } => "token_expired",
            TokenError::Invalid { .. } => "token_invalid",
            TokenError::WrongType { .. } => "token_wrong_type",
            TokenError::GenerationFailed { .. } => "token_generation_failed",
        }
    }

    /// Collapse into the three request-level outcomes
    pub fn rejection(&self) -> RejectionReason {
        match self {
            TokenError::Missing => RejectionReason::TokenMissing,
            TokenError::Expired { .. } => RejectionReason::TokenExpired,
            TokenError::Invalid { .. }
            | TokenError::WrongType { .. }
            | TokenError::GenerationFailed { .. } => RejectionReason::TokenInvalid,
        }
    }

    /// Message shown to clients, naming the token kind where it matters
    pub fn client_message(&self) -> String {
        match self {
            TokenError::Expired { token_type } => format!("{} token expired", token_type.label()),
            TokenError::Invalid { token_type } => format!("Invalid {} token", token_type.as_str()),
            other => other.to_string(),
        }
    }
}

/// Authentication failures that are not about the token itself
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Student name/NIM and NRM are required")]
    MissingCredentials,

    #[error("Student not found or invalid credentials")]
    InvalidCredentials,

    #[error("Refresh token required")]
    MissingRefreshToken,

    /// The subject of a valid refresh token no longer exists
    #[error("User not found - account may have been deactivated")]
    SubjectNotFound,
}

impl AuthError {
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingCredentials => "missing_credentials",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::MissingRefreshToken => "refresh_token_missing",
            AuthError::SubjectNotFound => "subject_not_found",
        }
    }
}

/// Database failures surfaced by the connection manager
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    #[error("{database} Database connection failed after {attempts} attempts: {message}")]
    Unreachable {
        database: DatabaseName,
        attempts: u32,
        message: String,
    },

    #[error("{database} Database query failed after {attempts} attempts: Query timeout")]
    QueryTimeout {
        database: DatabaseName,
        timeout_ms: u64,
        attempts: u32,
    },

    #[error("{database} Database query failed after {attempts} attempts: {cause}")]
    QueryFailed {
        database: DatabaseName,
        attempts: u32,
        cause: String,
        /// Driver or server error code when one was reported
        code: Option<String>,
    },
}

impl DatabaseError {
    pub fn reason(&self) -> &'static str {
        match self {
            DatabaseError::Unreachable { .. } => "database_unreachable",
            DatabaseError::QueryTimeout { .. } => "database_timeout",
            DatabaseError::QueryFailed { .. } => "database_query_failed",
        }
    }

    pub fn database(&self) -> DatabaseName {
        match self {
            DatabaseError::Unreachable { database, .. }
            | DatabaseError::QueryTimeout { database, .. }
            | DatabaseError::QueryFailed { database, .. } => *database,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            DatabaseError::Unreachable { attempts, .. }
            | DatabaseError::QueryTimeout { attempts, .. }
            | DatabaseError::QueryFailed { attempts, .. } => *attempts,
        }
    }
}
