use actix_web::{http::StatusCode, HttpResponse};
use wh_core::domain::TokenType;
use wh_core::errors::{AuthError, DatabaseError, DomainError, TokenError};
use wh_shared::types::FieldError;
use wh_shared::ApiResponse;

/// HTTP status for a domain failure
///
/// Access token problems other than a missing or expired token are 403.
/// Anything wrong with a refresh token is 401 so the client logs in again.
pub fn status_for(error: &DomainError) -> StatusCode {
    match error {
        DomainError::Token(token) => token_status(token),
        DomainError::Auth(AuthError::MissingCredentials) => StatusCode::BAD_REQUEST,
        DomainError::Auth(_) => StatusCode::UNAUTHORIZED,
        DomainError::Validation { .. } => StatusCode::BAD_REQUEST,
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Database(DatabaseError::QueryTimeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
        DomainError::Database(DatabaseError::Unreachable { .. }) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        DomainError::Database(DatabaseError::QueryFailed { .. })
        | DomainError::Configuration(_)
        | DomainError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn token_status(error: &TokenError) -> StatusCode {
    match error {
        TokenError::Missing | TokenError::Expired { .. } => StatusCode::UNAUTHORIZED,
        TokenError::Invalid {
            token_type: TokenType::Refresh,
        }
        | TokenError::WrongType {
            expected: TokenType::Refresh,
            ..
        } => StatusCode::UNAUTHORIZED,
        TokenError::Invalid { .. } | TokenError::WrongType { .. } => StatusCode::FORBIDDEN,
        TokenError::GenerationFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Message safe to show a client
///
/// Server-side failures get a generic message; the detail only goes to the log.
pub fn client_message(error: &DomainError) -> String {
    match error {
        DomainError::Token(TokenError::GenerationFailed { .. }) => {
            "Internal server error".to_string()
        }
        DomainError::Token(token) => token.client_message(),
        DomainError::Auth(auth) => auth.to_string(),
        DomainError::Validation { message } => message.clone(),
        DomainError::NotFound { resource } => format!("{} not found", resource),
        DomainError::Database(DatabaseError::QueryTimeout { .. }) => {
            "Database request timed out".to_string()
        }
        DomainError::Database(DatabaseError::Unreachable { .. }) => {
            "Service temporarily unavailable".to_string()
        }
        _ => "Internal server error".to_string(),
    }
}

/// Convert a domain error into the JSON error envelope
pub fn handle_domain_error(error: DomainError) -> HttpResponse {
    error_response(error, Vec::new())
}

/// Same as [`handle_domain_error`] with explicit per-field errors
pub fn error_response(error: DomainError, errors: Vec<FieldError>) -> HttpResponse {
    let status = status_for(&error);
    if status.is_server_error() {
        tracing::error!(error = %error, error_type = error.reason(), "Request failed");
    } else {
        tracing::debug!(error = %error, error_type = error.reason(), "Request rejected");
    }

    let mut body = ApiResponse::error(client_message(&error), error.reason());
    if !errors.is_empty() {
        body = body.with_errors(errors);
    }
    HttpResponse::build(status).json(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wh_shared::DatabaseName;

    #[test]
    fn test_token_statuses() {
        assert_eq!(token_status(&TokenError::Missing), StatusCode::UNAUTHORIZED);
        assert_eq!(
            token_status(&TokenError::Expired {
                token_type: TokenType::Access
            }),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            token_status(&TokenError::Invalid {
                token_type: TokenType::Access
            }),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            token_status(&TokenError::WrongType {
                expected: TokenType::Access,
                found: TokenType::Refresh
            }),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            token_status(&TokenError::WrongType {
                expected: TokenType::Refresh,
                found: TokenType::Access
            }),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_database_statuses() {
        let timeout = DomainError::Database(DatabaseError::QueryTimeout {
            database: DatabaseName::Wis,
            timeout_ms: 30_000,
            attempts: 1,
        });
        let unreachable = DomainError::Database(DatabaseError::Unreachable {
            database: DatabaseName::Wis,
            attempts: 1,
            message: "connect ECONNREFUSED".to_string(),
        });
        let failed = DomainError::Database(DatabaseError::QueryFailed {
            database: DatabaseName::Wis,
            attempts: 1,
            cause: "syntax".to_string(),
            code: Some("42000".to_string()),
        });

        assert_eq!(status_for(&timeout), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(status_for(&unreachable), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_for(&failed), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(client_message(&failed), "Internal server error");
    }

    #[test]
    fn test_auth_statuses() {
        assert_eq!(
            status_for(&AuthError::MissingCredentials.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&AuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(&AuthError::SubjectNotFound.into()),
            StatusCode::UNAUTHORIZED
        );
        let not_found = DomainError::NotFound {
            resource: "Student profile".to_string(),
        };
        assert_eq!(status_for(&not_found), StatusCode::NOT_FOUND);
        assert_eq!(client_message(&not_found), "Student profile not found");
    }
}
