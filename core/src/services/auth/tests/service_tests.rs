//! Unit tests for the authentication service

use async_trait::async_trait;
use std::sync::Arc;
use wh_shared::{DatabaseName, JwtConfig};

use crate::domain::entities::student::Student;
use crate::domain::entities::token::TokenType;
use crate::errors::{AuthError, DatabaseError, DomainError, TokenError};
use crate::repositories::{InMemoryStudentRepository, StudentRepository};
use crate::services::auth::AuthService;
use crate::services::token::{TokenService, TokenServiceConfig};

fn token_service() -> Arc<TokenService> {
    let jwt = JwtConfig::new(
        "auth-tests-access-secret-0123456789",
        "auth-tests-refresh-secret-0123456789",
    )
    .unwrap();
    Arc::new(TokenService::new(TokenServiceConfig::from(&jwt)).unwrap())
}

fn create_service() -> (AuthService<InMemoryStudentRepository>, InMemoryStudentRepository) {
    let mut student = Student::new("2021-001", "1234567890", "Siti Aminah");
    student.tplahir = Some("Malang".to_string());
    let repository = InMemoryStudentRepository::with_students(vec![student]);
    let service = AuthService::new(Arc::new(repository.clone()), token_service());
    (service, repository)
}

/// Repository whose database is down
struct UnavailableRepository;

#[async_trait]
impl StudentRepository for UnavailableRepository {
    async fn find_by_credentials(
        &self,
        _namam_nim: &str,
        _nrm: &str,
    ) -> Result<Option<Student>, DomainError> {
        Err(DatabaseError::QueryFailed {
            database: DatabaseName::Wis,
            attempts: 2,
            cause: "read ECONNRESET".to_string(),
            code: Some("ECONNRESET".to_string()),
        }
        .into())
    }

    async fn find_by_nrm(&self, _nrm: &str) -> Result<Option<Student>, DomainError> {
        Ok(None)
    }
}

#[tokio::test]
async fn test_login_issues_pair_and_profile() {
    let (service, _) = create_service();
    let outcome = service.login(" Siti Aminah ", "2021-001").await.unwrap();

    assert_eq!(outcome.expires_in, 900);
    assert_eq!(outcome.student.tplahir.as_deref(), Some("Malang"));

    let claims = service
        .token_service()
        .verify_access_token(&outcome.tokens.access_token)
        .unwrap();
    assert_eq!(claims.nrm, "2021-001");
    assert_eq!(claims.nim, "1234567890");
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let (service, _) = create_service();
    assert_eq!(
        service.login("", "2021-001").await.unwrap_err(),
        DomainError::Auth(AuthError::MissingCredentials)
    );
    assert_eq!(
        service.login("Siti", "   ").await.unwrap_err(),
        DomainError::Auth(AuthError::MissingCredentials)
    );
}

#[tokio::test]
async fn test_login_unknown_student() {
    let (service, _) = create_service();
    let err = service.login("1234567890", "2099-999").await.unwrap_err();
    assert_eq!(err, DomainError::Auth(AuthError::InvalidCredentials));
    assert_eq!(err.to_string(), "Student not found or invalid credentials");
}

#[tokio::test]
async fn test_login_surfaces_database_failures() {
    let service = AuthService::new(Arc::new(UnavailableRepository), token_service());
    let err = service.login("1234567890", "2021-001").await.unwrap_err();
    assert!(matches!(err, DomainError::Database(DatabaseError::QueryFailed { .. })));
}

#[tokio::test]
async fn test_refresh_rotates_pair() {
    let (service, _) = create_service();
    let login = service.login("1234567890", "2021-001").await.unwrap();

    let rotated = service
        .refresh_tokens(Some(&login.tokens.refresh_token))
        .await
        .unwrap();

    let tokens = service.token_service();
    let old_id = tokens
        .verify_refresh_token(&login.tokens.refresh_token)
        .unwrap()
        .token_id;
    let new_id = tokens.verify_refresh_token(&rotated.refresh_token).unwrap().token_id;
    assert_ne!(old_id, new_id);
    assert!(tokens.verify_access_token(&rotated.access_token).is_ok());
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let (service, _) = create_service();
    let login = service.login("1234567890", "2021-001").await.unwrap();

    let err = service
        .refresh_tokens(Some(&login.tokens.access_token))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        DomainError::Token(TokenError::WrongType {
            expected: TokenType::Refresh,
            found: TokenType::Access,
        })
    );
}

#[tokio::test]
async fn test_refresh_for_deactivated_subject() {
    let (service, repository) = create_service();
    let login = service.login("1234567890", "2021-001").await.unwrap();
    repository.remove("2021-001");

    let err = service
        .refresh_tokens(Some(&login.tokens.refresh_token))
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::Auth(AuthError::SubjectNotFound));
    assert!(err.to_string().contains("account may have been deactivated"));
}

#[tokio::test]
async fn test_refresh_without_token() {
    let (service, _) = create_service();
    assert_eq!(
        service.refresh_tokens(None).await.unwrap_err(),
        DomainError::Auth(AuthError::MissingRefreshToken)
    );
    assert_eq!(
        service.refresh_tokens(Some("")).await.unwrap_err(),
        DomainError::Auth(AuthError::MissingRefreshToken)
    );
}

#[tokio::test]
async fn test_get_profile() {
    let (service, _) = create_service();
    assert_eq!(service.get_profile("2021-001").await.unwrap().namam, "Siti Aminah");
    assert!(matches!(
        service.get_profile("2099-999").await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_authenticate_header() {
    let (service, _) = create_service();
    let login = service.login("1234567890", "2021-001").await.unwrap();

    let header = format!("Bearer {}", login.tokens.access_token);
    let subject = service.authenticate(Some(&header)).unwrap();
    assert_eq!(subject.nrm, "2021-001");
    assert_eq!(subject.token_type, TokenType::Access);

    assert_eq!(service.authenticate(None).unwrap_err(), TokenError::Missing);
    assert_eq!(
        service.authenticate(Some(&login.tokens.access_token)).unwrap_err(),
        TokenError::Missing
    );

    let refresh_header = format!("Bearer {}", login.tokens.refresh_token);
    assert!(matches!(
        service.authenticate(Some(&refresh_header)),
        Err(TokenError::WrongType { .. })
    ));
}
