//! Main authentication service implementation

use std::sync::Arc;

use crate::domain::entities::student::Student;
use crate::domain::entities::token::TokenPair;
use crate::domain::value_objects::{AuthenticatedSubject, LoginOutcome};
use crate::errors::{AuthError, DomainError, DomainResult, TokenError};
use crate::repositories::StudentRepository;
use crate::services::token::{extract_bearer_token, TokenService};

/// Authentication service for the student login and token flows
pub struct AuthService<R>
where
    R: StudentRepository,
{
    /// Student lookups
    repository: Arc<R>,
    /// Token issuing and verification
    token_service: Arc<TokenService>,
}

impl<R> AuthService<R>
where
    R: StudentRepository,
{
    pub fn new(repository: Arc<R>, token_service: Arc<TokenService>) -> Self {
        Self {
            repository,
            token_service,
        }
    }

    pub fn token_service(&self) -> &TokenService {
        &self.token_service
    }

    /// Log a student in with their NIM or name plus NRM
    ///
    /// # Returns
    ///
    /// * `Ok(LoginOutcome)` - A fresh token pair and the student profile
    /// * `Err(AuthError::MissingCredentials)` - Either field is blank
    /// * `Err(AuthError::InvalidCredentials)` - No matching student
    pub async fn login(&self, namam_nim: &str, nrm: &str) -> DomainResult<LoginOutcome> {
        let namam_nim = namam_nim.trim();
        let nrm = nrm.trim();

        if namam_nim.is_empty() || nrm.is_empty() {
            return Err(AuthError::MissingCredentials.into());
        }

        let student = self
            .repository
            .find_by_credentials(namam_nim, nrm)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let tokens = self.token_service.generate_token_pair(&student.subject())?;
        tracing::info!(nrm = %student.nrm, "Generated new token pair");

        Ok(LoginOutcome::new(tokens, student))
    }

    /// Rotate a refresh token into a new pair
    ///
    /// The subject is looked up again so that deactivated accounts cannot
    /// keep refreshing. The presented token is not revoked.
    pub async fn refresh_tokens(&self, refresh_token: Option<&str>) -> DomainResult<TokenPair> {
        let token = refresh_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingRefreshToken)?;

        let claims = self.token_service.verify_refresh_token(token)?;

        let student = self
            .repository
            .find_by_nrm(&claims.nrm)
            .await?
            .ok_or(AuthError::SubjectNotFound)?;

        let tokens = self.token_service.generate_token_pair(&student.subject())?;
        tracing::info!(
            nrm = %student.nrm,
            token_id = claims.token_id.as_deref().unwrap_or("-"),
            "Refreshed tokens"
        );

        Ok(tokens)
    }

    /// Load the profile of an authenticated student
    pub async fn get_profile(&self, nrm: &str) -> DomainResult<Student> {
        self.repository
            .find_by_nrm(nrm)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                resource: "Student profile".to_string(),
            })
    }

    /// Authenticate a request from its `Authorization` header value
    pub fn authenticate(&self, header: Option<&str>) -> Result<AuthenticatedSubject, TokenError> {
        let token = extract_bearer_token(header).ok_or(TokenError::Missing)?;
        let claims = self.token_service.verify_access_token(token)?;
        Ok(claims.into())
    }
}
