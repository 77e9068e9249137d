//! Configuration for the token service

use chrono::Duration;
use jsonwebtoken::Algorithm;
use wh_shared::{ConfigResult, JwtConfig};

use crate::domain::entities::token::TokenType;

/// Configuration for the token service
#[derive(Clone)]
pub struct TokenServiceConfig {
    /// Signing secret for access tokens
    pub access_secret: String,
    /// Signing secret for refresh tokens
    pub refresh_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub issuer: String,
    pub audience: String,
    /// JWT signing algorithm
    pub algorithm: Algorithm,
}

impl std::fmt::Debug for TokenServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenServiceConfig")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl From<&JwtConfig> for TokenServiceConfig {
    fn from(jwt: &JwtConfig) -> Self {
        Self {
            access_secret: jwt.access_secret.clone(),
            refresh_secret: jwt.refresh_secret.clone(),
            access_token_ttl: Duration::seconds(jwt.access_token_expiry),
            refresh_token_ttl: Duration::seconds(jwt.refresh_token_expiry),
            issuer: jwt.issuer.clone(),
            audience: jwt.audience.clone(),
            algorithm: Algorithm::HS256,
        }
    }
}

impl TokenServiceConfig {
    /// Same secret rules as environment loading
    pub fn validate(&self) -> ConfigResult<()> {
        JwtConfig {
            access_secret: self.access_secret.clone(),
            refresh_secret: self.refresh_secret.clone(),
            access_token_expiry: self.access_token_ttl.num_seconds(),
            refresh_token_expiry: self.refresh_token_ttl.num_seconds(),
            issuer: self.issuer.clone(),
            audience: self.audience.clone(),
        }
        .validate()
    }

    pub fn ttl(&self, token_type: TokenType) -> Duration {
        match token_type {
            TokenType::Access => self.access_token_ttl,
            TokenType::Refresh => self.refresh_token_ttl,
        }
    }
}
