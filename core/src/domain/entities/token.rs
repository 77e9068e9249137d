//! Token entities for JWT-based authentication.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Access token expiration time (15 minutes)
pub const ACCESS_TOKEN_EXPIRY_MINUTES: i64 = 15;

/// Refresh token expiration time (30 days)
pub const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 30;

/// JWT issuer
pub const JWT_ISSUER: &str = "wismon-api";

/// JWT audience
pub const JWT_AUDIENCE: &str = "wismon-client";

/// Random bytes in a refresh token identifier
pub const TOKEN_ID_BYTES: usize = 16;

/// Which of the two token kinds a JWT is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }

    /// Capitalized form for messages
    pub fn label(&self) -> &'static str {
        match self {
            TokenType::Access => "Access",
            TokenType::Refresh => "Refresh",
        }
    }

    pub fn other(&self) -> TokenType {
        match self {
            TokenType::Access => TokenType::Refresh,
            TokenType::Refresh => TokenType::Access,
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The student identity carried inside every token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectClaims {
    pub nrm: String,
    pub nim: String,
    pub namam: String,
}

/// Claims structure for JWT payload
///
/// Claims are never mutated after signing. Refreshing always mints a new
/// pair with fresh `iat`/`exp` and a new `tokenId`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub nrm: String,
    pub nim: String,
    pub namam: String,

    #[serde(rename = "type")]
    pub token_type: TokenType,

    /// Unique identifier, present on refresh tokens only
    #[serde(rename = "tokenId", default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    pub iss: String,
    pub aud: String,
}

impl TokenClaims {
    /// Creates new claims for an access token
    pub fn new_access(
        subject: &SubjectClaims,
        issued_at: DateTime<Utc>,
        ttl: Duration,
        issuer: &str,
        audience: &str,
    ) -> Self {
        Self::build(subject, TokenType::Access, None, issued_at, ttl, issuer, audience)
    }

    /// Creates new claims for a refresh token
    pub fn new_refresh(
        subject: &SubjectClaims,
        token_id: String,
        issued_at: DateTime<Utc>,
        ttl: Duration,
        issuer: &str,
        audience: &str,
    ) -> Self {
        Self::build(
            subject,
            TokenType::Refresh,
            Some(token_id),
            issued_at,
            ttl,
            issuer,
            audience,
        )
    }

    fn build(
        subject: &SubjectClaims,
        token_type: TokenType,
        token_id: Option<String>,
        issued_at: DateTime<Utc>,
        ttl: Duration,
        issuer: &str,
        audience: &str,
    ) -> Self {
        Self {
            nrm: subject.nrm.clone(),
            nim: subject.nim.clone(),
            namam: subject.namam.clone(),
            token_type,
            token_id,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
            iss: issuer.to_string(),
            aud: audience.to_string(),
        }
    }

    pub fn subject(&self) -> SubjectClaims {
        SubjectClaims {
            nrm: self.nrm.clone(),
            nim: self.nim.clone(),
            namam: self.namam.clone(),
        }
    }

    /// Checks if the claims have expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// A freshly minted access/refresh pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}
