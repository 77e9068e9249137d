//! Results of the authentication use cases.

use serde::Serialize;

use crate::domain::entities::student::Student;
use crate::domain::entities::token::{TokenClaims, TokenPair, TokenType};

/// Access token lifetime reported to clients, in seconds
pub const ACCESS_TOKEN_EXPIRES_IN: i64 = 900;

/// Returned by a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub tokens: TokenPair,
    pub student: Student,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

impl LoginOutcome {
    pub fn new(tokens: TokenPair, student: Student) -> Self {
        Self {
            tokens,
            student,
            expires_in: ACCESS_TOKEN_EXPIRES_IN,
        }
    }
}

/// Identity attached to a request after its access token was verified
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedSubject {
    pub nrm: String,
    pub nim: String,
    pub namam: String,
    pub token_type: TokenType,
}

impl From<TokenClaims> for AuthenticatedSubject {
    fn from(claims: TokenClaims) -> Self {
        Self {
            nrm: claims.nrm,
            nim: claims.nim,
            namam: claims.namam,
            token_type: claims.token_type,
        }
    }
}
