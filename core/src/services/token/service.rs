//! Main token service implementation

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;

use crate::domain::entities::token::{
    SubjectClaims, TokenClaims, TokenPair, TokenType, TOKEN_ID_BYTES,
};
use crate::errors::{DomainError, TokenError};

use super::config::TokenServiceConfig;

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Issues and verifies access/refresh token pairs
///
/// Stateless: there is no revocation list, a refresh token stays valid
/// until it expires.
pub struct TokenService {
    config: TokenServiceConfig,
    access_keys: KeyPair,
    refresh_keys: KeyPair,
    validation: Validation,
}

impl TokenService {
    /// Creates a new token service instance
    ///
    /// Fails when either secret is missing, shorter than 32 characters, or
    /// when both secrets are the same.
    pub fn new(config: TokenServiceConfig) -> Result<Self, DomainError> {
        config.validate()?;

        let mut validation = Validation::new(config.algorithm);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = 0;

        Ok(Self {
            access_keys: KeyPair::from_secret(&config.access_secret),
            refresh_keys: KeyPair::from_secret(&config.refresh_secret),
            config,
            validation,
        })
    }

    fn keys(&self, token_type: TokenType) -> &KeyPair {
        match token_type {
            TokenType::Access => &self.access_keys,
            TokenType::Refresh => &self.refresh_keys,
        }
    }

    /// Access token lifetime in seconds
    pub fn access_token_expires_in(&self) -> i64 {
        self.config.access_token_ttl.num_seconds()
    }

    /// Generates a new token pair for a subject
    ///
    /// The refresh token receives a fresh random `tokenId` on every call.
    pub fn generate_token_pair(&self, subject: &SubjectClaims) -> Result<TokenPair, TokenError> {
        let now = Utc::now();
        let config = &self.config;

        let access = TokenClaims::new_access(
            subject,
            now,
            config.ttl(TokenType::Access),
            &config.issuer,
            &config.audience,
        );
        let refresh = TokenClaims::new_refresh(
            subject,
            generate_token_id(),
            now,
            config.ttl(TokenType::Refresh),
            &config.issuer,
            &config.audience,
        );

        Ok(TokenPair {
            access_token: self.encode_claims(&access)?,
            refresh_token: self.encode_claims(&refresh)?,
        })
    }

    /// Signs claims with the secret belonging to their token type
    pub(crate) fn encode_claims(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        let header = Header::new(self.config.algorithm);
        encode(&header, claims, &self.keys(claims.token_type).encoding).map_err(|e| {
            TokenError::GenerationFailed {
                message: e.to_string(),
            }
        })
    }

    /// Verifies an access token and returns the claims
    pub fn verify_access_token(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.verify(token, TokenType::Access)
    }

    /// Verifies a refresh token and returns the claims
    pub fn verify_refresh_token(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.verify(token, TokenType::Refresh)
    }

    fn verify(&self, token: &str, expected: TokenType) -> Result<TokenClaims, TokenError> {
        match decode::<TokenClaims>(token, &self.keys(expected).decoding, &self.validation) {
            Ok(data) if data.claims.token_type == expected => Ok(data.claims),
            Ok(data) => Err(TokenError::WrongType {
                expected,
                found: data.claims.token_type,
            }),
            Err(err) => {
                if self.is_genuine(token, expected.other()) {
                    return Err(TokenError::WrongType {
                        expected,
                        found: expected.other(),
                    });
                }

                match err.kind() {
                    ErrorKind::ExpiredSignature => Err(TokenError::Expired {
                        token_type: expected,
                    }),
                    _ => Err(TokenError::Invalid {
                        token_type: expected,
                    }),
                }
            }
        }
    }

    /// True when the token is correctly signed as the given type, ignoring
    /// expiry. Used only to classify a rejection, never to accept a token.
    fn is_genuine(&self, token: &str, token_type: TokenType) -> bool {
        let mut validation = self.validation.clone();
        validation.validate_exp = false;

        decode::<TokenClaims>(token, &self.keys(token_type).decoding, &validation)
            .map(|data| data.claims.token_type == token_type)
            .unwrap_or(false)
    }
}

/// Pull the token out of an `Authorization` header value.
///
/// The header must be exactly `Bearer <token>`; anything else yields `None`.
pub fn extract_bearer_token(header: Option<&str>) -> Option<&str> {
    let mut parts = header?.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}

/// 128-bit random identifier, hex encoded
fn generate_token_id() -> String {
    let mut bytes = [0u8; TOKEN_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
