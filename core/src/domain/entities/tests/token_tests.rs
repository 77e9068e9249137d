//! Unit tests for token entities

use chrono::{Duration, Utc};

use crate::domain::entities::token::{
    SubjectClaims, TokenClaims, TokenType, ACCESS_TOKEN_EXPIRY_MINUTES, JWT_AUDIENCE, JWT_ISSUER,
    REFRESH_TOKEN_EXPIRY_DAYS,
};

fn subject() -> SubjectClaims {
    SubjectClaims {
        nrm: "2021-001".to_string(),
        nim: "1234567890".to_string(),
        namam: "Siti Aminah".to_string(),
    }
}

#[test]
fn test_access_token_claims() {
    let now = Utc::now();
    let claims = TokenClaims::new_access(
        &subject(),
        now,
        Duration::minutes(ACCESS_TOKEN_EXPIRY_MINUTES),
        JWT_ISSUER,
        JWT_AUDIENCE,
    );

    assert_eq!(claims.token_type, TokenType::Access);
    assert_eq!(claims.exp - claims.iat, 900);
    assert_eq!(claims.iss, "wismon-api");
    assert_eq!(claims.aud, "wismon-client");
    assert!(claims.token_id.is_none());
    assert!(!claims.is_expired());
    assert_eq!(claims.subject(), subject());
}

#[test]
fn test_refresh_token_claims() {
    let claims = TokenClaims::new_refresh(
        &subject(),
        "ab".repeat(16),
        Utc::now(),
        Duration::days(REFRESH_TOKEN_EXPIRY_DAYS),
        JWT_ISSUER,
        JWT_AUDIENCE,
    );

    assert_eq!(claims.token_type, TokenType::Refresh);
    assert_eq!(claims.exp - claims.iat, 30 * 24 * 60 * 60);
    assert_eq!(claims.token_id.as_deref().map(str::len), Some(32));
}

#[test]
fn test_claims_wire_names() {
    let claims = TokenClaims::new_refresh(
        &subject(),
        "0f".repeat(16),
        Utc::now(),
        Duration::days(1),
        JWT_ISSUER,
        JWT_AUDIENCE,
    );
    let value = serde_json::to_value(&claims).unwrap();
    assert_eq!(value["type"], "refresh");
    assert!(value.get("tokenId").is_some());

    let access = TokenClaims::new_access(&subject(), Utc::now(), Duration::minutes(1), "i", "a");
    let value = serde_json::to_value(&access).unwrap();
    assert_eq!(value["type"], "access");
    assert!(value.get("tokenId").is_none());
}

#[test]
fn test_expired_claims() {
    let claims = TokenClaims::new_access(
        &subject(),
        Utc::now() - Duration::hours(1),
        Duration::minutes(15),
        JWT_ISSUER,
        JWT_AUDIENCE,
    );
    assert!(claims.is_expired());
}

#[test]
fn test_token_type_helpers() {
    assert_eq!(TokenType::Access.other(), TokenType::Refresh);
    assert_eq!(TokenType::Refresh.label(), "Refresh");
    assert_eq!(TokenType::Access.to_string(), "access");
}
