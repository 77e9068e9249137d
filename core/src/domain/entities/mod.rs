//! Domain entities representing core business objects.

pub mod student;
pub mod token;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use student::Student;
pub use token::{
    SubjectClaims, TokenClaims, TokenPair, TokenType, ACCESS_TOKEN_EXPIRY_MINUTES, JWT_AUDIENCE,
    JWT_ISSUER, REFRESH_TOKEN_EXPIRY_DAYS, TOKEN_ID_BYTES,
};
