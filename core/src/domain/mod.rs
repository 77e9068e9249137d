//! Domain layer containing business entities and value objects.

pub mod entities;
pub mod value_objects;

// Re-export commonly used domain types
pub use entities::{Student, SubjectClaims, TokenClaims, TokenPair, TokenType};
pub use value_objects::{AuthenticatedSubject, LoginOutcome};
