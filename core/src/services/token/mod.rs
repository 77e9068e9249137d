//! Token service module for JWT management
//!
//! Access and refresh tokens are signed with separate secrets and carry a
//! `type` claim. Verification checks signature, issuer, audience and expiry
//! under the expected type's secret and then the type itself, so the two
//! kinds are never interchangeable.

mod config;
mod service;


pub use config::TokenServiceConfig;
pub use service::{extract_bearer_token, TokenService};
