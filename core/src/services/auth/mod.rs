//! Authentication service module
//!
//! This module provides the student authentication flows:
//! - Login with NIM or name plus NRM
//! - Refresh token rotation with subject re-validation
//! - Profile lookup
//! - Bearer token authentication of incoming requests

mod service;

#[cfg(test)]
mod tests;

pub use service::AuthService;
