//! # Wirahusada Core
//!
//! Core domain layer for the Wirahusada backend.
//! This crate contains domain entities, the closed error enum, the retry
//! policy used for database access, the dual-token authority and the
//! authentication service with its repository interface.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
