//! Shared utilities and common types for the Wirahusada backend
//!
//! This crate provides common functionality used across all server modules:
//! - Configuration types loaded from the process environment
//! - Configuration error types
//! - API response envelope
//! - Input validation helpers

pub mod config;
pub mod errors;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, CookieConfig, DatabaseConfig, DatabaseName, DatabaseSettings, Environment,
    JwtConfig, ServerConfig, StartupPolicy, TlsConfig,
};
pub use errors::{ConfigError, ConfigResult};
pub use types::ApiResponse;
pub use utils::validation;
