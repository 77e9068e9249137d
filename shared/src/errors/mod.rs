//! Configuration error types
//!
//! Configuration problems are fatal: they are raised before any pool or
//! signing key exists, and the process refuses to start.

use thiserror::Error;

/// Errors raised while loading configuration from the environment
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// One or more required variables are absent or blank
    #[error("Missing required environment variables: {}", .variables.join(", "))]
    MissingVariables { variables: Vec<String> },

    #[error("Invalid port number for {variable}: {value}")]
    InvalidPort { variable: String, value: String },

    #[error("Invalid value for {variable}: {message}")]
    InvalidValue { variable: String, message: String },

    #[error("SECURITY ERROR: {variable} environment variable is required")]
    MissingSecret { variable: String },

    #[error("SECURITY ERROR: {variable} must be at least {min_length} characters long")]
    WeakSecret { variable: String, min_length: usize },

    #[error("SECURITY ERROR: JWT_SECRET and JWT_REFRESH_SECRET must be different")]
    ReusedSecret,
}

impl ConfigError {
    /// Stable machine-readable reason code
    pub fn reason(&self) -> &'static str {
        match self {
            ConfigError::MissingVariables { .. } => "config_missing_variables",
            ConfigError::InvalidPort { .. } => "config_invalid_port",
            ConfigError::InvalidValue { .. } => "config_invalid_value",
            ConfigError::MissingSecret { .. } => "config_missing_secret",
            ConfigError::WeakSecret { .. } => "config_weak_secret",
            ConfigError::ReusedSecret => "config_reused_secret",
        }
    }

    /// Names of the offending variables, for startup diagnostics
    pub fn variables(&self) -> Vec<String> {
        match self {
            ConfigError::MissingVariables { variables } => variables.clone(),
            ConfigError::InvalidPort { variable, .. }
            | ConfigError::InvalidValue { variable, .. }
            | ConfigError::MissingSecret { variable }
            | ConfigError::WeakSecret { variable, .. } => vec![variable.clone()],
            ConfigError::ReusedSecret => {
                vec!["JWT_SECRET".to_string(), "JWT_REFRESH_SECRET".to_string()]
            }
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
