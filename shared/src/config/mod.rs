//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical business areas:
//! - `auth` - JWT secrets and refresh cookie attributes
//! - `database` - The five MySQL databases and the startup policy
//! - `environment` - Environment detection and logging configuration
//! - `server` - HTTP server and CORS origins

pub mod auth;
pub mod database;
pub mod environment;
pub mod server;

use std::env;

use crate::errors::ConfigResult;

// Re-export commonly used types
pub use auth::{CookieConfig, JwtConfig, SameSitePolicy};
pub use database::{
    DatabaseConfig, DatabaseConfigSummary, DatabaseName, DatabaseSettings, StartupPolicy,
    TlsConfig,
};
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use server::ServerConfig;

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub databases: DatabaseSettings,
    pub jwt: JwtConfig,
    pub cookie: CookieConfig,
    pub logging: LoggingConfig,
    pub startup: StartupPolicy,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Database settings are validated before the JWT secrets so that a
    /// broken deployment reports its missing connection variables first.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Environment::from_lookup(&lookup);
        let databases = DatabaseSettings::from_lookup(&lookup)?;
        let jwt = JwtConfig::from_lookup(&lookup)?;
        let server = ServerConfig::from_lookup(&lookup)?;

        Ok(Self {
            environment,
            server,
            databases,
            jwt,
            cookie: CookieConfig::for_environment(environment),
            logging: LoggingConfig::for_environment(environment),
            startup: StartupPolicy::default(),
        })
    }
}

/// Variables an operator must provide, for startup hints
pub fn required_variables() -> Vec<String> {
    let mut variables: Vec<String> = DatabaseName::ALL
        .iter()
        .flat_map(|name| {
            database::REQUIRED_FIELDS
                .iter()
                .map(move |field| name.env_var(field))
        })
        .collect();
    variables.push(auth::ACCESS_SECRET_VAR.to_string());
    variables.push(auth::REFRESH_SECRET_VAR.to_string());
    variables
}
