//! Authentication and authorization configuration

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

use super::environment::Environment;
use crate::errors::{ConfigError, ConfigResult};

pub const ACCESS_SECRET_VAR: &str = "JWT_SECRET";
pub const REFRESH_SECRET_VAR: &str = "JWT_REFRESH_SECRET";
pub const MIN_SECRET_LENGTH: usize = 32;

pub const DEFAULT_ISSUER: &str = "wismon-api";
pub const DEFAULT_AUDIENCE: &str = "wismon-client";

/// 15 minutes
pub const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;
/// 30 days
pub const REFRESH_TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// JWT authentication configuration
#[derive(Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// Secret for signing access tokens
    #[serde(skip_serializing)]
    pub access_secret: String,

    /// Secret for signing refresh tokens, never equal to the access secret
    #[serde(skip_serializing)]
    pub refresh_secret: String,

    /// Access token lifetime in seconds
    pub access_token_expiry: i64,

    /// Refresh token lifetime in seconds
    pub refresh_token_expiry: i64,

    pub issuer: String,
    pub audience: String,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_secret", &"***")
            .field("refresh_secret", &"***")
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish()
    }
}

impl JwtConfig {
    /// Create a validated configuration with the standard lifetimes
    pub fn new(
        access_secret: impl Into<String>,
        refresh_secret: impl Into<String>,
    ) -> ConfigResult<Self> {
        let config = Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_token_expiry: ACCESS_TOKEN_TTL_SECS,
            refresh_token_expiry: REFRESH_TOKEN_TTL_SECS,
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from the process environment
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = |variable: &str| {
            lookup(variable)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| ConfigError::MissingSecret {
                    variable: variable.to_string(),
                })
        };

        let access_secret = secret(ACCESS_SECRET_VAR)?;
        let refresh_secret = secret(REFRESH_SECRET_VAR)?;
        Self::new(access_secret, refresh_secret)
    }

    /// Check secret presence, length and separation
    pub fn validate(&self) -> ConfigResult<()> {
        for (variable, secret) in [
            (ACCESS_SECRET_VAR, &self.access_secret),
            (REFRESH_SECRET_VAR, &self.refresh_secret),
        ] {
            if secret.is_empty() {
                return Err(ConfigError::MissingSecret {
                    variable: variable.to_string(),
                });
            }
            if secret.chars().count() < MIN_SECRET_LENGTH {
                return Err(ConfigError::WeakSecret {
                    variable: variable.to_string(),
                    min_length: MIN_SECRET_LENGTH,
                });
            }
        }

        if self.access_secret == self.refresh_secret {
            return Err(ConfigError::ReusedSecret);
        }

        Ok(())
    }

    /// Override the token lifetimes
    pub fn with_expiry(mut self, access_secs: i64, refresh_secs: i64) -> Self {
        self.access_token_expiry = access_secs;
        self.refresh_token_expiry = refresh_secs;
        self
    }
}

/// SameSite attribute of the refresh cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum SameSitePolicy {
    Strict,
    Lax,
}

/// Attributes of the refresh token cookie
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CookieConfig {
    pub name: String,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSitePolicy,
    /// Max-Age in seconds
    pub max_age: i64,
    pub path: String,
}

impl CookieConfig {
    pub fn for_environment(env: Environment) -> Self {
        let production = env.is_production();
        Self {
            name: String::from("refreshToken"),
            http_only: true,
            secure: production,
            same_site: if production {
                SameSitePolicy::Strict
            } else {
                SameSitePolicy::Lax
            },
            max_age: REFRESH_TOKEN_TTL_SECS,
            path: String::from("/"),
        }
    }
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}
