//! Server configuration module

use serde::{Deserialize, Serialize};
use std::env;

use super::database::parse_flag;
use crate::errors::{ConfigError, ConfigResult};

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server host address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Extra CORS origins besides local development hosts
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Whether `X-Forwarded-For`/`X-Real-IP` come from a trusted reverse proxy
    #[serde(default)]
    pub trust_proxy: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 3000,
            allowed_origins: Vec::new(),
            trust_proxy: false,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// `PORT` wins over `SERVER_PORT`; origins come from `CORS_ORIGIN` and
    /// the comma separated `ALLOWED_ORIGINS`. `TRUST_PROXY=true` enables
    /// proxy headers for client addresses.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("SERVER_HOST")
            .filter(|h| !h.trim().is_empty())
            .unwrap_or(defaults.host);

        let port = match ["PORT", "SERVER_PORT"]
            .iter()
            .find_map(|key| lookup(*key).filter(|v| !v.trim().is_empty()).map(|v| (*key, v)))
        {
            Some((variable, value)) => value
                .trim()
                .parse::<u16>()
                .ok()
                .filter(|port| *port != 0)
                .ok_or_else(|| ConfigError::InvalidPort {
                    variable: variable.to_string(),
                    value,
                })?,
            None => defaults.port,
        };

        let allowed_origins = ["CORS_ORIGIN", "ALLOWED_ORIGINS"]
            .iter()
            .filter_map(|key| lookup(*key))
            .flat_map(|value| {
                value
                    .split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect::<Vec<_>>()
            })
            .collect();

        let trust_proxy = parse_flag(&lookup, "TRUST_PROXY")?.unwrap_or(defaults.trust_proxy);

        Ok(Self {
            host,
            port,
            allowed_origins,
            trust_proxy,
        })
    }

    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> ConfigResult<ServerConfig> {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        ServerConfig::from_lookup(|key| map.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert!(config.allowed_origins.is_empty());
        assert!(!config.trust_proxy);
    }

    #[test]
    fn test_trust_proxy_flag() {
        assert!(load(&[("TRUST_PROXY", "true")]).unwrap().trust_proxy);
        assert!(!load(&[("TRUST_PROXY", "0")]).unwrap().trust_proxy);
        assert!(matches!(
            load(&[("TRUST_PROXY", "sometimes")]),
            Err(ConfigError::InvalidValue { variable, .. }) if variable == "TRUST_PROXY"
        ));
    }

    #[test]
    fn test_port_and_origins() {
        let config = load(&[
            ("PORT", "8081"),
            ("SERVER_PORT", "9000"),
            ("CORS_ORIGIN", "https://portal.example.ac.id"),
            ("ALLOWED_ORIGINS", "https://a.example, https://b.example ,"),
        ])
        .unwrap();
        assert_eq!(config.port, 8081);
        assert_eq!(
            config.allowed_origins,
            vec![
                "https://portal.example.ac.id",
                "https://a.example",
                "https://b.example"
            ]
        );
    }

    #[test]
    fn test_invalid_port() {
        assert!(matches!(
            load(&[("SERVER_PORT", "http")]),
            Err(ConfigError::InvalidPort { variable, .. }) if variable == "SERVER_PORT"
        ));
    }
}
