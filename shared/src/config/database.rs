//! Database configuration module
//!
//! Five logical MySQL databases are configured from `DB_<NAME>_*` variables.
//! Loading either yields all five complete configurations or a single error
//! naming every problem found, so no pool is ever built from partial input.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::time::Duration;

use crate::errors::{ConfigError, ConfigResult};

/// Logical databases served by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseName {
    Sso,
    Wis,
    Wisaka,
    Wismon,
    Perpustakaan,
}

impl DatabaseName {
    pub const ALL: [DatabaseName; 5] = [
        DatabaseName::Sso,
        DatabaseName::Wis,
        DatabaseName::Wisaka,
        DatabaseName::Wismon,
        DatabaseName::Perpustakaan,
    ];

    /// Upper-case name used in variable prefixes and log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseName::Sso => "SSO",
            DatabaseName::Wis => "WIS",
            DatabaseName::Wisaka => "WISAKA",
            DatabaseName::Wismon => "WISMON",
            DatabaseName::Perpustakaan => "PERPUSTAKAAN",
        }
    }

    /// Lower-case key used in health payloads
    pub fn key(&self) -> &'static str {
        match self {
            DatabaseName::Sso => "sso",
            DatabaseName::Wis => "wis",
            DatabaseName::Wisaka => "wisaka",
            DatabaseName::Wismon => "wismon",
            DatabaseName::Perpustakaan => "perpustakaan",
        }
    }

    pub fn env_prefix(&self) -> String {
        format!("DB_{}", self.as_str())
    }

    /// Full variable name for one of the connection fields
    pub fn env_var(&self, field: &str) -> String {
        format!("{}_{}", self.env_prefix(), field)
    }
}

impl fmt::Display for DatabaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DatabaseName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DatabaseName::ALL
            .into_iter()
            .find(|name| name.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown database: {}", s))
    }
}

/// Connection fields every database must define
pub const REQUIRED_FIELDS: [&str; 5] = ["HOST", "PORT", "USER", "PASSWORD", "NAME"];

pub const DEFAULT_CONNECTION_LIMIT: u32 = 15;
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_CHARSET: &str = "utf8mb4";
pub const DEFAULT_TIMEZONE: &str = "+00:00";

/// Transport security for database connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Reject servers whose certificate cannot be verified
    pub verify_certificate: bool,
}

/// Connection settings for a single logical database
#[derive(Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub name: DatabaseName,
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub database: String,

    /// Maximum number of connections in the pool
    pub connection_limit: u32,

    /// Time a caller may wait for a free connection
    pub acquire_timeout: Duration,

    /// Idle connections older than this are closed
    pub idle_timeout: Duration,

    pub tls: Option<TlsConfig>,
    pub charset: String,
    pub timezone: String,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("connection_limit", &self.connection_limit)
            .field("tls", &self.tls)
            .finish()
    }
}

impl DatabaseConfig {
    /// Create a configuration with the standard pool settings
    pub fn new(
        name: DatabaseName,
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            name,
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
            database: database.into(),
            connection_limit: DEFAULT_CONNECTION_LIMIT,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            tls: None,
            charset: DEFAULT_CHARSET.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }

    pub fn with_tls(mut self, tls: Option<TlsConfig>) -> Self {
        self.tls = tls;
        self
    }

    /// Non-secret view of the configuration for diagnostics
    pub fn summary(&self) -> DatabaseConfigSummary {
        DatabaseConfigSummary {
            host: self.host.clone(),
            port: self.port,
            database: self.database.clone(),
            connection_limit: self.connection_limit,
            ssl: self.tls.is_some(),
        }
    }
}

/// What the diagnostics endpoint may reveal about a database
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfigSummary {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub connection_limit: u32,
    pub ssl: bool,
}

/// Validated configuration for all five databases
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    databases: BTreeMap<DatabaseName, DatabaseConfig>,
}

impl DatabaseSettings {
    /// Load from the process environment
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load through an arbitrary lookup.
    ///
    /// Blank values count as missing. All missing variables are reported
    /// together before any port is validated.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value_of = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let missing: Vec<String> = DatabaseName::ALL
            .iter()
            .flat_map(|name| REQUIRED_FIELDS.iter().map(move |field| name.env_var(field)))
            .filter(|key| value_of(key).is_none())
            .collect();

        if !missing.is_empty() {
            return Err(ConfigError::MissingVariables { variables: missing });
        }

        let tls = tls_from_lookup(&lookup)?;

        let mut databases = BTreeMap::new();
        for name in DatabaseName::ALL {
            let field = |suffix: &str| value_of(&name.env_var(suffix)).unwrap_or_default();
            let port_var = name.env_var("PORT");
            let port = parse_port(&port_var, &field("PORT"))?;

            let config = DatabaseConfig::new(
                name,
                field("HOST"),
                port,
                field("USER"),
                field("PASSWORD"),
                field("NAME"),
            )
            .with_tls(tls);

            databases.insert(name, config);
        }

        Ok(Self { databases })
    }

    /// Build from explicit configurations, requiring one per database
    pub fn from_configs(configs: Vec<DatabaseConfig>) -> ConfigResult<Self> {
        let databases: BTreeMap<_, _> = configs.into_iter().map(|c| (c.name, c)).collect();
        let missing: Vec<String> = DatabaseName::ALL
            .iter()
            .filter(|name| !databases.contains_key(name))
            .flat_map(|name| REQUIRED_FIELDS.iter().map(move |field| name.env_var(field)))
            .collect();

        if missing.is_empty() {
            Ok(Self { databases })
        } else {
            Err(ConfigError::MissingVariables { variables: missing })
        }
    }

    pub fn get(&self, name: DatabaseName) -> Option<&DatabaseConfig> {
        self.databases.get(&name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DatabaseConfig> {
        self.databases.values()
    }
}

fn parse_port(variable: &str, value: &str) -> ConfigResult<u16> {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|port| (1..=65535).contains(port))
        .and_then(|port| u16::try_from(port).ok())
        .ok_or_else(|| ConfigError::InvalidPort {
            variable: variable.to_string(),
            value: value.to_string(),
        })
}

pub(crate) fn parse_flag<F>(lookup: &F, variable: &str) -> ConfigResult<Option<bool>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(variable).map(|v| v.trim().to_lowercase()) {
        None => Ok(None),
        Some(v) if v.is_empty() => Ok(None),
        Some(v) if v == "true" || v == "1" => Ok(Some(true)),
        Some(v) if v == "false" || v == "0" => Ok(Some(false)),
        Some(v) => Err(ConfigError::InvalidValue {
            variable: variable.to_string(),
            message: format!("expected true or false, got '{}'", v),
        }),
    }
}

fn tls_from_lookup<F>(lookup: &F) -> ConfigResult<Option<TlsConfig>>
where
    F: Fn(&str) -> Option<String>,
{
    let require_ssl = parse_flag(lookup, "DB_REQUIRE_SSL")?.unwrap_or(false);
    let verify_certificate = parse_flag(lookup, "DB_SSL_REJECT_UNAUTHORIZED")?.unwrap_or(true);

    Ok(require_ssl.then_some(TlsConfig { verify_certificate }))
}

/// Databases whose absence at startup is fatal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupPolicy {
    pub essential: Vec<DatabaseName>,
}

impl Default for StartupPolicy {
    fn default() -> Self {
        Self {
            essential: vec![DatabaseName::Sso, DatabaseName::Wismon],
        }
    }
}

impl StartupPolicy {
    pub fn is_essential(&self, name: DatabaseName) -> bool {
        self.essential.contains(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn complete_env() -> HashMap<String, String> {
        let mut vars = HashMap::new();
        for name in DatabaseName::ALL {
            vars.insert(name.env_var("HOST"), "127.0.0.1".to_string());
            vars.insert(name.env_var("PORT"), "3306".to_string());
            vars.insert(name.env_var("USER"), "app".to_string());
            vars.insert(name.env_var("PASSWORD"), "secret".to_string());
            vars.insert(name.env_var("NAME"), name.key().to_string());
        }
        vars
    }

    fn load(vars: &HashMap<String, String>) -> ConfigResult<DatabaseSettings> {
        DatabaseSettings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_complete_environment_builds_five_configs() {
        let settings = load(&complete_env()).unwrap();
        assert_eq!(settings.iter().count(), 5);

        let wis = settings.get(DatabaseName::Wis).unwrap();
        assert_eq!(wis.database, "wis");
        assert_eq!(wis.connection_limit, 15);
        assert_eq!(wis.acquire_timeout, Duration::from_secs(30));
        assert_eq!(wis.idle_timeout, Duration::from_secs(300));
        assert_eq!(wis.charset, "utf8mb4");
        assert_eq!(wis.timezone, "+00:00");
        assert!(wis.tls.is_none());
    }

    #[test]
    fn test_missing_variables_are_reported_together() {
        let mut vars = complete_env();
        vars.remove("DB_SSO_HOST");
        vars.insert("DB_WISMON_PASSWORD".to_string(), "   ".to_string());
        vars.insert("DB_WIS_PORT".to_string(), "not-a-port".to_string());

        match load(&vars) {
            Err(ConfigError::MissingVariables { variables }) => {
                assert_eq!(variables, vec!["DB_SSO_HOST", "DB_WISMON_PASSWORD"]);
            }
            other => panic!("expected missing variables, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_port_names_the_variable() {
        for bad in ["0", "65536", "abc", "-1"] {
            let mut vars = complete_env();
            vars.insert("DB_PERPUSTAKAAN_PORT".to_string(), bad.to_string());
            let err = load(&vars).unwrap_err();
            assert_eq!(
                err,
                ConfigError::InvalidPort {
                    variable: "DB_PERPUSTAKAAN_PORT".to_string(),
                    value: bad.to_string(),
                }
            );
        }
    }

    #[test]
    fn test_port_bounds_are_inclusive() {
        let mut vars = complete_env();
        vars.insert("DB_SSO_PORT".to_string(), "1".to_string());
        vars.insert("DB_WIS_PORT".to_string(), "65535".to_string());
        let settings = load(&vars).unwrap();
        assert_eq!(settings.get(DatabaseName::Sso).unwrap().port, 1);
        assert_eq!(settings.get(DatabaseName::Wis).unwrap().port, 65535);
    }

    #[test]
    fn test_tls_flags() {
        let mut vars = complete_env();
        vars.insert("DB_REQUIRE_SSL".to_string(), "true".to_string());
        let settings = load(&vars).unwrap();
        assert_eq!(
            settings.get(DatabaseName::Sso).unwrap().tls,
            Some(TlsConfig { verify_certificate: true })
        );

        vars.insert("DB_SSL_REJECT_UNAUTHORIZED".to_string(), "false".to_string());
        let settings = load(&vars).unwrap();
        assert_eq!(
            settings.get(DatabaseName::Wismon).unwrap().tls,
            Some(TlsConfig { verify_certificate: false })
        );

        vars.insert("DB_REQUIRE_SSL".to_string(), "yes please".to_string());
        assert!(matches!(load(&vars), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_debug_output_hides_password() {
        let settings = load(&complete_env()).unwrap();
        let rendered = format!("{:?}", settings.get(DatabaseName::Sso).unwrap());
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn test_default_startup_policy() {
        let policy = StartupPolicy::default();
        assert!(policy.is_essential(DatabaseName::Sso));
        assert!(policy.is_essential(DatabaseName::Wismon));
        assert!(!policy.is_essential(DatabaseName::Wis));
    }

    #[test]
    fn test_database_name_parsing() {
        assert_eq!("wisaka".parse::<DatabaseName>().unwrap(), DatabaseName::Wisaka);
        assert_eq!(DatabaseName::Perpustakaan.env_prefix(), "DB_PERPUSTAKAAN");
        assert!("oracle".parse::<DatabaseName>().is_err());
    }
}
