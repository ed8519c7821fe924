//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;

/// Where balances and ledger entries are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerBackend {
    Postgres,
    /// Process-local; contents are lost on restart
    Memory,
}

impl FromStr for LedgerBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "postgres" => Ok(LedgerBackend::Postgres),
            "memory" => Ok(LedgerBackend::Memory),
            _ => Err(ConfigError::InvalidValue("LEDGER_BACKEND")),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: LedgerBackend,

    /// Database connection URL (required for the postgres backend)
    pub database_url: Option<String>,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Base URL of the token verification service
    pub auth_server_url: String,

    /// Origin allowed by CORS, if any
    pub frontend_origin: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let backend: LedgerBackend = lookup("LEDGER_BACKEND")
            .unwrap_or_else(|| "postgres".to_string())
            .parse()?;

        let database_url = lookup("DATABASE_URL");
        if backend == LedgerBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingEnv("DATABASE_URL"));
        }

        let database_max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "8000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let auth_server_url = lookup("AUTH_SERVER_URL")
            .ok_or(ConfigError::MissingEnv("AUTH_SERVER_URL"))?
            .trim_end_matches('/')
            .to_string();

        let frontend_origin = lookup("FRONTEND_ORIGIN").filter(|origin| !origin.is_empty());

        Ok(Self {
            backend,
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            auth_server_url,
            frontend_origin,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Configuration error types
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/banking"),
            ("AUTH_SERVER_URL", "http://localhost:8181/"),
        ])
        .unwrap();

        assert_eq!(config.backend, LedgerBackend::Postgres);
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8000);
        assert_eq!(config.auth_server_url, "http://localhost:8181");
        assert!(config.frontend_origin.is_none());
        assert!(!config.is_production());
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let err = load(&[("AUTH_SERVER_URL", "http://localhost:8181")]).unwrap_err();
        assert_eq!(err, ConfigError::MissingEnv("DATABASE_URL"));
    }

    #[test]
    fn test_memory_backend_needs_no_database() {
        let config = load(&[
            ("LEDGER_BACKEND", "memory"),
            ("AUTH_SERVER_URL", "http://localhost:8181"),
            ("ENVIRONMENT", "production"),
        ])
        .unwrap();

        assert_eq!(config.backend, LedgerBackend::Memory);
        assert!(config.database_url.is_none());
        assert!(config.is_production());
    }

    #[test]
    fn test_auth_server_url_required() {
        let err = load(&[("LEDGER_BACKEND", "memory")]).unwrap_err();
        assert_eq!(err, ConfigError::MissingEnv("AUTH_SERVER_URL"));
    }

    #[test]
    fn test_invalid_values() {
        let base = [("LEDGER_BACKEND", "memory"), ("AUTH_SERVER_URL", "http://a")];

        let mut vars = base.to_vec();
        vars.push(("PORT", "eighty"));
        assert_eq!(load(&vars).unwrap_err(), ConfigError::InvalidValue("PORT"));

        let err = load(&[("LEDGER_BACKEND", "redis"), ("AUTH_SERVER_URL", "http://a")])
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidValue("LEDGER_BACKEND"));
    }
}
