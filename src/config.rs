use std::env;
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value '{value}' for {name}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub bind_address: String,
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
}

impl Settings {
    /// Reads the process environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let store_backend = match get("STORE_BACKEND") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "STORE_BACKEND",
                value,
            })?,
            None => StoreBackend::Postgres,
        };

        let database_url = get("DATABASE_URL");
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let database_max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(value) => match value.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "DATABASE_MAX_CONNECTIONS",
                        value,
                    })
                }
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Settings {
            bind_address: get("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            store_backend,
            database_url,
            database_max_connections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn postgres_is_default_and_needs_url() {
        assert_eq!(settings(&[]), Err(ConfigError::Missing("DATABASE_URL")));

        let s = settings(&[("DATABASE_URL", "postgres://localhost/hr")]).unwrap();
        assert_eq!(s.store_backend, StoreBackend::Postgres);
        assert_eq!(s.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(s.database_max_connections, DEFAULT_MAX_CONNECTIONS);
    }

    #[test]
    fn memory_backend_without_database() {
        let s = settings(&[("STORE_BACKEND", "memory"), ("BIND_ADDRESS", "0.0.0.0:9000")]).unwrap();
        assert_eq!(s.store_backend, StoreBackend::Memory);
        assert_eq!(s.bind_address, "0.0.0.0:9000");
        assert_eq!(s.database_url, None);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            settings(&[("STORE_BACKEND", "redis")]),
            Err(ConfigError::Invalid { name: "STORE_BACKEND", .. })
        ));
        assert!(matches!(
            settings(&[("STORE_BACKEND", "memory"), ("DATABASE_MAX_CONNECTIONS", "0")]),
            Err(ConfigError::Invalid { name: "DATABASE_MAX_CONNECTIONS", .. })
        ));
    }
}
