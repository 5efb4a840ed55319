use std::{env, fs, net::SocketAddr};

use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {name} value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: SocketAddr,
    pub version: String,
    pub hostname: String,
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .unwrap_or_else(|| "postgres://localhost/microjson".to_string());

        let database_max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .ok()
                .filter(|max| *max > 0)
                .ok_or(ConfigError::Invalid {
                    name: "DATABASE_MAX_CONNECTIONS",
                    value: raw,
                })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let raw_bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_bind_addr
            .parse()
            .map_err(|_| ConfigError::Invalid {
                name: "BIND_ADDR",
                value: raw_bind_addr.clone(),
            })?;

        let version = lookup("APP_VERSION")
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

        let hostname = lookup("HOSTNAME")
            .filter(|name| !name.trim().is_empty())
            .or_else(read_hostname_file)
            .unwrap_or_else(|| "unknown".to_string());

        Ok(Config {
            database_url,
            database_max_connections,
            bind_addr,
            version,
            hostname,
        })
    }
}

fn read_hostname_file() -> Option<String> {
    fs::read_to_string("/etc/hostname")
        .ok()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup_from(&[("HOSTNAME", "api-1")])).unwrap();
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR.parse().unwrap());
        assert_eq!(config.database_max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(config.hostname, "api-1");
    }

    #[test]
    fn explicit_values_are_used() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/app"),
            ("DATABASE_MAX_CONNECTIONS", "32"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("APP_VERSION", "2.4.1"),
            ("HOSTNAME", "api-2"),
        ]))
        .unwrap();
        assert_eq!(config.database_url, "postgres://db/app");
        assert_eq!(config.database_max_connections, 32);
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.version, "2.4.1");
    }

    #[test]
    fn invalid_bind_addr_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("BIND_ADDR", "not-an-addr")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid BIND_ADDR value: not-an-addr");
    }

    #[test]
    fn zero_connections_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("DATABASE_MAX_CONNECTIONS", "0")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { name: "DATABASE_MAX_CONNECTIONS", .. }
        ));
    }
}
