use std::{net::SocketAddr, path::PathBuf, time::Duration};

use crate::provider::DEFAULT_MAPBOX_BASE_URL;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Runtime settings, read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub mapbox_api_key: Option<String>,
    pub mapbox_base_url: String,
    pub database_url: Option<String>,
    pub incidents_path: Option<PathBuf>,
    pub upstream_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            name: "BIND_ADDR",
            value: bind_raw.clone(),
        })?;

        let upstream_timeout = match get("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "UPSTREAM_TIMEOUT_SECS",
                        value: raw,
                    })
                }
            },
            None => Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        };

        Ok(Self {
            bind_addr,
            mapbox_api_key: get("MAPBOX_API_KEY"),
            mapbox_base_url: get("MAPBOX_BASE_URL")
                .unwrap_or_else(|| DEFAULT_MAPBOX_BASE_URL.to_string()),
            database_url: get("DATABASE_URL"),
            incidents_path: get("INCIDENTS_JSON").map(PathBuf::from),
            upstream_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(cfg.mapbox_base_url, DEFAULT_MAPBOX_BASE_URL);
        assert_eq!(cfg.upstream_timeout, Duration::from_secs(10));
        assert!(cfg.mapbox_api_key.is_none());
        assert!(cfg.database_url.is_none());
        assert!(cfg.incidents_path.is_none());
    }

    #[test]
    fn reads_every_variable() {
        let cfg = config(&[
            ("BIND_ADDR", "127.0.0.1:3000"),
            ("MAPBOX_API_KEY", "pk.test"),
            ("MAPBOX_BASE_URL", "http://localhost:9000"),
            ("DATABASE_URL", "postgres://localhost/safepath"),
            ("INCIDENTS_JSON", "data/incidents.json"),
            ("UPSTREAM_TIMEOUT_SECS", "3"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 3000);
        assert_eq!(cfg.mapbox_api_key.as_deref(), Some("pk.test"));
        assert_eq!(cfg.mapbox_base_url, "http://localhost:9000");
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/safepath"));
        assert_eq!(cfg.incidents_path, Some(PathBuf::from("data/incidents.json")));
        assert_eq!(cfg.upstream_timeout, Duration::from_secs(3));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let cfg = config(&[("MAPBOX_API_KEY", "  ")]).unwrap();
        assert!(cfg.mapbox_api_key.is_none());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config(&[("BIND_ADDR", "not an address")]).is_err());
        assert!(config(&[("UPSTREAM_TIMEOUT_SECS", "0")]).is_err());
        assert!(config(&[("UPSTREAM_TIMEOUT_SECS", "soon")]).is_err());
    }
}
