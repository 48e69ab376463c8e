use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use dotenvy::dotenv;
use tracing::Level;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    /// Unset means the in-memory backend.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_protected_per_min: u32,
    pub rate_submit_per_min: u32,

    pub config_cache_ttl: Duration,
    pub audit_query_cap: usize,

    pub log_dir: String,
    pub log_level: Level,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            server_addr: get("SERVER_ADDR", "127.0.0.1:8080"),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            jwt_secret: lookup("JWT_SECRET")
                .filter(|secret| !secret.is_empty())
                .ok_or_else(|| anyhow!("JWT_SECRET must be set"))?,
            api_prefix: get("API_PREFIX", "/api"),

            rate_protected_per_min: parse("RATE_PROTECTED_PER_MIN", &get("RATE_PROTECTED_PER_MIN", "1000"))?,
            rate_submit_per_min: parse("RATE_SUBMIT_PER_MIN", &get("RATE_SUBMIT_PER_MIN", "60"))?,

            config_cache_ttl: Duration::from_secs(parse(
                "CONFIG_CACHE_TTL_SECS",
                &get("CONFIG_CACHE_TTL_SECS", "30"),
            )?),
            audit_query_cap: parse("AUDIT_QUERY_CAP", &get("AUDIT_QUERY_CAP", "50"))?,

            log_dir: get("LOG_DIR", "logs"),
            log_level: parse("LOG_LEVEL", &get("LOG_LEVEL", "debug"))?,
        })
    }
}

fn parse<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{key} has an invalid value: {raw:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = Config::from_lookup(lookup(&[("JWT_SECRET", "s3cret")])).unwrap();

        assert_eq!(config.server_addr, "127.0.0.1:8080");
        assert_eq!(config.database_url, None);
        assert_eq!(config.api_prefix, "/api");
        assert_eq!(config.rate_protected_per_min, 1000);
        assert_eq!(config.rate_submit_per_min, 60);
        assert_eq!(config.config_cache_ttl, Duration::from_secs(30));
        assert_eq!(config.audit_query_cap, 50);
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    fn missing_secret_is_an_error() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
    }

    #[test]
    fn bad_number_names_the_variable() {
        let err = Config::from_lookup(lookup(&[("JWT_SECRET", "x"), ("AUDIT_QUERY_CAP", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("AUDIT_QUERY_CAP"));
    }

    #[test]
    fn blank_database_url_means_memory_backend() {
        let config = Config::from_lookup(lookup(&[("JWT_SECRET", "x"), ("DATABASE_URL", "  ")])).unwrap();
        assert!(config.database_url.is_none());
    }
}
