use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{defaults, envconfig::EnvConfig, validate};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub database: Option<DatabaseConfig>,
    pub tokens: Option<TokenConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        <Self as EnvConfig>::from_env()
    }
}

impl EnvConfig for AppConfig {
    fn validate(&self) -> Result<()> {
        validate::validate(self)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub rust_log: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            rust_log: defaults::DEFAULT_RUST_LOG.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_db_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_db_min_idle")]
    pub min_idle: u32,
    #[serde(default = "default_db_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Signing secret and lifetimes for issued credentials.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TokenConfig {
    pub jwt_secret: String,
    #[serde(default = "default_access_ttl_secs")]
    pub access_ttl_secs: u64,
    #[serde(default = "default_refresh_ttl_days")]
    pub refresh_ttl_days: u64,
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
}

impl TokenConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            access_ttl_secs: default_access_ttl_secs(),
            refresh_ttl_days: default_refresh_ttl_days(),
            store_timeout_ms: default_store_timeout_ms(),
        }
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

// The secret never reaches logs through `{:?}`.
impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("jwt_secret", &"<redacted>")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_days", &self.refresh_ttl_days)
            .field("store_timeout_ms", &self.store_timeout_ms)
            .finish()
    }
}

fn default_db_max_connections() -> u32 {
    defaults::DEFAULT_DB_MAX_CONNECTIONS as u32
}

fn default_db_min_idle() -> u32 {
    defaults::DEFAULT_DB_MIN_IDLE as u32
}

fn default_db_connect_timeout_secs() -> u64 {
    defaults::DEFAULT_DB_CONNECT_TIMEOUT_SECS as u64
}

fn default_access_ttl_secs() -> u64 {
    defaults::DEFAULT_ACCESS_TTL_SECS as u64
}

fn default_refresh_ttl_days() -> u64 {
    defaults::DEFAULT_REFRESH_TTL_DAYS as u64
}

fn default_store_timeout_ms() -> u64 {
    defaults::DEFAULT_STORE_TIMEOUT_MS as u64
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{AppConfig, EnvConfig};

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn reads_nested_sections_with_defaults() {
        let cfg = AppConfig::from_vars(vars(&[
            ("APP_TOKENS__JWT_SECRET", "0123456789abcdef0123456789abcdef"),
            ("APP_DATABASE__URL", "sqlite::memory:"),
        ]))
        .expect("config should load");

        let tokens = cfg.tokens.expect("tokens section should be present");
        assert_eq!(tokens.access_ttl_secs, 900);
        assert_eq!(tokens.refresh_ttl_days, 180);
        assert_eq!(tokens.store_timeout_ms, 5_000);

        let database = cfg.database.expect("database section should be present");
        assert_eq!(database.url, "sqlite::memory:");
        assert_eq!(database.max_connections, 10);
        assert_eq!(database.min_idle, 2);
    }

    #[test]
    fn overrides_token_lifetimes() {
        let cfg = AppConfig::from_vars(vars(&[
            ("APP_TOKENS__JWT_SECRET", "0123456789abcdef0123456789abcdef"),
            ("APP_TOKENS__ACCESS_TTL_SECS", "60"),
            ("APP_TOKENS__REFRESH_TTL_DAYS", "7"),
        ]))
        .expect("config should load");

        let tokens = cfg.tokens.expect("tokens section should be present");
        assert_eq!(tokens.access_ttl_secs, 60);
        assert_eq!(tokens.refresh_ttl_days, 7);
    }

    #[test]
    fn debug_output_redacts_secret() {
        let tokens = super::TokenConfig::new("a-very-secret-value-that-is-long-enough");
        let rendered = format!("{tokens:?}");

        assert!(!rendered.contains("a-very-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
