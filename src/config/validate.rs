use anyhow::{Result, bail};

use super::{
    AppConfig,
    defaults::{MAX_ACCESS_TTL_SECS, MAX_REFRESH_TTL_DAYS, MIN_JWT_SECRET_BYTES},
};

pub fn validate(cfg: &AppConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    if let Some(database) = cfg.database.as_ref() {
        if database.url.trim().is_empty() {
            errors.push("database.url must not be empty".to_string());
        }

        if database.min_idle > database.max_connections {
            errors.push(format!(
                "database.min_idle ({}) must be <= database.max_connections ({})",
                database.min_idle, database.max_connections
            ));
        }

        if database.connect_timeout_secs == 0 {
            errors.push("database.connect_timeout_secs must be > 0".to_string());
        }
    }

    if let Some(tokens) = cfg.tokens.as_ref() {
        if tokens.jwt_secret.len() < MIN_JWT_SECRET_BYTES {
            errors.push(format!(
                "tokens.jwt_secret must be at least {MIN_JWT_SECRET_BYTES} bytes"
            ));
        }

        if tokens.access_ttl_secs == 0 || tokens.access_ttl_secs > MAX_ACCESS_TTL_SECS {
            errors.push(format!(
                "tokens.access_ttl_secs must be between 1 and {MAX_ACCESS_TTL_SECS}"
            ));
        }

        if tokens.refresh_ttl_days == 0 || tokens.refresh_ttl_days > MAX_REFRESH_TTL_DAYS {
            errors.push(format!(
                "tokens.refresh_ttl_days must be between 1 and {MAX_REFRESH_TTL_DAYS}"
            ));
        }

        if tokens.refresh_ttl_days.saturating_mul(24 * 60 * 60) <= tokens.access_ttl_secs {
            errors.push(
                "tokens.refresh_ttl_days must outlive tokens.access_ttl_secs".to_string(),
            );
        }

        if tokens.store_timeout_ms == 0 {
            errors.push("tokens.store_timeout_ms must be > 0".to_string());
        }
    }

    if errors.is_empty() {
        return Ok(());
    }

    bail!("invalid app config:\n- {}", errors.join("\n- "))
}

#[cfg(test)]
mod tests {
    use crate::config::{AppConfig, DatabaseConfig, TokenConfig};

    use super::validate;

    #[test]
    fn accepts_default_config() {
        assert!(validate(&AppConfig::default()).is_ok());
    }

    #[test]
    fn rejects_short_secret() {
        let cfg = AppConfig {
            tokens: Some(TokenConfig::new("too-short")),
            ..Default::default()
        };

        let err = validate(&cfg).expect_err("short secret should fail");
        assert!(err.to_string().contains("tokens.jwt_secret"));
    }

    #[test]
    fn rejects_lifetimes_past_the_upper_bound() {
        let mut tokens = TokenConfig::new("0123456789abcdef0123456789abcdef");
        tokens.access_ttl_secs = 86_401;
        tokens.refresh_ttl_days = 100_000_000;
        let cfg = AppConfig {
            tokens: Some(tokens),
            ..Default::default()
        };

        let message = validate(&cfg).expect_err("huge lifetimes should fail").to_string();
        assert!(message.contains("tokens.access_ttl_secs must be between 1 and 86400"));
        assert!(message.contains("tokens.refresh_ttl_days must be between 1 and 3650"));
    }

    #[test]
    fn accepts_lifetimes_at_the_upper_bound() {
        let mut tokens = TokenConfig::new("0123456789abcdef0123456789abcdef");
        tokens.access_ttl_secs = 86_400;
        tokens.refresh_ttl_days = 3_650;
        let cfg = AppConfig {
            tokens: Some(tokens),
            ..Default::default()
        };

        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn collects_every_problem_into_one_error() {
        let mut tokens = TokenConfig::new("0123456789abcdef0123456789abcdef");
        tokens.access_ttl_secs = 0;
        tokens.store_timeout_ms = 0;
        let cfg = AppConfig {
            database: Some(DatabaseConfig {
                url: "  ".to_string(),
                max_connections: 1,
                min_idle: 4,
                connect_timeout_secs: 5,
            }),
            tokens: Some(tokens),
            ..Default::default()
        };

        let message = validate(&cfg).expect_err("config should fail").to_string();
        assert!(message.contains("database.url"));
        assert!(message.contains("database.min_idle"));
        assert!(message.contains("tokens.access_ttl_secs"));
        assert!(message.contains("tokens.store_timeout_ms"));
    }
}
