//! Application configuration management

use std::env;

use anyhow::{Context, Result};
use base64::Engine;

use crate::services::LogFormat;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// SQLite database URL
    pub database_url: String,

    /// Maximum pooled database connections
    pub database_max_connections: u32,

    /// JWT secret for token signing and verification
    pub jwt_secret: String,

    /// True when no JWT_SECRET was configured and a random one was generated
    pub jwt_secret_generated: bool,

    /// Password accepted by `login` for every user
    pub login_password: String,

    /// Lifetime of issued tokens in seconds
    pub token_lifetime_secs: i64,

    /// Buffered events per subscriber before it starts skipping
    pub event_capacity: usize,

    /// Console log format
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup (used by tests)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let (jwt_secret, jwt_secret_generated) = match lookup("JWT_SECRET") {
            Some(secret) if !secret.trim().is_empty() => (secret.trim().to_string(), false),
            _ => (generate_jwt_secret(), true),
        };

        let log_format = match lookup("LOG_FORMAT") {
            Some(value) => LogFormat::parse(&value)
                .with_context(|| format!("Invalid LOG_FORMAT '{}'", value))?,
            None => LogFormat::default(),
        };

        Ok(Self {
            port: lookup("PORT")
                .unwrap_or_else(|| "4000".to_string())
                .parse()
                .context("Invalid PORT")?,

            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://bookshelf.db".to_string()),

            database_max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,

            jwt_secret,
            jwt_secret_generated,

            login_password: lookup("LOGIN_PASSWORD").unwrap_or_else(|| "secret".to_string()),

            token_lifetime_secs: lookup("TOKEN_LIFETIME_SECS")
                .unwrap_or_else(|| "3600".to_string())
                .parse()
                .context("Invalid TOKEN_LIFETIME_SECS")?,

            event_capacity: lookup("EVENT_CAPACITY")
                .unwrap_or_else(|| "64".to_string())
                .parse()
                .context("Invalid EVENT_CAPACITY")?,

            log_format,
        })
    }
}

/// Random signing secret for development runs without JWT_SECRET.
/// Tokens stop verifying after a restart.
fn generate_jwt_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config(&[]).unwrap();

        assert_eq!(config.port, 4000);
        assert_eq!(config.database_url, "sqlite://bookshelf.db");
        assert_eq!(config.login_password, "secret");
        assert_eq!(config.token_lifetime_secs, 3600);
        assert_eq!(config.event_capacity, 64);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.jwt_secret_generated);
        assert!(!config.jwt_secret.is_empty());
    }

    #[test]
    fn explicit_values_win() {
        let config = config(&[
            ("PORT", "8080"),
            ("JWT_SECRET", " s3cr3t \n"),
            ("LOGIN_PASSWORD", "open sesame"),
            ("LOG_FORMAT", "pretty"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.jwt_secret, "s3cr3t");
        assert!(!config.jwt_secret_generated);
        assert_eq!(config.login_password, "open sesame");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn invalid_numbers_fail_with_the_variable_name() {
        let err = config(&[("PORT", "eighty")]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid PORT");

        let err = config(&[("TOKEN_LIFETIME_SECS", "soon")]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid TOKEN_LIFETIME_SECS");
    }
}
