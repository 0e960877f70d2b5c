//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// PostgreSQL database holding the course content.
    pub database_url: String,
    /// SQLite database holding the per-device overlays.
    pub overlay_database_url: String,
    pub log_level: Level,
    pub cors_origin: String,
    pub fetch_max_retries: u32,
    pub fetch_retry_base_delay: Duration,
    pub search_debounce: Duration,
    pub home_course_limit: usize,
    pub home_article_limit: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // --- Server and Database Settings ---
        let bind_address_str = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let overlay_database_url =
            lookup("OVERLAY_DATABASE_URL").unwrap_or_else(|| "sqlite://overlay.db?mode=rwc".to_string());

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin = lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:8081".to_string());

        // --- Fetch and Screen Settings ---
        let fetch_max_retries = parse_or(&lookup, "FETCH_MAX_RETRIES", 3)?;
        let fetch_retry_base_delay = Duration::from_millis(parse_or(&lookup, "FETCH_RETRY_BASE_MS", 200)?);
        let search_debounce = Duration::from_millis(parse_or(&lookup, "SEARCH_DEBOUNCE_MS", 300)?);
        let home_course_limit = parse_or(&lookup, "HOME_COURSE_LIMIT", 4)?;
        let home_article_limit = parse_or(&lookup, "HOME_ARTICLE_LIMIT", 5)?;

        Ok(Self {
            bind_address,
            database_url,
            overlay_database_url,
            log_level,
            cors_origin,
            fetch_max_retries,
            fetch_retry_base_delay,
            search_debounce,
            home_course_limit,
            home_article_limit,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        None => Ok(default),
    }
}
