//! Configuration module for subscription-service.

use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SubscriptionConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Upper bound on every store call made while serving a request.
    pub query_timeout_ms: u64,
}

impl DatabaseConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

impl SubscriptionConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(Self {
            common,
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "subscription-service".to_string()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.trim().is_empty()),
            database: DatabaseConfig {
                url: database_url(is_prod)?,
                max_connections: parse_env("DB_MAX_CONNECTIONS", 10),
                min_connections: parse_env("DB_MIN_CONNECTIONS", 2),
                query_timeout_ms: parse_env("DB_TIMEOUT_MS", 3000),
            },
        })
    }
}

/// `DATABASE_URL` wins; otherwise the URL is assembled from the `DB_*` parts.
fn database_url(is_prod: bool) -> Result<String, AppError> {
    if let Ok(url) = env::var("DATABASE_URL") {
        return Ok(url);
    }

    let host = get_env("DB_HOST", Some("localhost"), is_prod)?;
    let port = get_env("DB_PORT", Some("5432"), is_prod)?;
    let name = get_env("DB_NAME", Some("subscriptions"), is_prod)?;
    let user = get_env("DB_USER", Some("postgres"), is_prod)?;
    let password = get_env("DB_PASSWORD", Some("postgres"), is_prod)?;
    let sslmode = get_env("DB_SSLMODE", Some("disable"), false)?;

    Ok(build_database_url(
        &host, &port, &name, &user, &password, &sslmode,
    ))
}

pub fn build_database_url(
    host: &str,
    port: &str,
    name: &str,
    user: &str,
    password: &str,
    sslmode: &str,
) -> String {
    format!(
        "postgres://{}:{}@{}:{}/{}?sslmode={}",
        urlencoding::encode(user),
        urlencoding::encode(password),
        host,
        port,
        name,
        sslmode
    )
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_database_url_escapes_credentials() {
        let url = build_database_url("db", "5432", "subs", "app user", "p@ss:w/rd", "disable");
        assert_eq!(
            url,
            "postgres://app%20user:p%40ss%3Aw%2Frd@db:5432/subs?sslmode=disable"
        );
    }

    #[test]
    fn test_query_timeout() {
        let database = DatabaseConfig {
            url: String::new(),
            max_connections: 1,
            min_connections: 1,
            query_timeout_ms: 3000,
        };
        assert_eq!(database.query_timeout(), Duration::from_secs(3));
    }
}
