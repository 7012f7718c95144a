//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

use quill_infra::JwtConfig;
use quill_infra::auth::DEFAULT_ISSUER;
use quill_infra::database::DatabaseConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs the server on the in-memory store.
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
}

fn parsed<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| {
            let defaults = DatabaseConfig::new(url);
            DatabaseConfig {
                max_connections: parsed("DB_MAX_CONNECTIONS", defaults.max_connections),
                min_connections: parsed("DB_MIN_CONNECTIONS", defaults.min_connections),
                ..defaults
            }
        });

        let jwt = JwtConfig {
            secret: env::var("JWT_SECRET").unwrap_or_else(|_| JwtConfig::default().secret),
            expiration_hours: parsed("JWT_EXPIRATION_HOURS", 24),
            issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| DEFAULT_ISSUER.to_string()),
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parsed("PORT", 8080),
            database,
            jwt,
        }
    }
}
