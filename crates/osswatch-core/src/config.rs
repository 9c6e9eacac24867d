//! Configuration module
//!
//! Environment-driven configuration for the API server and the scan runner.
//! Values are read once at startup via [`Config::from_env`] and validated
//! before any service is constructed.

use std::env;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const JWT_EXPIRY_HOURS: i64 = 24;
const DEFAULT_SERVER_PORT: u16 = 8080;
const DEFAULT_SCAN_TIMEOUT_SECS: u64 = 600;
const DEFAULT_SCAN_TOOL_PATH: &str = "hc";

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub environment: String,
    /// Path to the external scan tool binary (Hipcheck `hc`).
    pub scan_tool_path: String,
    /// Per-project timeout for a single scan tool invocation.
    pub scan_timeout_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        // Best effort: a missing .env file is not an error
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            server_port: parse_env("SERVER_PORT", DEFAULT_SERVER_PORT),
            cors_origins,
            database_url,
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", MAX_CONNECTIONS),
            db_timeout_seconds: parse_env("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS),
            jwt_secret,
            jwt_expiry_hours: parse_env("JWT_EXPIRY_HOURS", JWT_EXPIRY_HOURS),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            scan_tool_path: env::var("SCAN_TOOL_PATH")
                .unwrap_or_else(|_| DEFAULT_SCAN_TOOL_PATH.to_string()),
            scan_timeout_seconds: parse_env("SCAN_TIMEOUT_SECONDS", DEFAULT_SCAN_TIMEOUT_SECS),
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters");
        }
        if self.db_max_connections == 0 {
            anyhow::bail!("DB_MAX_CONNECTIONS must be greater than zero");
        }
        if self.scan_timeout_seconds == 0 {
            anyhow::bail!("SCAN_TIMEOUT_SECONDS must be greater than zero");
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
