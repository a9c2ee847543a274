use std::env;

use crate::constants::DEFAULT_TRANSACTION_LIMIT;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_path: String,
    pub allowed_origins: Vec<String>,
    pub environment: String,
    /// Shared secret used to verify signed user requests
    pub app_secret_key: String,
    /// Key for trusted server-side callers (awards, reward catalog).
    /// Trusted endpoints are disabled when unset.
    pub service_secret_key: Option<String>,
    pub log_requests: bool,
    pub default_transaction_limit: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| "Invalid SERVER_PORT")?;

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/ecobin.db".to_string());

        let allowed_origins = parse_origins(
            &env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".to_string()),
        );

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let app_secret_key = env::var("APP_SECRET_KEY")
            .map_err(|_| "APP_SECRET_KEY must be set for request signature verification")?;

        let service_secret_key = env::var("SERVICE_SECRET_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        let log_requests = env::var("LOG_REQUESTS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let default_transaction_limit = env::var("DEFAULT_TRANSACTION_LIMIT")
            .unwrap_or_else(|_| DEFAULT_TRANSACTION_LIMIT.to_string())
            .parse()
            .map_err(|_| "Invalid DEFAULT_TRANSACTION_LIMIT")?;

        Ok(Config {
            server_host,
            server_port,
            database_path,
            allowed_origins,
            environment,
            app_secret_key,
            service_secret_key,
            log_requests,
            default_transaction_limit,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
