// src/common/config.rs
//! Runtime configuration loaded from the environment

use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub login_url: String,
    pub ses_from_email: Option<String>,
    pub ses_region: String,
    pub reset_db: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://physio.db".to_string());
        let jwt_secret =
            env::var("JWT_SECRET").unwrap_or_else(|_| "replace_with_strong_secret".to_string());

        let token_ttl_hours = match env::var("TOKEN_TTL_HOURS") {
            Ok(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|hours| *hours > 0)
                .ok_or(ConfigError::InvalidValue("TOKEN_TTL_HOURS", raw))?,
            Err(_) => 24,
        };

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidValue("PORT", raw))?,
            Err(_) => 8080,
        };

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let login_url =
            env::var("APP_LOGIN_URL").unwrap_or_else(|_| "http://localhost:3000/login".to_string());

        let ses_from_email = env::var("AWS_SES_FROM_EMAIL")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let ses_region = env::var("AWS_SES_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        let reset_db = env::var("RESET_DB")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            database_url,
            jwt_secret,
            token_ttl_hours,
            port,
            cors_origins,
            login_url,
            ses_from_email,
            ses_region,
            reset_db,
        })
    }
}
