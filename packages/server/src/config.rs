use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub email: EmailConfig,
    /// Exact origins for CORS; `None` mirrors the request origin
    pub allowed_origins: Option<Vec<String>>,
    pub directory_fallback_to_all: bool,
}

/// SMTP settings. `enabled` is false when credentials are missing.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_name: String,
}

impl EmailConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            host: "smtp.gmail.com".to_string(),
            port: 465,
            username: String::new(),
            password: String::new(),
            from_name: "EchoCare".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup (used by tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let username = lookup("MAIL_USER").unwrap_or_default();
        let password = lookup("MAIL_PASS").unwrap_or_default();

        let email = EmailConfig {
            enabled: !username.is_empty() && !password.is_empty(),
            host: lookup("MAIL_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
            port: lookup("MAIL_PORT")
                .unwrap_or_else(|| "465".to_string())
                .parse()
                .context("MAIL_PORT must be a valid number")?,
            username,
            password,
            from_name: "EchoCare".to_string(),
        };

        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty());

        Ok(Self {
            database_url: lookup("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            jwt_secret: lookup("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "echocare".to_string()),
            email,
            allowed_origins,
            directory_fallback_to_all: lookup("DIRECTORY_FALLBACK_TO_ALL")
                .map(|v| v.parse::<bool>())
                .transpose()
                .context("DIRECTORY_FALLBACK_TO_ALL must be true or false")?
                .unwrap_or(true),
        })
    }
}
