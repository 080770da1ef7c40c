// src/config.rs

//! Runtime configuration read from the environment (and `.env` if present).

use std::fmt;
use std::net::SocketAddr;

use thiserror::Error;
use tracing::info;

use crate::auth::email_change::DEFAULT_CODE_TTL_SECS;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Brevo credentials. Without them codes go to the log.
#[derive(Clone)]
pub struct MailConfig {
    pub api_key: String,
    pub sender_email: String,
    pub sender_name: String,
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("api_key", &"[REDACTED]")
            .field("sender_email", &self.sender_email)
            .field("sender_name", &self.sender_name)
            .finish()
    }
}

/// Admin account created at startup when no account with this email exists.
#[derive(Clone)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for AdminBootstrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminBootstrap")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_path: String,
    pub schema_path: String,
    pub max_workers: usize,
    pub email_change_ttl_secs: i64,
    pub mail: Option<MailConfig>,
    pub admin: Option<AdminBootstrap>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            database_path: "investor_portal.sqlite3".to_string(),
            schema_path: "sql/schema.sql".to_string(),
            max_workers: 8,
            email_change_ttl_secs: DEFAULT_CODE_TTL_SECS,
            mail: None,
            admin: None,
        }
    }
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            info!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = parse_or(&get, "APP_BIND_ADDR", defaults.bind_addr)?;
        let max_workers: usize = parse_or(&get, "APP_MAX_WORKERS", defaults.max_workers)?;
        if max_workers == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "APP_MAX_WORKERS".into(),
                "must be at least 1".into(),
            ));
        }
        let email_change_ttl_secs: i64 =
            parse_or(&get, "EMAIL_CHANGE_TTL_SECS", defaults.email_change_ttl_secs)?;
        if email_change_ttl_secs < 60 {
            return Err(ConfigError::InvalidEnvVar(
                "EMAIL_CHANGE_TTL_SECS".into(),
                "must be at least 60".into(),
            ));
        }

        let mail = match get("BREVO_API_KEY") {
            Some(api_key) => Some(MailConfig {
                api_key,
                sender_email: get("MAIL_SENDER_EMAIL")
                    .ok_or_else(|| ConfigError::MissingEnvVar("MAIL_SENDER_EMAIL".into()))?,
                sender_name: get("MAIL_SENDER_NAME").unwrap_or_else(|| "Investor Portal".into()),
            }),
            None => None,
        };

        let admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminBootstrap { email, password }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::InvalidEnvVar(
                    "ADMIN_*".into(),
                    "ADMIN_EMAIL and ADMIN_PASSWORD must be set together".into(),
                ))
            }
        };

        Ok(Self {
            bind_addr,
            database_path: get("APP_DATABASE_PATH").unwrap_or(defaults.database_path),
            schema_path: get("APP_SCHEMA_PATH").unwrap_or(defaults.schema_path),
            max_workers,
            email_change_ttl_secs,
            mail,
            admin,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
