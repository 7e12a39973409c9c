//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `ENVIRONMENT` - `production` enables JSON logs and refuses the default JWT secret
//! - `HOST` / `PORT` - bind address (default: 127.0.0.1:3001)
//! - `DATABASE_URL` - PostgreSQL URL; the in-memory store is used when unset
//! - `DB_POOL_MAX`, `DB_POOL_MIN`, `DB_CONNECT_TIMEOUT`, `DB_IDLE_TIMEOUT` - pool tuning
//! - `JWT_SECRET` - HS256 signing secret
//! - `SESSION_TTL_HOURS` - admin session lifetime (default: 12)
//! - `BCRYPT_COST` - password hashing cost (default: 10)
//! - `BOT_WEBHOOK_URL` / `BOT_WEBHOOK_SECRET` - lead notifications target
//! - `ALLOWED_ORIGINS` (comma-separated) or `FRONTEND_ORIGIN` - CORS
//! - `ADMIN_EMAIL` / `ADMIN_PASSWORD` / `ADMIN_NAME` - admin created on first start
//! - `LOG_LEVEL` - crate log level

use std::fmt;
use std::net::SocketAddr;

use thiserror::Error;

use crate::db::DbConfig;

pub const DEFAULT_JWT_SECRET: &str = "default-jwt-secret-change-in-production";

const DEFAULT_ORIGINS: &[&str] = &["http://localhost:3000", "http://127.0.0.1:3000"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(&'static str, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(&'static str, &'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

#[derive(Clone, Default)]
pub struct WebhookConfig {
    /// Base URL of the bot service. Notifications are disabled when unset.
    pub url: Option<String>,
    pub secret: String,
}

impl fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// Admin account ensured at startup when the admin table is empty.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct Config {
    pub environment: Environment,
    pub addr: SocketAddr,
    pub database: Option<DbConfig>,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub webhook: WebhookConfig,
    pub allowed_origins: Vec<String>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
    pub log_level: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("environment", &self.environment)
            .field("addr", &self.addr)
            .field("database", &self.database.is_some())
            .field("session_ttl_hours", &self.session_ttl_hours)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("webhook", &self.webhook)
            .field("allowed_origins", &self.allowed_origins)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .field("log_level", &self.log_level)
            .finish_non_exhaustive()
    }
}

impl Default for Config {
    /// Development settings with no database and notifications disabled.
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            database: None,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            session_ttl_hours: 12,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            webhook: WebhookConfig::default(),
            allowed_origins: DEFAULT_ORIGINS.iter().map(|s| s.to_string()).collect(),
            bootstrap_admin: None,
            log_level: "debug".to_string(),
        }
    }
}

impl Config {
    /// Load `.env` (if present), then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let environment = var("ENVIRONMENT")
            .map(|s| Environment::parse(&s))
            .unwrap_or(Environment::Development);

        let host = var("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port: u16 = parse_var(&var, "PORT", 3001)?;
        let addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|_| ConfigError::InvalidEnvVar("HOST", host.clone()))?;

        let database = var("DATABASE_URL").map(|url| DbConfig::from_lookup(url, &var));

        let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string());
        if environment.is_production() && jwt_secret == DEFAULT_JWT_SECRET {
            return Err(ConfigError::InsecureSecret(
                "JWT_SECRET",
                "must be set to a unique value in production",
            ));
        }

        let session_ttl_hours: i64 = parse_var(&var, "SESSION_TTL_HOURS", 12)?;
        if session_ttl_hours <= 0 {
            return Err(ConfigError::InvalidEnvVar(
                "SESSION_TTL_HOURS",
                session_ttl_hours.to_string(),
            ));
        }

        let bcrypt_cost: u32 = parse_var(&var, "BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::InvalidEnvVar(
                "BCRYPT_COST",
                bcrypt_cost.to_string(),
            ));
        }

        let webhook = WebhookConfig {
            url: var("BOT_WEBHOOK_URL").map(|u| u.trim_end_matches('/').to_string()),
            secret: var("BOT_WEBHOOK_SECRET").unwrap_or_default(),
        };

        let allowed_origins = var("ALLOWED_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .or_else(|| var("FRONTEND_ORIGIN").map(|o| vec![o.trim().to_string()]))
            .unwrap_or_else(|| DEFAULT_ORIGINS.iter().map(|s| s.to_string()).collect());

        let bootstrap_admin = match (var("ADMIN_EMAIL"), var("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin {
                email,
                password,
                name: var("ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
            }),
            _ => None,
        };

        let log_level = var("LOG_LEVEL").unwrap_or_else(|| {
            if environment.is_production() {
                "info".to_string()
            } else {
                "debug".to_string()
            }
        });

        Ok(Self {
            environment,
            addr,
            database,
            jwt_secret,
            session_ttl_hours,
            bcrypt_cost,
            webhook,
            allowed_origins,
            bootstrap_admin,
            log_level,
        })
    }
}

fn parse_var<T, F>(var: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidEnvVar(name, raw)),
        None => Ok(default),
    }
}
