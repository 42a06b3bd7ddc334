use crate::core::{AppError, BusinessCalendar, Result};
use serde::Deserialize;
use std::env;
use std::str::FromStr;

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub billing: BillingConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
    /// "json" switches the log output to JSON lines
    pub log_format: String,
}

/// Business defaults applied by the billing services
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Offset of the company's local calendar from UTC, in minutes
    pub utc_offset_minutes: i32,
    /// Default quote validity when none is given (0 = open-ended)
    pub quote_validity_days: u32,
    /// Default invoice payment terms when no due date is given (0 = no due date)
    pub payment_terms_days: u32,
}

impl BillingConfig {
    pub fn calendar(&self) -> BusinessCalendar {
        BusinessCalendar::from_offset_minutes(self.utc_offset_minutes).unwrap_or_default()
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            quote_validity_days: 30,
            payment_terms_days: 30,
        }
    }
}

/// Read an optional variable, falling back to a default
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Configuration(format!("Invalid {}", key))),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let defaults = BillingConfig::default();

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
                log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
            },
            billing: BillingConfig {
                utc_offset_minutes: env_or("APP_UTC_OFFSET_MINUTES", defaults.utc_offset_minutes)?,
                quote_validity_days: env_or("QUOTE_VALIDITY_DAYS", defaults.quote_validity_days)?,
                payment_terms_days: env_or(
                    "INVOICE_PAYMENT_TERMS_DAYS",
                    defaults.payment_terms_days,
                )?,
            },
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if BusinessCalendar::from_offset_minutes(self.billing.utc_offset_minutes).is_none() {
            return Err(AppError::Configuration(format!(
                "APP_UTC_OFFSET_MINUTES out of range: {}",
                self.billing.utc_offset_minutes
            )));
        }

        if self.billing.quote_validity_days > 365 {
            return Err(AppError::Configuration(
                "Quote validity cannot exceed 365 days".to_string(),
            ));
        }

        if self.billing.payment_terms_days > 365 {
            return Err(AppError::Configuration(
                "Payment terms cannot exceed 365 days".to_string(),
            ));
        }

        if self.database.pool_size > self.database.max_connections {
            return Err(AppError::Configuration(
                "DATABASE_POOL_SIZE cannot exceed DATABASE_MAX_CONNECTIONS".to_string(),
            ));
        }

        Ok(())
    }
}
