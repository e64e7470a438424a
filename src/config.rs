// config.rs
use std::env;
use std::fmt;
use std::time::Duration;

use crate::errors::{AppError, Result};

const SANDBOX_BASE_URL: &str = "https://sandbox.safaricom.co.ke";
const PRODUCTION_BASE_URL: &str = "https://api.safaricom.co.ke";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpesaEnvironment {
    Sandbox,
    Production,
}

impl MpesaEnvironment {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(MpesaEnvironment::Sandbox),
            "production" => Ok(MpesaEnvironment::Production),
            other => Err(AppError::configuration(format!(
                "MPESA_ENVIRONMENT must be 'sandbox' or 'production', got '{}'",
                other
            ))),
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            MpesaEnvironment::Sandbox => SANDBOX_BASE_URL,
            MpesaEnvironment::Production => PRODUCTION_BASE_URL,
        }
    }
}

impl fmt::Display for MpesaEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MpesaEnvironment::Sandbox => write!(f, "sandbox"),
            MpesaEnvironment::Production => write!(f, "production"),
        }
    }
}

/// Gateway endpoints used by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MpesaUrls {
    pub auth_url: String,
    pub stk_push_url: String,
}

impl MpesaUrls {
    pub fn from_base(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        MpesaUrls {
            auth_url: format!("{}/oauth/v1/generate?grant_type=client_credentials", base_url),
            stk_push_url: format!("{}/mpesa/stkpush/v1/processrequest", base_url),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub mpesa_consumer_key: String,
    pub mpesa_consumer_secret: String,
    pub mpesa_short_code: String,
    pub mpesa_passkey: String,
    pub mpesa_callback_url: String,
    pub mpesa_environment: MpesaEnvironment,
    pub mpesa_urls: MpesaUrls,
    pub http_timeout: Duration,
    pub port: u16,
    pub host: String,
}

// Credentials stay out of Debug output so the config can be logged.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("mpesa_short_code", &self.mpesa_short_code)
            .field("mpesa_callback_url", &self.mpesa_callback_url)
            .field("mpesa_environment", &self.mpesa_environment)
            .field("mpesa_urls", &self.mpesa_urls)
            .field("http_timeout", &self.http_timeout)
            .field("port", &self.port)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Every required variable is checked before failing, so the error names
    /// all of the missing ones at once.
    pub fn from_source<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let required = [
            "MPESA_CONSUMER_KEY",
            "MPESA_CONSUMER_SECRET",
            "MPESA_SHORT_CODE",
            "MPESA_PASSKEY",
            "MPESA_CALLBACK_URL",
        ];
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|key| get(*key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::configuration(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let mpesa_environment = match get("MPESA_ENVIRONMENT") {
            Some(value) => MpesaEnvironment::parse(&value)?,
            None => MpesaEnvironment::Sandbox,
        };

        let base_url = get("MPESA_API_BASE_URL")
            .unwrap_or_else(|| mpesa_environment.base_url().to_string());

        let timeout_secs = match get("MPESA_TIMEOUT_SECS") {
            Some(value) => value.trim().parse::<u64>().map_err(|_| {
                AppError::configuration(format!("MPESA_TIMEOUT_SECS must be a number, got '{}'", value))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            return Err(AppError::configuration("MPESA_TIMEOUT_SECS must be greater than 0"));
        }

        let port = match get("PORT") {
            Some(value) => value.trim().parse::<u16>().map_err(|_| {
                AppError::configuration(format!("PORT must be a number, got '{}'", value))
            })?,
            None => DEFAULT_PORT,
        };

        let required_value = |key: &str| get(key).unwrap_or_default();

        Ok(AppConfig {
            mpesa_consumer_key: required_value("MPESA_CONSUMER_KEY"),
            mpesa_consumer_secret: required_value("MPESA_CONSUMER_SECRET"),
            mpesa_short_code: required_value("MPESA_SHORT_CODE"),
            mpesa_passkey: required_value("MPESA_PASSKEY"),
            mpesa_callback_url: required_value("MPESA_CALLBACK_URL"),
            mpesa_environment,
            mpesa_urls: MpesaUrls::from_base(&base_url),
            http_timeout: Duration::from_secs(timeout_secs),
            port,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
        })
    }

    pub fn is_production(&self) -> bool {
        self.mpesa_environment == MpesaEnvironment::Production
    }

    pub fn get_config_info(&self) -> serde_json::Value {
        serde_json::json!({
            "environment": self.mpesa_environment.to_string(),
            "is_production": self.is_production(),
            "business_shortcode": self.mpesa_short_code,
            "callback_url": self.mpesa_callback_url,
            "consumer_key_set": !self.mpesa_consumer_key.is_empty(),
            "consumer_secret_set": !self.mpesa_consumer_secret.is_empty(),
            "passkey_set": !self.mpesa_passkey.is_empty(),
            "timeout_secs": self.http_timeout.as_secs(),
        })
    }
}
