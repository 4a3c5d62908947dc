use std::env;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "PORT";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const CHECKOUT_API_URL: &str = "CHECKOUT_API_URL";
    pub const CHECKOUT_API_KEY: &str = "CHECKOUT_API_KEY";
    pub const WEBHOOK_TIMEOUT_SECS: &str = "WEBHOOK_TIMEOUT_SECS";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const DATABASE_URL: &str = "./.db/gateway.db";
    pub const WEBHOOK_TIMEOUT_SECS: u64 = 30;
}

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Base URL of the external checkout-session provider. When unset,
    /// checkout references are generated locally.
    pub checkout_api_url: Option<String>,
    pub checkout_api_key: Option<String>,
    pub webhook_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var(env_vars::PORT)
                .unwrap_or_else(|_| defaults::PORT.to_string())
                .parse()
                .expect("PORT must be a valid number"),
            database_url: env::var(env_vars::DATABASE_URL)
                .unwrap_or_else(|_| defaults::DATABASE_URL.to_string()),
            checkout_api_url: env::var(env_vars::CHECKOUT_API_URL).ok(),
            checkout_api_key: env::var(env_vars::CHECKOUT_API_KEY).ok(),
            webhook_timeout_secs: env::var(env_vars::WEBHOOK_TIMEOUT_SECS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults::WEBHOOK_TIMEOUT_SECS),
        }
    }
}
