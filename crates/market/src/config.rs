//! Market configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CHAIN_RPC_URL` - Blockchain JSON-RPC endpoint (may embed a provider
//!   API key, treated as a secret)
//!
//! ## Optional
//! - `MARKET_HOST` - Bind address (default: 127.0.0.1)
//! - `MARKET_PORT` - Listen port (default: 3000)
//! - `RATE_ORACLE_URL` - Fiat/crypto rate endpoint (default: CoinGecko
//!   simple-price for ETH in EUR)
//! - `EXTERNAL_TIMEOUT_SECS` - Budget for each external call (default: 10)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_RATE_ORACLE_URL: &str =
    "https://api.coingecko.com/api/v3/simple/price?ids=ethereum&vs_currencies=eur";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Market application configuration.
#[derive(Debug, Clone)]
pub struct MarketConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Blockchain JSON-RPC endpoint (contains provider API key)
    pub chain_rpc_url: SecretString,
    /// Fiat -> crypto rate oracle endpoint
    pub rate_oracle_url: String,
    /// Per-call budget for the rate oracle and chain RPC
    pub external_timeout: Duration,
}

impl MarketConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("MARKET_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("MARKET_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("MARKET_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("MARKET_PORT".to_string(), e.to_string()))?;

        let chain_rpc_url = get_required_env("CHAIN_RPC_URL")?;
        validate_url(&chain_rpc_url, "CHAIN_RPC_URL")?;

        let rate_oracle_url = get_env_or_default("RATE_ORACLE_URL", DEFAULT_RATE_ORACLE_URL);
        validate_url(&rate_oracle_url, "RATE_ORACLE_URL")?;

        let timeout_secs = get_env_or_default("EXTERNAL_TIMEOUT_SECS", "10")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("EXTERNAL_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            host,
            port,
            chain_rpc_url: SecretString::from(chain_rpc_url),
            rate_oracle_url,
            external_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that a value parses as an absolute URL.
fn validate_url(value: &str, var_name: &str) -> Result<(), ConfigError> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))
}
