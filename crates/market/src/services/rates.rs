//! Fiat -> crypto exchange rate source.
//!
//! The rate is volatile and the source unauthenticated, so every quote
//! fetches a fresh rate with its own timeout. There is no shared cached
//! rate: a stale singleton would let a buyer settle against a price that
//! no longer exists.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when fetching a rate.
#[derive(Debug, Error)]
pub enum RateError {
    /// HTTP request failed (connection, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Oracle answered with a non-success status.
    #[error("oracle returned status {0}")]
    Status(u16),

    /// Response body did not carry a usable rate.
    #[error("malformed oracle response: {0}")]
    Parse(String),
}

/// Source of the current fiat -> crypto conversion rate.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Current EUR price of one coin of the settlement currency.
    async fn eur_per_coin(&self) -> Result<Decimal, RateError>;
}

/// Rate source backed by CoinGecko's simple-price endpoint.
#[derive(Debug, Clone)]
pub struct CoinGeckoRates {
    client: reqwest::Client,
    url: String,
}

impl CoinGeckoRates {
    /// Create a new rate client with a bounded per-call timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, RateError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_owned(),
        })
    }
}

/// Simple-price payload: `{"ethereum":{"eur": 2000.12}}`.
#[derive(Debug, Deserialize)]
struct SimplePriceResponse {
    ethereum: CoinQuote,
}

#[derive(Debug, Deserialize)]
struct CoinQuote {
    eur: Decimal,
}

#[async_trait]
impl RateSource for CoinGeckoRates {
    async fn eur_per_coin(&self) -> Result<Decimal, RateError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RateError::Status(status.as_u16()));
        }

        let body: SimplePriceResponse = response
            .json()
            .await
            .map_err(|e| RateError::Parse(e.to_string()))?;

        let rate = body.ethereum.eur;
        if rate <= Decimal::ZERO {
            return Err(RateError::Parse(format!("non-positive rate {rate}")));
        }
        Ok(rate)
    }
}
