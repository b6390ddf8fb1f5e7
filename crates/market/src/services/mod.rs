//! External adapters and the checkout orchestrator.

pub mod chain;
pub mod checkout;
pub mod rates;

pub use chain::{ChainError, ChainVerifier, EthRpcVerifier};
pub use checkout::{CheckoutError, CheckoutService, CryptoQuote, PayableSeller};
pub use rates::{CoinGeckoRates, RateError, RateSource};
